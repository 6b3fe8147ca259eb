//! keep-mongo: the MongoDB backend of [`keep_core::Repository`].
//!
//! Records are stored as their serde form with the identifier in `_id`.

pub mod client;
pub mod filter;
pub mod repository;

pub use client::{MongoClientFactory, MongoConnection};
pub use filter::{constraint_filter, query_filter};
pub use repository::MongoRepository;
