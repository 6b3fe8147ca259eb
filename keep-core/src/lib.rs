//! keep-core: typed record access shared by every keep backend.
//!
//! - [`Repository<T>`] over any [`Entity`], with cursor pages and AND-ed
//!   [`QueryConstraint`]s
//! - [`Patch`] / [`UpdateMap`] for partial updates
//! - [`KeepError`] carried through every layer
//! - [`RequestContext`] deadlines around each store call
//! - [`MemoryRepository`] for tests and local runs

pub mod config;
pub mod context;
pub mod entity;
pub mod errors;
pub mod memory;
pub mod page;
pub mod patch;
pub mod query;
pub mod repository;

pub use config::{KeepConfig, KeepConfigSnapshot};
pub use context::{DeadlineExceeded, RequestContext};
pub use entity::Entity;
pub use errors::{ErrorKind, KeepError, KeepResult};
pub use memory::{MemoryRepository, MemoryStore};
pub use page::{Page, PageRequest};
pub use patch::{FieldValue, IntoUpdateMap, Patch, UpdateMap};
pub use query::{QueryConstraint, QueryOperator};
pub use repository::Repository;
