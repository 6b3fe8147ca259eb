//! # keep-records
//!
//! User accounts and identity documents on top of keep.
//!
//! ```rust
//! use bytes::Bytes;
//! use keep_core::RequestContext;
//! use keep_records::{DocumentType, NewUser, RecordsApp};
//!
//! # #[tokio::main]
//! # async fn main() -> keep_core::KeepResult<()> {
//! let app = RecordsApp::in_memory("documents");
//! let ctx = RequestContext::new();
//!
//! let user = app
//!     .users
//!     .create(&ctx, NewUser { email: "ada@example.com".into(), ..Default::default() })
//!     .await?;
//!
//! let png = Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]);
//! let doc = app
//!     .documents
//!     .create(&ctx, &user.id, DocumentType::Passport, png)
//!     .await?;
//!
//! assert_eq!(doc.content_type, "image/png");
//! assert!(doc.path.starts_with(&format!("documents/{}/", user.id)));
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod services;
pub mod telemetry;

pub use app::RecordsApp;
pub use config::{BlobSettings, LogConfig, MongoSettings, RecordsConfig};
pub use services::{
    Address, AddressPatch, Document, DocumentPatch, DocumentType, DocumentsService, NewUser, User,
    UserPatch, UsersService,
};
pub use telemetry::init_tracing;
