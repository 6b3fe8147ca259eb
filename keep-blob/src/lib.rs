//! # keep-blob: document blobs for keep
//!
//! Path-addressed blob storage with content sniffing. Services embed a
//! [`BlobAdapter`] and never talk to a storage SDK directly:
//!
//! ```text
//! ┌─────────────────┐
//! │   Your Service  │  ← sniff, pick a path, record metadata
//! ├─────────────────┤
//! │   BlobAdapter   │  ← deadlines, size ceiling, FileInfo
//! ├─────────────────┤
//! │   BlobStore     │  ← storage primitives (S3, memory)
//! └─────────────────┘
//! ```
//!
//! ```rust
//! use keep_blob::prelude::*;
//! use keep_core::RequestContext;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let adapter = BlobAdapter::new(MemoryBlobStore::new("documents"), BlobConfig::default());
//! let ctx = RequestContext::new();
//!
//! let content = b"%PDF-1.7 minimal".to_vec();
//! let file_type = detect_type(&content)?;
//! let info = adapter
//!     .upload_bytes(&ctx, "documents/u1/contract.pdf", content, file_type.media_type)
//!     .await?;
//!
//! assert_eq!(info.content_type, "application/pdf");
//! assert_eq!(info.bucket, "documents");
//! # Ok(())
//! # }
//! ```

pub mod adapter;
mod config;
mod error;
mod file_info;
mod memory_store;
mod s3_store;
pub mod sniff;
pub mod store;
mod types;

pub use adapter::BlobAdapter;
pub use config::{BlobConfig, DEFAULT_MAX_BLOB_BYTES};
pub use error::{BlobError, BlobResult};
pub use file_info::FileInfo;
pub use memory_store::MemoryBlobStore;
pub use s3_store::{S3CompatibleStore, S3Config};
pub use sniff::{detect_type, normalize_extension, FileType};
pub use store::{BlobInfo, BlobStore, ObjectHead, PutResult};
pub use types::{bytes_stream, collect_bytes, ByteStream};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        detect_type, normalize_extension, BlobAdapter, BlobConfig, BlobError, BlobResult,
        BlobStore, ByteStream, FileInfo, FileType, MemoryBlobStore,
    };
}
