use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{BlobResult, ByteStream};

/// Object storage primitives every backend implements.
///
/// Keys are full object paths inside the store's bucket. Missing objects
/// are reported as [`BlobError::NotFound`](crate::BlobError::NotFound) by
/// `get`, `head` and `delete`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Bucket this store writes into.
    fn bucket(&self) -> &str;

    /// Store a blob from a stream, replacing any object at `key`.
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult>;

    /// Read the whole object as a stream.
    async fn get(&self, key: &str) -> BlobResult<ByteStream>;

    /// Stored attributes, without the content.
    async fn head(&self, key: &str) -> BlobResult<ObjectHead>;

    async fn delete(&self, key: &str) -> BlobResult<()>;

    /// Every object whose key starts with `prefix`, in key order.
    async fn list(&self, prefix: &str) -> BlobResult<Vec<BlobInfo>>;
}

/// What the store reports after a write.
#[derive(Debug, Clone)]
pub struct PutResult {
    pub etag: Option<String>,
    pub size_bytes: u64,
}

/// Attributes of a stored object
#[derive(Debug, Clone)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One entry of a listing
#[derive(Debug, Clone)]
pub struct BlobInfo {
    pub key: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}
