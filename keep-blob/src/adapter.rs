use std::sync::Arc;

use bytes::Bytes;
use keep_core::RequestContext;
use tracing::{debug, instrument};

use crate::types::{bytes_stream, collect_bytes};
use crate::{BlobConfig, BlobResult, BlobStore, ByteStream, FileInfo};

/// The blob adapter services embed: path-addressed upload, download,
/// delete and listing over any [`BlobStore`].
///
/// Every call is bounded by the deadline of the [`RequestContext`].
#[derive(Clone)]
pub struct BlobAdapter {
    store: Arc<dyn BlobStore>,
    config: BlobConfig,
}

impl BlobAdapter {
    /// Create a new blob adapter
    pub fn new<S: BlobStore + 'static>(store: S, config: BlobConfig) -> Self {
        Self::from_arc(Arc::new(store), config)
    }

    /// Share a store that is also used elsewhere.
    pub fn from_arc(store: Arc<dyn BlobStore>, config: BlobConfig) -> Self {
        Self { store, config }
    }

    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    /// Write `body` to `path`, then read the stored attributes back.
    ///
    /// An existing object at `path` is replaced.
    #[instrument(skip(self, ctx, body), fields(request_id = %ctx.request_id, bucket = %self.bucket()))]
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: ByteStream,
        content_type: &str,
    ) -> BlobResult<FileInfo> {
        ctx.run("blob.upload", self.put_and_head(path, body, content_type))
            .await
    }

    /// [`BlobAdapter::upload`] for content already in memory.
    pub async fn upload_bytes(
        &self,
        ctx: &RequestContext,
        path: &str,
        content: impl Into<Bytes>,
        content_type: &str,
    ) -> BlobResult<FileInfo> {
        self.upload(ctx, path, bytes_stream(content), content_type)
            .await
    }

    /// Open the object at `path` for reading.
    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id, bucket = %self.bucket()))]
    pub async fn download(&self, ctx: &RequestContext, path: &str) -> BlobResult<ByteStream> {
        ctx.run("blob.download", self.store.get(path)).await
    }

    /// Read the whole object at `path` into memory.
    pub async fn download_bytes(&self, ctx: &RequestContext, path: &str) -> BlobResult<Bytes> {
        let stream = self.download(ctx, path).await?;
        ctx.run(
            "blob.download",
            collect_bytes(stream, self.config.max_blob_bytes),
        )
        .await
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id, bucket = %self.bucket()))]
    pub async fn delete(&self, ctx: &RequestContext, path: &str) -> BlobResult<()> {
        ctx.run("blob.delete", self.store.delete(path)).await?;
        debug!(path, "blob deleted");
        Ok(())
    }

    /// Every object under `prefix`. The whole listing is loaded at once.
    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id, bucket = %self.bucket()))]
    pub async fn list(&self, ctx: &RequestContext, prefix: &str) -> BlobResult<Vec<FileInfo>> {
        let entries = ctx.run("blob.list", self.store.list(prefix)).await?;
        let bucket = self.bucket();
        Ok(entries
            .into_iter()
            .map(|entry| FileInfo::from_listing(bucket, entry))
            .collect())
    }

    async fn put_and_head(
        &self,
        path: &str,
        body: ByteStream,
        content_type: &str,
    ) -> BlobResult<FileInfo> {
        let data = collect_bytes(body, self.config.max_blob_bytes).await?;
        let size = data.len();
        self.store
            .put(path, Some(content_type), bytes_stream(data))
            .await?;
        let head = self.store.head(path).await?;
        debug!(path, size, "blob stored");
        Ok(FileInfo::from_head(self.bucket(), path, head))
    }
}
