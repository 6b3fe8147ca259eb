use std::sync::Arc;

use bytes::Bytes;
use keep_blob::{detect_type, normalize_extension, BlobAdapter, ByteStream, FileInfo, FileType};
use keep_core::{
    IntoUpdateMap, KeepError, KeepResult, Page, PageRequest, Patch, QueryConstraint, Repository,
    RequestContext,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::documents_shared::{Document, DocumentPatch, DocumentType, OWNER_FIELD};

/// Page size of [`DocumentsService::list_by_owner`] unless configured.
pub const DEFAULT_OWNER_PAGE_SIZE: usize = 100;

/// Identity documents: a blob per document plus a metadata record.
///
/// The two stores are written one after the other with no compensation.
/// A failed metadata write after a successful upload leaves the blob behind.
#[derive(Clone)]
pub struct DocumentsService {
    repo: Arc<dyn Repository<Document>>,
    blobs: BlobAdapter,
    owner_page_size: usize,
}

fn blob_error(context: &'static str) -> impl FnOnce(keep_blob::BlobError) -> KeepError {
    move |err| KeepError::from(err).wrap(context)
}

impl DocumentsService {
    pub fn new(repo: Arc<dyn Repository<Document>>, blobs: BlobAdapter) -> Self {
        Self {
            repo,
            blobs,
            owner_page_size: DEFAULT_OWNER_PAGE_SIZE,
        }
    }

    pub fn with_owner_page_size(mut self, size: usize) -> Self {
        self.owner_page_size = size;
        self
    }

    pub fn blobs(&self) -> &BlobAdapter {
        &self.blobs
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id))]
    pub async fn get_by_id(&self, ctx: &RequestContext, id: &str) -> KeepResult<Document> {
        self.repo
            .get_by_id(ctx, id)
            .await
            .map_err(|err| err.wrap("failed to get document by ID"))
    }

    /// The first page of an owner's documents.
    pub async fn list_by_owner(&self, ctx: &RequestContext, owner: &str) -> KeepResult<Page<Document>> {
        self.list_by_owner_page(ctx, owner, PageRequest::first(self.owner_page_size))
            .await
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id))]
    pub async fn list_by_owner_page(
        &self,
        ctx: &RequestContext,
        owner: &str,
        page: PageRequest,
    ) -> KeepResult<Page<Document>> {
        let constraints = [QueryConstraint::equal(OWNER_FIELD, owner)];
        self.repo
            .get_by_query(ctx, &constraints, page)
            .await
            .map_err(|err| err.wrap("failed to get documents by user ID"))
    }

    /// Store `content` for `owner` and record its metadata.
    #[instrument(skip(self, ctx, content), fields(request_id = %ctx.request_id, bytes = content.len()))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        owner: &str,
        doc_type: DocumentType,
        content: Bytes,
    ) -> KeepResult<Document> {
        if owner.trim().is_empty() {
            return Err(KeepError::invalid_argument("document owner is required"));
        }

        let id = Uuid::new_v4().to_string();
        let (name, file_type, info) = self.store_content(ctx, owner, content).await?;

        let document = Document {
            id: id.clone(),
            user_id: owner.to_string(),
            name,
            size: info.size,
            doc_type,
            content_type: file_type.media_type.to_string(),
            path: info.path.clone(),
            bucket: info.bucket,
            created_at: None,
            updated_at: None,
        };

        let created = self.repo.create(ctx, &id, &document).await.map_err(|err| {
            warn!(path = %info.path, "metadata write failed after upload; blob left in place");
            err.wrap("failed to create document")
        })?;
        info!(document_id = %created.id, path = %created.path, "document created");
        Ok(created)
    }

    /// Replace a document's content.
    ///
    /// The new blob goes to a fresh path under the same owner. The previous
    /// blob is not removed.
    #[instrument(skip(self, ctx, content), fields(request_id = %ctx.request_id, bytes = content.len()))]
    pub async fn update(&self, ctx: &RequestContext, id: &str, content: Bytes) -> KeepResult<Document> {
        let current = self.get_by_id(ctx, id).await?;
        let (name, file_type, info) = self.store_content(ctx, &current.user_id, content).await?;

        let patch = DocumentPatch {
            name: Patch::Set(name),
            size: Patch::Set(info.size),
            content_type: Patch::Set(file_type.media_type.to_string()),
            path: Patch::Set(info.path),
        };
        let mut update = patch.to_update_map()?;
        update.server_timestamp("updated_at");

        self.repo
            .update(ctx, id, update)
            .await
            .map_err(|err| err.wrap("failed to update document"))
    }

    /// Remove the blob, then the metadata.
    ///
    /// If the blob delete fails the metadata record is kept.
    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id))]
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> KeepResult<()> {
        let document = self.get_by_id(ctx, id).await?;

        self.blobs
            .delete(ctx, &document.path)
            .await
            .map_err(blob_error("failed to delete document from blob store"))?;

        self.repo
            .delete(ctx, id)
            .await
            .map_err(|err| err.wrap("failed to delete document from database"))?;
        info!(document_id = id, "document deleted");
        Ok(())
    }

    /// Stream the stored content of a document.
    pub async fn download(&self, ctx: &RequestContext, id: &str) -> KeepResult<ByteStream> {
        let document = self.get_by_id(ctx, id).await?;
        self.blobs
            .download(ctx, &document.path)
            .await
            .map_err(blob_error("failed to download document"))
    }

    async fn store_content(
        &self,
        ctx: &RequestContext,
        owner: &str,
        content: Bytes,
    ) -> KeepResult<(String, FileType, FileInfo)> {
        let file_type = detect_type(&content).map_err(blob_error("failed to detect file type"))?;
        let extension = normalize_extension(file_type.extension).trim_start_matches('.');

        let name = Uuid::new_v4().to_string();
        let path = format!("documents/{owner}/{name}.{extension}");

        let info = self
            .blobs
            .upload_bytes(ctx, &path, content, file_type.media_type)
            .await
            .map_err(blob_error("failed to upload document"))?;
        Ok((name, file_type, info))
    }
}
