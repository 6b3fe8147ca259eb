use std::sync::Arc;

use keep_blob::{BlobAdapter, BlobConfig, MemoryBlobStore, S3CompatibleStore};
use keep_core::{KeepError, KeepResult, MemoryRepository, MemoryStore, Repository};
use keep_mongo::{MongoClientFactory, MongoConnection};
use tracing::info;

use crate::config::RecordsConfig;
use crate::services::{Document, DocumentsService, User, UsersService};

/// Collection names used by [`RecordsApp::in_memory`].
const USERS: &str = "users";
const DOCUMENTS: &str = "documents";

/// The wired services plus the clients they share.
///
/// Build one per process and pass it down; drop it through
/// [`RecordsApp::shutdown`].
pub struct RecordsApp {
    pub users: UsersService,
    pub documents: DocumentsService,
    mongo: Option<MongoConnection>,
}

impl RecordsApp {
    /// Connect to MongoDB and the object store named in `config`.
    pub async fn connect(config: &RecordsConfig) -> KeepResult<Self> {
        let mongo = MongoClientFactory::connect(&config.mongo.uri, &config.mongo.database).await?;

        let store = S3CompatibleStore::new(config.blob.s3_config())
            .await
            .map_err(|err| KeepError::from(err).wrap("failed to create blob store client"))?;
        let blobs = BlobAdapter::new(store, config.blob.blob_config());

        let users: Arc<dyn Repository<User>> =
            Arc::new(mongo.repository::<User>(&config.mongo.users_collection));
        let documents: Arc<dyn Repository<Document>> =
            Arc::new(mongo.repository::<Document>(&config.mongo.documents_collection));

        info!(
            database = %config.mongo.database,
            bucket = %config.blob.bucket,
            "records app connected"
        );

        let mut app = Self::with_backends(users, documents, blobs, config.owner_page_size);
        app.mongo = Some(mongo);
        Ok(app)
    }

    /// Everything in process memory, for tests and local runs.
    pub fn in_memory<S: Into<String>>(bucket: S) -> Self {
        let store = MemoryStore::new();
        let users: Arc<dyn Repository<User>> = Arc::new(MemoryRepository::new(store.clone(), USERS));
        let documents: Arc<dyn Repository<Document>> =
            Arc::new(MemoryRepository::new(store, DOCUMENTS));
        let blobs = BlobAdapter::new(MemoryBlobStore::new(bucket), BlobConfig::default());

        Self::with_backends(
            users,
            documents,
            blobs,
            crate::services::documents::documents_service::DEFAULT_OWNER_PAGE_SIZE,
        )
    }

    pub fn with_backends(
        users: Arc<dyn Repository<User>>,
        documents: Arc<dyn Repository<Document>>,
        blobs: BlobAdapter,
        owner_page_size: usize,
    ) -> Self {
        Self {
            users: UsersService::new(users),
            documents: DocumentsService::new(documents, blobs).with_owner_page_size(owner_page_size),
            mongo: None,
        }
    }

    pub fn mongo(&self) -> Option<&MongoConnection> {
        self.mongo.as_ref()
    }

    /// Close the database client, if any. Blob clients hold no pooled state.
    pub async fn shutdown(self) {
        if let Some(mongo) = self.mongo {
            mongo.shutdown().await;
        }
        info!("records app shut down");
    }
}
