use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::types::{bytes_stream, collect_bytes};
use crate::{BlobError, BlobInfo, BlobResult, BlobStore, ByteStream, ObjectHead, PutResult};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    last_modified: DateTime<Utc>,
}

impl StoredObject {
    fn head(&self) -> ObjectHead {
        ObjectHead {
            size_bytes: self.data.len() as u64,
            content_type: self.content_type.clone(),
            etag: None,
            last_modified: Some(self.last_modified),
        }
    }
}

/// In-memory [`BlobStore`] for tests and local runs.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    bucket: String,
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

impl MemoryBlobStore {
    pub fn new<S: Into<String>>(bucket: S) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult> {
        let data = collect_bytes(stream, u64::MAX).await?;
        let size_bytes = data.len() as u64;
        let object = StoredObject {
            data,
            content_type: content_type.map(str::to_string),
            last_modified: Utc::now(),
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(PutResult {
            etag: None,
            size_bytes,
        })
    }

    async fn get(&self, key: &str) -> BlobResult<ByteStream> {
        let objects = self.objects.read().await;
        let object = objects.get(key).ok_or_else(|| BlobError::not_found(key))?;
        Ok(bytes_stream(object.data.clone()))
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(StoredObject::head)
            .ok_or_else(|| BlobError::not_found(key))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.objects
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobError::not_found(key))
    }

    async fn list(&self, prefix: &str) -> BlobResult<Vec<BlobInfo>> {
        let objects = self.objects.read().await;
        Ok(objects
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| BlobInfo {
                key: key.clone(),
                size_bytes: object.data.len() as u64,
                content_type: object.content_type.clone(),
                last_modified: Some(object.last_modified),
            })
            .collect())
    }
}
