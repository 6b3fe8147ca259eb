use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use keep_blob::{
    bytes_stream, BlobAdapter, BlobConfig, BlobError, BlobInfo, BlobResult, BlobStore,
    ByteStream, MemoryBlobStore, ObjectHead, PutResult,
};
use keep_core::RequestContext;

const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

fn adapter() -> (BlobAdapter, MemoryBlobStore) {
    let store = MemoryBlobStore::new("keep-test");
    (BlobAdapter::new(store.clone(), BlobConfig::default()), store)
}

async fn read_all(mut stream: ByteStream) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    out
}

#[tokio::test]
async fn upload_reads_attributes_back() {
    let (adapter, store) = adapter();
    let ctx = RequestContext::new();

    let info = adapter
        .upload_bytes(&ctx, "documents/u1/a.png", PNG.to_vec(), "image/png")
        .await
        .unwrap();

    assert_eq!(info.path, "documents/u1/a.png");
    assert_eq!(info.size, PNG.len() as i64);
    assert_eq!(info.content_type, "image/png");
    assert_eq!(info.bucket, "keep-test");
    assert!(info.last_modified.is_some());
    assert!(store.contains("documents/u1/a.png").await);
}

#[tokio::test]
async fn download_returns_the_stored_bytes() {
    let (adapter, _) = adapter();
    let ctx = RequestContext::new();
    adapter
        .upload(&ctx, "documents/u1/a.png", bytes_stream(Bytes::from_static(PNG)), "image/png")
        .await
        .unwrap();

    let stream = adapter.download(&ctx, "documents/u1/a.png").await.unwrap();
    assert_eq!(read_all(stream).await, PNG);

    let all = adapter.download_bytes(&ctx, "documents/u1/a.png").await.unwrap();
    assert_eq!(&all[..], PNG);
}

#[tokio::test]
async fn missing_objects_are_not_found() {
    let (adapter, _) = adapter();
    let ctx = RequestContext::new();

    assert!(adapter.download(&ctx, "nope").await.err().unwrap().is_not_found());
    assert!(adapter.delete(&ctx, "nope").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn delete_removes_the_object() {
    let (adapter, store) = adapter();
    let ctx = RequestContext::new();
    adapter
        .upload_bytes(&ctx, "documents/u1/a.png", PNG.to_vec(), "image/png")
        .await
        .unwrap();

    adapter.delete(&ctx, "documents/u1/a.png").await.unwrap();
    assert!(!store.contains("documents/u1/a.png").await);
}

#[tokio::test]
async fn list_filters_by_prefix_and_fills_bucket() {
    let (adapter, _) = adapter();
    let ctx = RequestContext::new();
    for path in ["documents/u1/a.png", "documents/u1/b.png", "documents/u2/c.png"] {
        adapter.upload_bytes(&ctx, path, PNG.to_vec(), "image/png").await.unwrap();
    }

    let listed = adapter.list(&ctx, "documents/u1/").await.unwrap();
    let paths: Vec<_> = listed.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["documents/u1/a.png", "documents/u1/b.png"]);
    assert!(listed.iter().all(|f| f.bucket == "keep-test"));
    assert!(listed.iter().all(|f| f.content_type == "image/png"));
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_writing() {
    let store = MemoryBlobStore::new("keep-test");
    let adapter = BlobAdapter::new(store.clone(), BlobConfig::new().with_max_blob_bytes(4));

    let err = adapter
        .upload_bytes(&RequestContext::new(), "documents/u1/a.png", PNG.to_vec(), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, BlobError::TooLarge { max: 4, .. }));
    assert!(store.keys().await.is_empty());
}

/// A store whose writes never finish.
struct StalledStore;

#[async_trait]
impl BlobStore for StalledStore {
    fn bucket(&self) -> &str {
        "stalled"
    }

    async fn put(&self, _key: &str, _ct: Option<&str>, _stream: ByteStream) -> BlobResult<PutResult> {
        std::future::pending().await
    }

    async fn get(&self, key: &str) -> BlobResult<ByteStream> {
        Err(BlobError::not_found(key))
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        Err(BlobError::not_found(key))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        Err(BlobError::not_found(key))
    }

    async fn list(&self, _prefix: &str) -> BlobResult<Vec<BlobInfo>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn deadline_abandons_a_stalled_upload() {
    let adapter = BlobAdapter::new(StalledStore, BlobConfig::default());
    let ctx = RequestContext::new().with_timeout(Duration::from_millis(20));

    let err = adapter
        .upload_bytes(&ctx, "documents/u1/a.png", PNG.to_vec(), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, BlobError::DeadlineExceeded { .. }));
}
