use std::env;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{primitives::ByteStream as AwsByteStream, Client};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{bytes_stream, collect_bytes};
use crate::{BlobError, BlobInfo, BlobResult, BlobStore, ByteStream, ObjectHead, PutResult};

/// Connection settings for an S3-compatible object store.
///
/// Unset fields fall back to the SDK's default provider chain, so the same
/// config works against AWS proper and against path-style local stores.
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3Config {
    pub fn new<S: Into<String>>(bucket: S) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// `S3_REGION`, `S3_ENDPOINT_URL`, `S3_ACCESS_KEY_ID`, `S3_SECRET_ACCESS_KEY`.
    pub fn from_env<S: Into<String>>(bucket: S) -> Self {
        fn get_env(key: &str) -> Option<String> {
            env::var(key).ok().filter(|value| !value.trim().is_empty())
        }

        Self {
            bucket: bucket.into(),
            region: get_env("S3_REGION"),
            endpoint_url: get_env("S3_ENDPOINT_URL"),
            access_key_id: get_env("S3_ACCESS_KEY_ID"),
            secret_access_key: get_env("S3_SECRET_ACCESS_KEY"),
        }
    }

    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint<S: Into<String>>(mut self, endpoint_url: S) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_credentials<K: Into<String>, S: Into<String>>(mut self, key_id: K, secret: S) -> Self {
        self.access_key_id = Some(key_id.into());
        self.secret_access_key = Some(secret.into());
        self
    }
}

/// [`BlobStore`] over any S3-compatible service using the AWS SDK.
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    bucket: String,
}

impl S3CompatibleStore {
    pub async fn new(config: S3Config) -> BlobResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(BlobError::invalid("S3 bucket name is required"));
        }
        let bucket = config.bucket.clone();
        let client = Self::create_client(config).await;
        Ok(Self { client, bucket })
    }

    pub async fn from_env<S: Into<String>>(bucket: S) -> BlobResult<Self> {
        Self::new(S3Config::from_env(bucket)).await
    }

    async fn create_client(config: S3Config) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region {
            loader = loader.region(Region::new(region));
        }
        if let (Some(key_id), Some(secret)) = (config.access_key_id, config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(key_id, secret, None, None, "keep"));
        }
        let path_style = config.endpoint_url.is_some();
        if let Some(endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                // Custom endpoints rarely support virtual-hosted buckets.
                .force_path_style(path_style)
                .build(),
        )
    }

    fn map_aws_error(err: impl std::error::Error + Send + Sync + 'static) -> BlobError {
        BlobError::backend(err)
    }

    fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
    }

    fn size_of(len: Option<i64>) -> u64 {
        len.and_then(|len| u64::try_from(len).ok()).unwrap_or(0)
    }
}

fn listed_content_type(key: &str, head: BlobResult<ObjectHead>) -> Option<String> {
    match head {
        Ok(head) => head.content_type,
        Err(err) => {
            debug!(key, error = %err, "content type unavailable for listed object");
            None
        }
    }
}

#[async_trait]
impl BlobStore for S3CompatibleStore {
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

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(AwsByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let result = request.send().await.map_err(Self::map_aws_error)?;

        Ok(PutResult {
            etag: result.e_tag().map(str::to_string),
            size_bytes,
        })
    }

    async fn get(&self, key: &str) -> BlobResult<ByteStream> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    BlobError::not_found(key)
                } else {
                    Self::map_aws_error(err)
                }
            })?;

        let body = result.body.collect().await.map_err(Self::map_aws_error)?;
        Ok(bytes_stream(body.into_bytes()))
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    BlobError::not_found(key)
                } else {
                    Self::map_aws_error(err)
                }
            })?;

        Ok(ObjectHead {
            size_bytes: Self::size_of(result.content_length()),
            content_type: result.content_type().map(str::to_string),
            etag: result.e_tag().map(str::to_string),
            last_modified: result.last_modified().and_then(Self::to_chrono),
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        // S3 deletes are idempotent; probe first so a missing key is reported.
        self.head(key).await?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(Self::map_aws_error)?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> BlobResult<Vec<BlobInfo>> {
        let mut blobs = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = continuation.take() {
                request = request.continuation_token(token);
            }
            let page = request.send().await.map_err(Self::map_aws_error)?;

            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                // Listings carry no content type, so this costs one HEAD per
                // object. A failed HEAD leaves the type unset.
                let content_type = listed_content_type(key, self.head(key).await);
                blobs.push(BlobInfo {
                    key: key.to_string(),
                    size_bytes: Self::size_of(object.size()),
                    content_type,
                    last_modified: object.last_modified().and_then(Self::to_chrono),
                });
            }

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        debug!(prefix, count = blobs.len(), "listed objects");
        Ok(blobs)
    }
}
