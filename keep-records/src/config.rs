//! Typed application settings built from a [`KeepConfig`].
//!
//! Every key has a default except `blob.bucket`:
//!
//! | key                         | default                     |
//! |-----------------------------|-----------------------------|
//! | `mongo.uri`                 | `mongodb://localhost:27017` |
//! | `mongo.database`            | `keep`                      |
//! | `collections.users`         | `users`                     |
//! | `collections.documents`     | `documents`                 |
//! | `blob.max_bytes`            | 25 MiB                      |
//! | `paginate.owner_documents`  | `100`                       |
//! | `log.filter`                | `info`                      |
//! | `log.json`                  | `false`                     |

use std::str::FromStr;

use keep_blob::{BlobConfig, S3Config, DEFAULT_MAX_BLOB_BYTES};
use keep_core::{KeepConfig, KeepConfigSnapshot, KeepError, KeepResult};

use crate::services::documents::documents_service::DEFAULT_OWNER_PAGE_SIZE;

/// Environment prefix: `KEEP__BLOB__BUCKET` sets `blob.bucket`.
pub const ENV_PREFIX: &str = "KEEP__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub users_collection: String,
    pub documents_collection: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobSettings {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub max_bytes: u64,
}

impl BlobSettings {
    pub fn s3_config(&self) -> S3Config {
        let mut config = S3Config::new(self.bucket.clone());
        config.region = self.region.clone();
        config.endpoint_url = self.endpoint.clone();
        config.access_key_id = self.access_key_id.clone();
        config.secret_access_key = self.secret_access_key.clone();
        config
    }

    pub fn blob_config(&self) -> BlobConfig {
        BlobConfig::new().with_max_blob_bytes(self.max_bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordsConfig {
    pub mongo: MongoSettings,
    pub blob: BlobSettings,
    pub owner_page_size: usize,
    pub log: LogConfig,
}

impl RecordsConfig {
    pub fn from_env() -> KeepResult<Self> {
        Self::from_config(&KeepConfig::from_env(ENV_PREFIX))
    }

    pub fn from_config(config: &KeepConfig) -> KeepResult<Self> {
        Self::from_snapshot(&config.snapshot())
    }

    pub fn from_snapshot(snapshot: &KeepConfigSnapshot) -> KeepResult<Self> {
        let optional = |key: &str| {
            snapshot
                .get(key)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            mongo: MongoSettings {
                uri: snapshot.get_or("mongo.uri", "mongodb://localhost:27017"),
                database: snapshot.get_or("mongo.database", "keep"),
                users_collection: snapshot.get_or("collections.users", "users"),
                documents_collection: snapshot.get_or("collections.documents", "documents"),
            },
            blob: BlobSettings {
                bucket: snapshot.require("blob.bucket")?,
                region: optional("blob.region"),
                endpoint: optional("blob.endpoint"),
                access_key_id: optional("blob.access_key_id"),
                secret_access_key: optional("blob.secret_access_key"),
                max_bytes: parse_or(snapshot, "blob.max_bytes", DEFAULT_MAX_BLOB_BYTES)?,
            },
            owner_page_size: parse_or(snapshot, "paginate.owner_documents", DEFAULT_OWNER_PAGE_SIZE)?,
            log: LogConfig {
                filter: snapshot.get_or("log.filter", "info"),
                json: parse_or(snapshot, "log.json", false)?,
            },
        })
    }
}

// Unlike the snapshot getters, a present but unparsable value is an error.
fn parse_or<T: FromStr>(snapshot: &KeepConfigSnapshot, key: &str, default: T) -> KeepResult<T> {
    match snapshot.get(key).map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            KeepError::invalid_argument(format!("invalid value for configuration key {key}: {raw}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keep_core::ErrorKind;

    fn config(pairs: &[(&str, &str)]) -> KeepConfig {
        let mut config = KeepConfig::new();
        for (key, value) in pairs {
            config.set(*key, *value);
        }
        config
    }

    #[test]
    fn defaults_fill_everything_but_the_bucket() {
        let records = RecordsConfig::from_config(&config(&[("blob.bucket", "docs")])).unwrap();

        assert_eq!(records.mongo.uri, "mongodb://localhost:27017");
        assert_eq!(records.mongo.database, "keep");
        assert_eq!(records.mongo.users_collection, "users");
        assert_eq!(records.mongo.documents_collection, "documents");
        assert_eq!(records.blob.bucket, "docs");
        assert_eq!(records.blob.region, None);
        assert_eq!(records.blob.max_bytes, DEFAULT_MAX_BLOB_BYTES);
        assert_eq!(records.owner_page_size, 100);
        assert_eq!(records.log, LogConfig::default());
    }

    #[test]
    fn bucket_is_required() {
        let err = RecordsConfig::from_config(&KeepConfig::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert!(err.message.contains("blob.bucket"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = RecordsConfig::from_config(&config(&[
            ("blob.bucket", "docs"),
            ("paginate.owner_documents", "lots"),
        ]))
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn env_vars_override_defaults() {
        let vars = vec![
            ("KEEP__BLOB__BUCKET".to_string(), "docs".to_string()),
            ("KEEP__BLOB__ENDPOINT".to_string(), "http://localhost:9000".to_string()),
            ("KEEP__MONGO__DATABASE".to_string(), "records".to_string()),
            ("KEEP__LOG__JSON".to_string(), "true".to_string()),
        ];
        let records = RecordsConfig::from_config(&KeepConfig::from_vars(ENV_PREFIX, vars)).unwrap();

        assert_eq!(records.mongo.database, "records");
        assert!(records.log.json);

        let s3 = records.blob.s3_config();
        assert_eq!(s3.bucket, "docs");
        assert_eq!(s3.endpoint_url.as_deref(), Some("http://localhost:9000"));
    }
}
