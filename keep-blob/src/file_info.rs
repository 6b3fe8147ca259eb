use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{BlobInfo, ObjectHead};

/// What the caller learns about a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub size: i64,
    pub content_type: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub bucket: String,
}

impl FileInfo {
    pub(crate) fn from_head(bucket: &str, path: &str, head: ObjectHead) -> Self {
        Self {
            path: path.to_string(),
            size: i64::try_from(head.size_bytes).unwrap_or(i64::MAX),
            content_type: head.content_type.unwrap_or_default(),
            last_modified: head.last_modified,
            bucket: bucket.to_string(),
        }
    }

    pub(crate) fn from_listing(bucket: &str, info: BlobInfo) -> Self {
        Self {
            path: info.key,
            size: i64::try_from(info.size_bytes).unwrap_or(i64::MAX),
            content_type: info.content_type.unwrap_or_default(),
            last_modified: info.last_modified,
            bucket: bucket.to_string(),
        }
    }
}
