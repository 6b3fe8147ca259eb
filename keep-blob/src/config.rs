/// Default ceiling for a single blob: 25 MiB.
pub const DEFAULT_MAX_BLOB_BYTES: u64 = 25 * 1024 * 1024;

/// Limits applied by [`BlobAdapter`](crate::BlobAdapter).
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Uploads and whole-object downloads larger than this are refused.
    pub max_blob_bytes: u64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            max_blob_bytes: DEFAULT_MAX_BLOB_BYTES,
        }
    }
}

impl BlobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }
}
