use keep_core::{DeadlineExceeded, KeepError};
use thiserror::Error;

pub type BlobResult<T> = Result<T, BlobError>;

/// Failures of sniffing and of blob store calls.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {path}")]
    NotFound { path: String },

    #[error("Invalid blob request: {message}")]
    Invalid { message: String },

    #[error("Need at least {needed} bytes to detect the file type, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Unknown file type: {hint}")]
    UnknownType { hint: String },

    #[error("Blob of {size} bytes exceeds the maximum of {max}")]
    TooLarge { size: u64, max: u64 },

    #[error("{source}")]
    DeadlineExceeded {
        #[from]
        source: DeadlineExceeded,
    },

    #[error("Blob store unavailable: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BlobError {
    /// Wrap an SDK or transport failure.
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(path: S) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn unknown_type<S: Into<String>>(hint: S) -> Self {
        Self::UnknownType { hint: hint.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<BlobError> for KeepError {
    fn from(err: BlobError) -> Self {
        let message = err.to_string();
        match err {
            BlobError::NotFound { .. } => KeepError::not_found(message),
            BlobError::Invalid { .. } | BlobError::TooLarge { .. } => {
                KeepError::invalid_argument(message)
            }
            BlobError::InsufficientData { .. } => KeepError::insufficient_data(message),
            BlobError::UnknownType { .. } => KeepError::unknown_type(message),
            BlobError::DeadlineExceeded { .. } => KeepError::deadline_exceeded(message),
            BlobError::Backend { .. } | BlobError::Io { .. } => {
                KeepError::unavailable(message).with_source(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keep_core::ErrorKind;

    #[test]
    fn kinds_survive_conversion() {
        let cases = [
            (BlobError::not_found("documents/u1/a.png"), ErrorKind::NotFound),
            (BlobError::InsufficientData { needed: 8, got: 3 }, ErrorKind::InsufficientData),
            (BlobError::unknown_type("GIF8"), ErrorKind::UnknownType),
            (BlobError::TooLarge { size: 10, max: 5 }, ErrorKind::InvalidArgument),
            (
                BlobError::from(std::io::Error::new(std::io::ErrorKind::Other, "reset")),
                ErrorKind::Unavailable,
            ),
        ];
        for (blob, kind) in cases {
            assert_eq!(KeepError::from(blob).kind, kind);
        }
    }

    #[test]
    fn deadline_maps_to_deadline_exceeded() {
        let err: BlobError = DeadlineExceeded { operation: "blob.upload" }.into();
        let keep = KeepError::from(err);
        assert_eq!(keep.kind, ErrorKind::DeadlineExceeded);
        assert!(keep.message.contains("blob.upload"));
    }
}
