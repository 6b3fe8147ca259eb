//! # Errors
//!
//! keep carries one structured error through every layer. Goals:
//! - a small, closed set of kinds the handler layer can map to a status
//! - operation context added at each hop without losing the kind
//! - can be carried through `anyhow::Error` when a caller prefers that
//!
//! ```rust
//! use keep_core::errors::{ErrorKind, KeepError};
//!
//! let err = KeepError::not_found("document with id 42 not found")
//!     .wrap("failed to get document by ID");
//!
//! assert_eq!(err.kind, ErrorKind::NotFound);
//! assert_eq!(err.code(), 404);
//! assert_eq!(
//!     err.message,
//!     "failed to get document by ID: document with id 42 not found"
//! );
//! ```

use std::fmt;

use anyhow::Error as AnyError;

/// A convenience result type for keep APIs.
pub type KeepResult<T> = std::result::Result<T, KeepError>;

/// Error classes and the status the handler layer should answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,  // 400
    InsufficientData, // 400
    NotFound,         // 404
    UnknownType,      // 415
    DataShape,        // 500
    Unavailable,      // 503
    DeadlineExceeded, // 504
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidArgument => 400,
            ErrorKind::InsufficientData => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::UnknownType => 415,
            ErrorKind::DataShape => 500,
            ErrorKind::Unavailable => 503,
            ErrorKind::DeadlineExceeded => 504,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::InsufficientData => "InsufficientData",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::UnknownType => "UnknownType",
            ErrorKind::DataShape => "DataShape",
            ErrorKind::Unavailable => "Unavailable",
            ErrorKind::DeadlineExceeded => "DeadlineExceeded",
        }
    }

    /// Kebab-cased class name, handy for JSON error bodies.
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid-argument",
            ErrorKind::InsufficientData => "insufficient-data",
            ErrorKind::NotFound => "not-found",
            ErrorKind::UnknownType => "unknown-type",
            ErrorKind::DataShape => "data-shape",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::DeadlineExceeded => "deadline-exceeded",
        }
    }

    /// Client mistakes (4xx) as opposed to store or server faults.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

/// A structured keep error.
///
/// - kind (drives the status code)
/// - message (operation context, outermost first)
/// - source (the underlying driver/IO error, if any)
#[derive(Debug)]
pub struct KeepError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl KeepError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<AnyError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Prefix operation context, keeping the kind and the root source.
    pub fn wrap(self, context: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{}: {}", context, self.message),
            source: self.source,
        }
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Convert into `anyhow::Error`.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to a `KeepError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&KeepError> {
        err.downcast_ref::<KeepError>()
    }

    /// Turn any error into a KeepError:
    /// - if it's already a KeepError, keep it (lossless)
    /// - otherwise wrap as Unavailable
    pub fn normalize(err: AnyError) -> KeepError {
        match err.downcast::<KeepError>() {
            Ok(keep) => keep,
            Err(other) => KeepError::new(ErrorKind::Unavailable, other.to_string()).with_source(other),
        }
    }

    /// Same kind and message, without the inner source (driver details).
    pub fn sanitize_for_client(&self) -> KeepError {
        KeepError {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }

    /// JSON error body for the handler layer.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        })
    }

    // ---- Constructors ----

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, msg)
    }
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientData, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn unknown_type(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownType, msg)
    }
    pub fn data_shape(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataShape, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
    pub fn deadline_exceeded(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::DeadlineExceeded, msg)
    }
}

impl fmt::Display for KeepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for KeepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for KeepError {
    fn from(err: serde_json::Error) -> Self {
        KeepError::data_shape(format!("failed to convert document data: {err}")).with_source(err)
    }
}

/// Convenience helper for "bail with KeepError".
#[macro_export]
macro_rules! bail_keep {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::KeepError::$ctor($msg))
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::KeepError::$ctor(format!($fmt, $($arg)*)))
    };
}
