//! Per-request context carried into every repository and blob call.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::errors::KeepError;

/// Context for one inbound request.
///
/// The deadline, when present, bounds every store call made on behalf of
/// the request. Calls still in flight at expiry are abandoned.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub actor_id: Option<String>,
    pub deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            actor_id: None,
            deadline: None,
        }
    }

    pub fn with_actor<S: Into<String>>(mut self, actor_id: S) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn with_request_id<S: Into<String>>(mut self, request_id: S) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Run one store call under the request deadline.
    pub async fn run<F, T, E>(&self, operation: &'static str, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<DeadlineExceeded>,
    {
        match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(request_id = %self.request_id, operation, "deadline exceeded");
                    Err(DeadlineExceeded { operation }.into())
                }
            },
            None => fut.await,
        }
    }
}

/// The caller's deadline expired before a store call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded {
    pub operation: &'static str,
}

impl fmt::Display for DeadlineExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deadline exceeded during {}", self.operation)
    }
}

impl std::error::Error for DeadlineExceeded {}

impl From<DeadlineExceeded> for KeepError {
    fn from(err: DeadlineExceeded) -> Self {
        KeepError::deadline_exceeded(err.to_string())
    }
}
