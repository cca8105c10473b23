//! Work Context
//!
//! Carried through every unit-of-work call: correlation for tracing, plus the
//! cancellation token and timeout the unit of work turns into a rollback.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Context for a logical operation
#[derive(Debug, Clone)]
pub struct WorkContext {
    /// Correlation ID for request tracing
    correlation_id: Option<Uuid>,

    /// Upper bound for one unit-of-work scope
    timeout: Option<Duration>,

    cancellation: CancellationToken,
}

impl WorkContext {
    /// Create a new context with no deadline
    pub fn new() -> Self {
        Self {
            correlation_id: None,
            timeout: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Create context with a timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Create context sharing an existing cancellation token
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    pub fn correlation_id(&self) -> Option<Uuid> {
        self.correlation_id
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Cancel every operation running under this context
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Default for WorkContext {
    fn default() -> Self {
        Self::new()
    }
}
