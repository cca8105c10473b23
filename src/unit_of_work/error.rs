//! Unit of Work Errors

use std::time::Duration;

use crate::repository::PersistenceError;

/// Errors raised by the unit of work itself
#[derive(Debug, thiserror::Error)]
pub enum UnitOfWorkError {
    /// No factory registered under this name
    #[error("Repository not registered: {0}")]
    RepositoryNotRegistered(String),

    /// The registered factory builds a different type than requested
    #[error("Repository '{name}' is not a {expected}")]
    RepositoryTypeMismatch { name: String, expected: &'static str },

    /// The context was cancelled before the work finished
    #[error("Unit of work cancelled")]
    Cancelled,

    /// The context's timeout elapsed before the work finished
    #[error("Unit of work timed out after {0:?}")]
    TimedOut(Duration),

    /// The work panicked; the scope was rolled back
    #[error("Unit of work panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl UnitOfWorkError {
    /// Check if the work was interrupted rather than failing on its own
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            UnitOfWorkError::Cancelled | UnitOfWorkError::TimedOut(_) | UnitOfWorkError::Panicked(_)
        )
    }
}
