//! Persistence Errors
//!
//! Error types for storage operations behind the repositories and scopes.

use uuid::Uuid;

/// Errors that can occur in a persistence resource
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Optimistic concurrency conflict
    #[error("Concurrency conflict for {entity} {id}: expected version {expected}")]
    ConcurrencyConflict {
        entity: &'static str,
        id: Uuid,
        expected: i64,
    },

    /// Row to update does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Row with the same key already exists
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: Uuid },

    /// The scope was already committed or rolled back
    #[error("Scope is closed: it was already committed or rolled back")]
    ScopeClosed,

    /// Stored data could not be mapped back to an entity
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failure reported by a non-SQL backend
    #[error("{0}")]
    Backend(String),
}

impl PersistenceError {
    /// Check if this error is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, PersistenceError::ConcurrencyConflict { .. })
    }

    /// Check if re-running the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PersistenceError::ConcurrencyConflict { .. } | PersistenceError::Database(_)
        )
    }
}
