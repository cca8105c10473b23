//! Error handling module
//!
//! Crate-level error type returned by the use cases. Inner errors are wrapped
//! transparently so their messages reach the caller unchanged.

use uuid::Uuid;

use crate::domain::DomainError;
use crate::repository::PersistenceError;
use crate::unit_of_work::UnitOfWorkError;

/// Crate-wide Result type
pub type WalletResult<T> = Result<T, WalletError>;

/// Wallet error types
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    #[error(transparent)]
    UnitOfWork(#[from] UnitOfWorkError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Coarse classification of a `WalletError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidAmount,
    InvalidParticipants,
    AlreadyCompleted,
    InsufficientFunds,
    BalanceOverflow,
    InvalidCustomer,
    AccountNotFound,
    CustomerNotFound,
    RepositoryNotRegistered,
    Interrupted,
    ConcurrencyConflict,
    PersistenceFailure,
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::Domain(err) => match err {
                DomainError::InvalidAmount(_) => ErrorKind::InvalidAmount,
                DomainError::InvalidParticipants(_) => ErrorKind::InvalidParticipants,
                DomainError::AlreadyCompleted => ErrorKind::AlreadyCompleted,
                DomainError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
                DomainError::BalanceOverflow(_) => ErrorKind::BalanceOverflow,
                DomainError::InvalidCustomer(_) => ErrorKind::InvalidCustomer,
            },
            WalletError::AccountNotFound(_) => ErrorKind::AccountNotFound,
            WalletError::CustomerNotFound(_) => ErrorKind::CustomerNotFound,
            WalletError::UnitOfWork(err) if err.is_interrupted() => ErrorKind::Interrupted,
            WalletError::UnitOfWork(err) => match err {
                UnitOfWorkError::Persistence(err) => persistence_kind(err),
                _ => ErrorKind::RepositoryNotRegistered,
            },
            WalletError::Persistence(err) => persistence_kind(err),
        }
    }

    /// Check if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            WalletError::Persistence(err) | WalletError::UnitOfWork(UnitOfWorkError::Persistence(err)) => {
                err.is_retryable()
            }
            WalletError::UnitOfWork(UnitOfWorkError::TimedOut(_)) => true,
            _ => false,
        }
    }
}

fn persistence_kind(err: &PersistenceError) -> ErrorKind {
    if err.is_concurrency_conflict() {
        ErrorKind::ConcurrencyConflict
    } else {
        ErrorKind::PersistenceFailure
    }
}
