//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

/// Domain-specific errors
///
/// These errors represent business rule violations and entity invariant failures.
/// They surface synchronously from the constructing/committing call and are never
/// retried internally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Amount is zero or negative
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A transaction participant is missing or both sides are the same account
    #[error("Invalid participants: {0}")]
    InvalidParticipants(String),

    /// The transaction was already committed
    #[error("Transaction is already COMPLETED")]
    AlreadyCompleted,

    /// Insufficient balance for debit operation
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    /// Credit would exceed the representable balance
    #[error("Balance overflow while crediting {0}")]
    BalanceOverflow(Decimal),

    /// Customer data failed validation
    #[error("Invalid customer: {0}")]
    InvalidCustomer(String),
}

impl DomainError {
    /// Create an insufficient funds error
    pub fn insufficient_funds(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// Create an invalid amount error for a non-positive value
    pub fn non_positive_amount(amount: Decimal) -> Self {
        Self::InvalidAmount(format!("'amount' must be a non zero positive number (got {})", amount))
    }

    /// Check if this is a validation error (caller's input was wrong)
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_) | Self::InvalidParticipants(_) | Self::InvalidCustomer(_)
        )
    }
}
