//! Command definitions
//!
//! Inputs and outputs of the use cases.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::TransactionStatus;

// =========================================================================
// CreateTransaction
// =========================================================================

/// Command to move funds between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionCommand {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Decimal,
}

impl CreateTransactionCommand {
    pub fn new(from_account_id: Uuid, to_account_id: Uuid, amount: Decimal) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }
}

/// Result of a committed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionOutput {
    pub transaction_id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Decimal,
    /// Source balance after the debit
    pub from_balance: Decimal,
    /// Destination balance after the credit
    pub to_balance: Decimal,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

// =========================================================================
// CreateCustomer
// =========================================================================

/// Command to register a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerCommand {
    pub name: String,
    pub email: String,
}

impl CreateCustomerCommand {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

// =========================================================================
// CreateAccount
// =========================================================================

/// Command to open a zero-balance account for an existing customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    pub customer_id: Uuid,
}

impl CreateAccountCommand {
    pub fn new(customer_id: Uuid) -> Self {
        Self { customer_id }
    }
}
