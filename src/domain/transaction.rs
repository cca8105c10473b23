//! Transaction entity
//!
//! A funds movement between two accounts. Construction validates and commits in a
//! single step, so a `Transaction` value that exists has always moved its funds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Account, DomainError};

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Failed,
    Completed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Failed => write!(f, "FAILED"),
            TransactionStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FAILED" => Ok(TransactionStatus::Failed),
            "COMPLETED" => Ok(TransactionStatus::Completed),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

/// Transaction between two accounts
///
/// Borrows both accounts mutably for the balance changes; the accounts are owned by
/// whoever loaded them and outlive the transaction.
#[derive(Debug)]
pub struct Transaction<'a> {
    id: Uuid,
    from_account: Option<&'a mut Account>,
    to_account: Option<&'a mut Account>,
    amount: Decimal,
    status: TransactionStatus,
    created_at: DateTime<Utc>,
}

impl<'a> Transaction<'a> {
    /// Build, validate and commit a transaction.
    ///
    /// # Errors
    /// - `DomainError::InvalidParticipants` if an account is missing or both are the same
    /// - `DomainError::InvalidAmount` if amount <= 0
    /// - any error from `commit`
    pub fn new(
        from_account: Option<&'a mut Account>,
        to_account: Option<&'a mut Account>,
        amount: Decimal,
    ) -> Result<Self, DomainError> {
        let mut transaction = Self {
            id: Uuid::new_v4(),
            from_account,
            to_account,
            amount,
            status: TransactionStatus::Failed,
            created_at: Utc::now(),
        };

        transaction.validate()?;
        transaction.commit()?;

        Ok(transaction)
    }

    /// Build a transaction between two present accounts
    pub fn between(
        from_account: &'a mut Account,
        to_account: &'a mut Account,
        amount: Decimal,
    ) -> Result<Self, DomainError> {
        Self::new(Some(from_account), Some(to_account), amount)
    }

    /// Check participants and amount
    pub fn validate(&self) -> Result<(), DomainError> {
        let (Some(from), Some(to)) = (self.from_account.as_deref(), self.to_account.as_deref())
        else {
            return Err(DomainError::InvalidParticipants(
                "neither 'fromAccount' nor 'toAccount' can be absent".to_string(),
            ));
        };

        if from.id() == to.id() {
            return Err(DomainError::InvalidParticipants(
                "'fromAccount' and 'toAccount' must be different accounts".to_string(),
            ));
        }

        if self.amount <= Decimal::ZERO {
            return Err(DomainError::non_positive_amount(self.amount));
        }

        Ok(())
    }

    /// Apply the debit and credit. Debit always runs first.
    ///
    /// If the credit fails after the debit went through, the source account is
    /// restored to its state before the debit, so neither side is applied.
    pub fn commit(&mut self) -> Result<(), DomainError> {
        if self.status == TransactionStatus::Completed {
            return Err(DomainError::AlreadyCompleted);
        }

        let (Some(from), Some(to)) = (self.from_account.as_deref_mut(), self.to_account.as_deref_mut())
        else {
            return Err(DomainError::InvalidParticipants(
                "neither 'fromAccount' nor 'toAccount' can be absent".to_string(),
            ));
        };

        let from_before = from.clone();
        from.debit(self.amount)?;

        if let Err(err) = to.credit(self.amount) {
            *from = from_before;
            return Err(err);
        }

        self.status = TransactionStatus::Completed;
        Ok(())
    }

    /// Owned snapshot for persistence
    pub fn record(&self) -> TransactionRecord {
        TransactionRecord {
            id: self.id,
            from_account_id: self.from_account().map(Account::id).unwrap_or_default(),
            to_account_id: self.to_account().map(Account::id).unwrap_or_default(),
            amount: self.amount,
            status: self.status,
            created_at: self.created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn from_account(&self) -> Option<&Account> {
        self.from_account.as_deref()
    }

    pub fn to_account(&self) -> Option<&Account> {
        self.to_account.as_deref()
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Persistable snapshot of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}
