//! Account entity
//!
//! Holds a balance and enforces the debit/credit invariants. Persistence is the
//! caller's responsibility, through a repository resolved from the same unit of work.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Customer, DomainError};

/// Account
///
/// # Invariants
/// - Balance is never negative after a debit completes
/// - Balance only changes through `debit` / `credit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID
    id: Uuid,

    /// Owning customer
    customer_id: Uuid,

    /// Current balance
    balance: Decimal,

    /// Optimistic concurrency token, bumped by storage on every balance update
    version: i64,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Open a zero-balance account for a customer
    pub fn new(customer: &Customer) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id: customer.id(),
            balance: Decimal::ZERO,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild an account from stored state
    pub fn from_parts(
        id: Uuid,
        customer_id: Uuid,
        balance: Decimal,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            balance,
            version,
            created_at,
            updated_at,
        }
    }

    // =========================================================================
    // Balance operations
    // =========================================================================

    /// Withdraw `amount` from the balance
    pub fn debit(&mut self, amount: Decimal) -> Result<(), DomainError> {
        ensure_positive(amount)?;

        if amount > self.balance {
            return Err(DomainError::insufficient_funds(amount, self.balance));
        }

        self.balance -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Deposit `amount` into the balance
    pub fn credit(&mut self, amount: Decimal) -> Result<(), DomainError> {
        ensure_positive(amount)?;

        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(DomainError::BalanceOverflow(amount))?;

        self.balance = balance;
        self.updated_at = Utc::now();
        Ok(())
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn customer_id(&self) -> Uuid {
        self.customer_id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::non_positive_amount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account_with(balance: Decimal) -> Account {
        let now = Utc::now();
        Account::from_parts(Uuid::new_v4(), Uuid::new_v4(), balance, 3, now, now)
    }

    #[test]
    fn test_new_account_starts_empty() {
        let customer = Customer::new("Bob", "bob@example.com").unwrap();
        let account = Account::new(&customer);

        assert_eq!(account.customer_id(), customer.id());
        assert_eq!(account.balance(), Decimal::ZERO);
        assert_eq!(account.version(), 0);
    }

    #[test]
    fn test_credit_then_debit() {
        let mut account = account_with(Decimal::ZERO);

        account.credit(dec!(100.25)).unwrap();
        assert_eq!(account.balance(), dec!(100.25));

        account.debit(dec!(30.05)).unwrap();
        assert_eq!(account.balance(), dec!(70.20));
    }

    #[test]
    fn test_debit_whole_balance() {
        let mut account = account_with(dec!(50));

        account.debit(dec!(50)).unwrap();
        assert_eq!(account.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_debit_insufficient_funds() {
        let mut account = account_with(dec!(50));

        let result = account.debit(dec!(50.01));
        assert_eq!(
            result,
            Err(DomainError::insufficient_funds(dec!(50.01), dec!(50)))
        );
        assert_eq!(account.balance(), dec!(50));
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let mut account = account_with(dec!(10));

        for amount in [Decimal::ZERO, dec!(-1)] {
            assert!(matches!(account.debit(amount), Err(DomainError::InvalidAmount(_))));
            assert!(matches!(account.credit(amount), Err(DomainError::InvalidAmount(_))));
        }
        assert_eq!(account.balance(), dec!(10));
    }

    #[test]
    fn test_credit_overflow() {
        let mut account = account_with(Decimal::MAX);

        let result = account.credit(dec!(1));
        assert_eq!(result, Err(DomainError::BalanceOverflow(dec!(1))));
        assert_eq!(account.balance(), Decimal::MAX);
    }
}
