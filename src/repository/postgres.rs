//! Postgres persistence
//!
//! `PgResource` opens one database transaction per unit-of-work scope; every
//! repository resolved from that scope runs its statements on the same
//! transaction. Accounts are locked with `FOR UPDATE` on load and updated with an
//! optimistic `version` check.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{Account, Customer, TransactionRecord, TransactionStatus};
use crate::unit_of_work::UnitOfWork;

use super::{
    AccountRepository, CustomerRepository, PersistenceError, TransactionRepository,
    TransactionScope, TransactionalResource, ACCOUNT_REPOSITORY, CUSTOMER_REPOSITORY,
    TRANSACTION_REPOSITORY,
};

/// Postgres-backed transactional resource
#[derive(Debug, Clone)]
pub struct PgResource {
    pool: PgPool,
}

impl PgResource {
    /// Create a new PgResource with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionalResource for PgResource {
    type Scope = PgScope;

    async fn begin(&self) -> Result<PgScope, PersistenceError> {
        let tx = self.pool.begin().await?;
        Ok(PgScope {
            tx: Arc::new(Mutex::new(Some(tx))),
        })
    }
}

/// One open database transaction, shared by the repositories of a scope
#[derive(Clone)]
pub struct PgScope {
    tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl PgScope {
    /// Lock the transaction for one statement
    async fn lock(&self) -> Result<TxGuard<'_>, PersistenceError> {
        let guard = self.tx.lock().await;
        if guard.is_none() {
            return Err(PersistenceError::ScopeClosed);
        }
        Ok(TxGuard(guard))
    }
}

/// Guard over an open transaction
struct TxGuard<'a>(MutexGuard<'a, Option<Transaction<'static, Postgres>>>);

impl TxGuard<'_> {
    fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>, PersistenceError> {
        self.0.as_mut().ok_or(PersistenceError::ScopeClosed)
    }
}

#[async_trait]
impl TransactionScope for PgScope {
    async fn commit(&self) -> Result<(), PersistenceError> {
        let tx = self.tx.lock().await.take().ok_or(PersistenceError::ScopeClosed)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), PersistenceError> {
        if let Some(tx) = self.tx.lock().await.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

// =========================================================================
// Accounts
// =========================================================================

type AccountRow = (Uuid, Uuid, Decimal, i64, DateTime<Utc>, DateTime<Utc>);

/// Account repository bound to a Postgres scope
#[derive(Clone)]
pub struct PgAccountRepository {
    scope: PgScope,
}

impl PgAccountRepository {
    pub fn new(scope: PgScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn save(&self, account: &Account) -> Result<(), PersistenceError> {
        let mut guard = self.scope.lock().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, customer_id, balance, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id())
        .bind(account.customer_id())
        .bind(account.balance())
        .bind(account.version())
        .bind(account.created_at())
        .bind(account.updated_at())
        .execute(&mut **guard.tx()?)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, PersistenceError> {
        let mut guard = self.scope.lock().await?;

        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, balance, version, created_at, updated_at
            FROM accounts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **guard.tx()?)
        .await?;

        Ok(row.map(|(id, customer_id, balance, version, created_at, updated_at)| {
            Account::from_parts(id, customer_id, balance, version, created_at, updated_at)
        }))
    }

    async fn update_balance(&self, account: &Account) -> Result<(), PersistenceError> {
        let mut guard = self.scope.lock().await?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET
                balance = $2,
                version = version + 1,
                updated_at = $3
            WHERE id = $1 AND version = $4
            "#,
        )
        .bind(account.id())
        .bind(account.balance())
        .bind(account.updated_at())
        .bind(account.version())
        .execute(&mut **guard.tx()?)
        .await?
        .rows_affected();

        if rows_affected > 0 {
            return Ok(());
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1)")
            .bind(account.id())
            .fetch_one(&mut **guard.tx()?)
            .await?;

        if !exists {
            return Err(PersistenceError::NotFound {
                entity: "Account",
                id: account.id(),
            });
        }

        Err(PersistenceError::ConcurrencyConflict {
            entity: "Account",
            id: account.id(),
            expected: account.version(),
        })
    }
}

// =========================================================================
// Transactions
// =========================================================================

type TransactionRow = (Uuid, Uuid, Uuid, Decimal, String, DateTime<Utc>);

/// Transaction repository bound to a Postgres scope
#[derive(Clone)]
pub struct PgTransactionRepository {
    scope: PgScope,
}

impl PgTransactionRepository {
    pub fn new(scope: PgScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn save(&self, transaction: &TransactionRecord) -> Result<(), PersistenceError> {
        let mut guard = self.scope.lock().await?;

        sqlx::query(
            r#"
            INSERT INTO transactions (id, account_id_from, account_id_to, amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.from_account_id)
        .bind(transaction.to_account_id)
        .bind(transaction.amount)
        .bind(transaction.status.to_string())
        .bind(transaction.created_at)
        .execute(&mut **guard.tx()?)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<TransactionRecord>, PersistenceError> {
        let mut guard = self.scope.lock().await?;

        let row: Option<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, account_id_from, account_id_to, amount, status, created_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **guard.tx()?)
        .await?;

        row.map(transaction_from_row).transpose()
    }
}

fn transaction_from_row(row: TransactionRow) -> Result<TransactionRecord, PersistenceError> {
    let (id, from_account_id, to_account_id, amount, status, created_at) = row;
    let status: TransactionStatus = status.parse().map_err(PersistenceError::InvalidData)?;

    Ok(TransactionRecord {
        id,
        from_account_id,
        to_account_id,
        amount,
        status,
        created_at,
    })
}

// =========================================================================
// Customers
// =========================================================================

type CustomerRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);

/// Customer repository bound to a Postgres scope
#[derive(Clone)]
pub struct PgCustomerRepository {
    scope: PgScope,
}

impl PgCustomerRepository {
    pub fn new(scope: PgScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn save(&self, customer: &Customer) -> Result<(), PersistenceError> {
        let mut guard = self.scope.lock().await?;

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(customer.id())
        .bind(customer.name())
        .bind(customer.email())
        .bind(customer.created_at())
        .bind(customer.updated_at())
        .execute(&mut **guard.tx()?)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>, PersistenceError> {
        let mut guard = self.scope.lock().await?;

        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, created_at, updated_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **guard.tx()?)
        .await?;

        Ok(row.map(|(id, name, email, created_at, updated_at)| {
            Customer::from_parts(id, name, email, created_at, updated_at)
        }))
    }
}

/// Register the Postgres account, transaction and customer repositories
pub fn register_repositories(unit_of_work: &UnitOfWork<PgResource>) {
    unit_of_work.add(ACCOUNT_REPOSITORY, |scope: &PgScope| -> Arc<dyn AccountRepository> {
        Arc::new(PgAccountRepository::new(scope.clone()))
    });
    unit_of_work.add(
        TRANSACTION_REPOSITORY,
        |scope: &PgScope| -> Arc<dyn TransactionRepository> {
            Arc::new(PgTransactionRepository::new(scope.clone()))
        },
    );
    unit_of_work.add(CUSTOMER_REPOSITORY, |scope: &PgScope| -> Arc<dyn CustomerRepository> {
        Arc::new(PgCustomerRepository::new(scope.clone()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row_with_status(status: &str) -> TransactionRow {
        (
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(1.000000005),
            status.to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_transaction_row_maps_status() {
        let row = row_with_status("COMPLETED");
        let id = row.0;

        let record = transaction_from_row(row).unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.status, TransactionStatus::Completed);
        assert_eq!(record.amount, dec!(1.000000005));
        assert_eq!(
            transaction_from_row(row_with_status("FAILED")).unwrap().status,
            TransactionStatus::Failed
        );
    }

    #[test]
    fn test_unknown_status_is_invalid_data() {
        let result = transaction_from_row(row_with_status("PENDING"));
        assert!(matches!(result, Err(PersistenceError::InvalidData(_))));
    }
}
