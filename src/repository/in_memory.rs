//! In-memory persistence
//!
//! A `TransactionalResource` with the same atomic semantics as the Postgres one:
//! writes are staged per scope, invisible to other scopes, and applied all at once
//! on commit after every optimistic version check has passed. Used by tests and
//! local runs that have no database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::domain::{Account, Customer, TransactionRecord};
use crate::unit_of_work::UnitOfWork;

use super::{
    AccountRepository, CustomerRepository, PersistenceError, TransactionRepository,
    TransactionScope, TransactionalResource, ACCOUNT_REPOSITORY, CUSTOMER_REPOSITORY,
    TRANSACTION_REPOSITORY,
};

/// Committed state
#[derive(Debug, Clone, Default)]
struct Tables {
    customers: HashMap<Uuid, Customer>,
    accounts: HashMap<Uuid, Account>,
    transactions: HashMap<Uuid, TransactionRecord>,
}

impl Tables {
    /// Apply one staged write, enforcing keys and versions
    fn apply(&mut self, write: StagedWrite) -> Result<(), PersistenceError> {
        match write {
            StagedWrite::Customer(customer) => {
                if self.customers.contains_key(&customer.id()) {
                    return Err(PersistenceError::Duplicate {
                        entity: "Customer",
                        id: customer.id(),
                    });
                }
                self.customers.insert(customer.id(), customer);
            }
            StagedWrite::NewAccount(account) => {
                if self.accounts.contains_key(&account.id()) {
                    return Err(PersistenceError::Duplicate {
                        entity: "Account",
                        id: account.id(),
                    });
                }
                self.accounts.insert(account.id(), account);
            }
            StagedWrite::AccountBalance {
                expected_version,
                account,
            } => {
                let current = self.accounts.get(&account.id()).ok_or(PersistenceError::NotFound {
                    entity: "Account",
                    id: account.id(),
                })?;
                if current.version() != expected_version {
                    return Err(PersistenceError::ConcurrencyConflict {
                        entity: "Account",
                        id: account.id(),
                        expected: expected_version,
                    });
                }
                self.accounts.insert(account.id(), account);
            }
            StagedWrite::Transaction(record) => {
                if self.transactions.contains_key(&record.id) {
                    return Err(PersistenceError::Duplicate {
                        entity: "Transaction",
                        id: record.id,
                    });
                }
                self.transactions.insert(record.id, record);
            }
        }
        Ok(())
    }
}

/// A write waiting for its scope to commit
#[derive(Debug, Clone)]
enum StagedWrite {
    Customer(Customer),
    NewAccount(Account),
    AccountBalance { expected_version: i64, account: Account },
    Transaction(TransactionRecord),
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed state of an account
    pub async fn account(&self, id: Uuid) -> Option<Account> {
        self.tables.read().await.accounts.get(&id).cloned()
    }

    /// Committed state of a customer
    pub async fn customer(&self, id: Uuid) -> Option<Customer> {
        self.tables.read().await.customers.get(&id).cloned()
    }

    /// Committed transaction record
    pub async fn transaction(&self, id: Uuid) -> Option<TransactionRecord> {
        self.tables.read().await.transactions.get(&id).cloned()
    }

    /// Number of committed transactions
    pub async fn transaction_count(&self) -> usize {
        self.tables.read().await.transactions.len()
    }
}

#[async_trait]
impl TransactionalResource for InMemoryStore {
    type Scope = InMemoryScope;

    async fn begin(&self) -> Result<InMemoryScope, PersistenceError> {
        Ok(InMemoryScope {
            tables: Arc::clone(&self.tables),
            staged: Arc::new(Mutex::new(Some(Vec::new()))),
        })
    }
}

/// One open in-memory scope
#[derive(Debug, Clone)]
pub struct InMemoryScope {
    tables: Arc<RwLock<Tables>>,
    staged: Arc<Mutex<Option<Vec<StagedWrite>>>>,
}

impl InMemoryScope {
    /// Stage a write after checking it against what this scope can see
    async fn stage(&self, write: StagedWrite) -> Result<(), PersistenceError> {
        let mut staged = self.staged.lock().await;
        let writes = staged.as_mut().ok_or(PersistenceError::ScopeClosed)?;

        let mut view = self.tables.read().await.clone();
        for pending in writes.iter().cloned() {
            view.apply(pending)?;
        }
        view.apply(write.clone())?;

        writes.push(write);
        Ok(())
    }

    /// Read through this scope's own staged writes, then committed state
    async fn read<T>(&self, lookup: impl Fn(&Tables) -> Option<T>) -> Result<Option<T>, PersistenceError> {
        let staged = self.staged.lock().await;
        let writes = staged.as_ref().ok_or(PersistenceError::ScopeClosed)?;

        let tables = self.tables.read().await;
        if writes.is_empty() {
            return Ok(lookup(&tables));
        }

        let mut view = tables.clone();
        for pending in writes.iter().cloned() {
            view.apply(pending)?;
        }
        Ok(lookup(&view))
    }
}

#[async_trait]
impl TransactionScope for InMemoryScope {
    async fn commit(&self) -> Result<(), PersistenceError> {
        let writes = self
            .staged
            .lock()
            .await
            .take()
            .ok_or(PersistenceError::ScopeClosed)?;

        let mut tables = self.tables.write().await;
        let mut next = tables.clone();
        for write in writes {
            next.apply(write)?;
        }
        *tables = next;

        Ok(())
    }

    async fn rollback(&self) -> Result<(), PersistenceError> {
        self.staged.lock().await.take();
        Ok(())
    }
}

// =========================================================================
// Repositories
// =========================================================================

/// Account repository bound to an in-memory scope
#[derive(Debug, Clone)]
pub struct InMemoryAccountRepository {
    scope: InMemoryScope,
}

impl InMemoryAccountRepository {
    pub fn new(scope: InMemoryScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn save(&self, account: &Account) -> Result<(), PersistenceError> {
        self.scope.stage(StagedWrite::NewAccount(account.clone())).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, PersistenceError> {
        self.scope.read(|tables| tables.accounts.get(&id).cloned()).await
    }

    async fn update_balance(&self, account: &Account) -> Result<(), PersistenceError> {
        let updated = Account::from_parts(
            account.id(),
            account.customer_id(),
            account.balance(),
            account.version() + 1,
            account.created_at(),
            account.updated_at(),
        );

        self.scope
            .stage(StagedWrite::AccountBalance {
                expected_version: account.version(),
                account: updated,
            })
            .await
    }
}

/// Transaction repository bound to an in-memory scope
#[derive(Debug, Clone)]
pub struct InMemoryTransactionRepository {
    scope: InMemoryScope,
}

impl InMemoryTransactionRepository {
    pub fn new(scope: InMemoryScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn save(&self, transaction: &TransactionRecord) -> Result<(), PersistenceError> {
        self.scope.stage(StagedWrite::Transaction(transaction.clone())).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<TransactionRecord>, PersistenceError> {
        self.scope.read(|tables| tables.transactions.get(&id).cloned()).await
    }
}

/// Customer repository bound to an in-memory scope
#[derive(Debug, Clone)]
pub struct InMemoryCustomerRepository {
    scope: InMemoryScope,
}

impl InMemoryCustomerRepository {
    pub fn new(scope: InMemoryScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn save(&self, customer: &Customer) -> Result<(), PersistenceError> {
        self.scope.stage(StagedWrite::Customer(customer.clone())).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>, PersistenceError> {
        self.scope.read(|tables| tables.customers.get(&id).cloned()).await
    }
}

/// Register the in-memory account, transaction and customer repositories
pub fn register_repositories(unit_of_work: &UnitOfWork<InMemoryStore>) {
    unit_of_work.add(ACCOUNT_REPOSITORY, |scope: &InMemoryScope| -> Arc<dyn AccountRepository> {
        Arc::new(InMemoryAccountRepository::new(scope.clone()))
    });
    unit_of_work.add(
        TRANSACTION_REPOSITORY,
        |scope: &InMemoryScope| -> Arc<dyn TransactionRepository> {
            Arc::new(InMemoryTransactionRepository::new(scope.clone()))
        },
    );
    unit_of_work.add(CUSTOMER_REPOSITORY, |scope: &InMemoryScope| -> Arc<dyn CustomerRepository> {
        Arc::new(InMemoryCustomerRepository::new(scope.clone()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    async fn seed_account(store: &InMemoryStore, balance: rust_decimal::Decimal) -> Account {
        let customer = Customer::new("Seed", "seed@example.com").unwrap();
        let mut account = Account::new(&customer);
        if balance > rust_decimal::Decimal::ZERO {
            account.credit(balance).unwrap();
        }

        let scope = store.begin().await.unwrap();
        InMemoryAccountRepository::new(scope.clone())
            .save(&account)
            .await
            .unwrap();
        scope.commit().await.unwrap();
        account
    }

    #[tokio::test]
    async fn test_staged_writes_invisible_until_commit() {
        let store = InMemoryStore::new();
        let customer = Customer::new("Carol", "carol@example.com").unwrap();

        let scope = store.begin().await.unwrap();
        let customers = InMemoryCustomerRepository::new(scope.clone());
        assert_ok!(customers.save(&customer).await);

        // Visible inside the scope, not outside
        assert!(customers.get_by_id(customer.id()).await.unwrap().is_some());
        assert!(store.customer(customer.id()).await.is_none());

        scope.commit().await.unwrap();
        assert_eq!(store.customer(customer.id()).await, Some(customer));
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = InMemoryStore::new();
        let account = seed_account(&store, dec!(10)).await;

        let scope = store.begin().await.unwrap();
        let accounts = InMemoryAccountRepository::new(scope.clone());
        let mut loaded = accounts.get_by_id(account.id()).await.unwrap().unwrap();
        loaded.debit(dec!(4)).unwrap();
        accounts.update_balance(&loaded).await.unwrap();

        scope.rollback().await.unwrap();

        let stored = store.account(account.id()).await.unwrap();
        assert_eq!(stored.balance(), dec!(10));
        assert_eq!(stored.version(), 0);
    }

    #[tokio::test]
    async fn test_closed_scope_rejects_operations() {
        let store = InMemoryStore::new();
        let scope = store.begin().await.unwrap();
        scope.commit().await.unwrap();

        let accounts = InMemoryAccountRepository::new(scope.clone());
        let result = accounts.get_by_id(Uuid::new_v4()).await;
        assert!(matches!(result, Err(PersistenceError::ScopeClosed)));

        assert_err!(scope.commit().await);
        assert_ok!(scope.rollback().await);
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = InMemoryStore::new();
        let account = seed_account(&store, dec!(100)).await;

        let scope = store.begin().await.unwrap();
        let accounts = InMemoryAccountRepository::new(scope.clone());

        let mut loaded = accounts.get_by_id(account.id()).await.unwrap().unwrap();
        loaded.debit(dec!(10)).unwrap();
        accounts.update_balance(&loaded).await.unwrap();

        // A second update in the same scope sees the bumped version
        let mut reloaded = accounts.get_by_id(account.id()).await.unwrap().unwrap();
        assert_eq!(reloaded.version(), 1);
        reloaded.debit(dec!(10)).unwrap();
        accounts.update_balance(&reloaded).await.unwrap();

        scope.commit().await.unwrap();

        let stored = store.account(account.id()).await.unwrap();
        assert_eq!(stored.balance(), dec!(80));
        assert_eq!(stored.version(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_update_conflicts() {
        let store = InMemoryStore::new();
        let account = seed_account(&store, dec!(100)).await;

        let first = store.begin().await.unwrap();
        let second = store.begin().await.unwrap();

        let mut in_first = InMemoryAccountRepository::new(first.clone())
            .get_by_id(account.id())
            .await
            .unwrap()
            .unwrap();
        let mut in_second = InMemoryAccountRepository::new(second.clone())
            .get_by_id(account.id())
            .await
            .unwrap()
            .unwrap();

        in_first.debit(dec!(60)).unwrap();
        in_second.debit(dec!(60)).unwrap();
        InMemoryAccountRepository::new(first.clone())
            .update_balance(&in_first)
            .await
            .unwrap();
        InMemoryAccountRepository::new(second.clone())
            .update_balance(&in_second)
            .await
            .unwrap();

        first.commit().await.unwrap();
        let result = second.commit().await;
        assert!(matches!(
            result,
            Err(PersistenceError::ConcurrencyConflict { expected: 0, .. })
        ));

        let stored = store.account(account.id()).await.unwrap();
        assert_eq!(stored.balance(), dec!(40));
    }

    #[tokio::test]
    async fn test_transaction_record_round_trip() {
        let store = InMemoryStore::new();
        let mut from = seed_account(&store, dec!(30)).await;
        let mut to = seed_account(&store, dec!(0)).await;
        let record = crate::domain::Transaction::between(&mut from, &mut to, dec!(12.5))
            .unwrap()
            .record();

        let scope = store.begin().await.unwrap();
        let transactions = InMemoryTransactionRepository::new(scope.clone());
        assert_ok!(transactions.save(&record).await);
        assert_eq!(transactions.get_by_id(record.id).await.unwrap(), Some(record.clone()));
        assert_eq!(transactions.get_by_id(Uuid::new_v4()).await.unwrap(), None);
        scope.commit().await.unwrap();

        let scope = store.begin().await.unwrap();
        let loaded = InMemoryTransactionRepository::new(scope.clone())
            .get_by_id(record.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.status, crate::domain::TransactionStatus::Completed);

        let duplicate = InMemoryTransactionRepository::new(scope.clone()).save(&record).await;
        assert!(matches!(duplicate, Err(PersistenceError::Duplicate { entity: "Transaction", .. })));
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryStore::new();
        let account = seed_account(&store, dec!(0)).await;

        let scope = store.begin().await.unwrap();
        let result = InMemoryAccountRepository::new(scope.clone()).save(&account).await;
        assert!(matches!(result, Err(PersistenceError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_update_missing_account() {
        let store = InMemoryStore::new();
        let customer = Customer::new("Dan", "dan@example.com").unwrap();
        let ghost = Account::new(&customer);

        let scope = store.begin().await.unwrap();
        let result = InMemoryAccountRepository::new(scope.clone())
            .update_balance(&ghost)
            .await;
        assert!(matches!(result, Err(PersistenceError::NotFound { .. })));
    }
}
