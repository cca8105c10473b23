//! Repository module
//!
//! Persistence contracts consumed by the use cases, and the transactional
//! resources (Postgres, in-memory) that back a unit of work.

mod error;
pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, Customer, TransactionRecord};

pub use error::PersistenceError;
pub use in_memory::InMemoryStore;
pub use postgres::PgResource;

/// Registration name of the account repository
pub const ACCOUNT_REPOSITORY: &str = "AccountRepository";

/// Registration name of the transaction repository
pub const TRANSACTION_REPOSITORY: &str = "TransactionRepository";

/// Registration name of the customer repository
pub const CUSTOMER_REPOSITORY: &str = "CustomerRepository";

/// Account persistence
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account
    async fn save(&self, account: &Account) -> Result<(), PersistenceError>;

    /// Load an account, locking it for the rest of the scope where supported
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, PersistenceError>;

    /// Store the account's balance if its version still matches storage
    async fn update_balance(&self, account: &Account) -> Result<(), PersistenceError>;
}

/// Transaction persistence
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn save(&self, transaction: &TransactionRecord) -> Result<(), PersistenceError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<TransactionRecord>, PersistenceError>;
}

/// Customer persistence
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn save(&self, customer: &Customer) -> Result<(), PersistenceError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Customer>, PersistenceError>;
}

/// A store that can open atomic scopes
#[async_trait]
pub trait TransactionalResource: Send + Sync + 'static {
    type Scope: TransactionScope;

    /// Open a new scope; every repository bound to it shares one atomic commit
    async fn begin(&self) -> Result<Self::Scope, PersistenceError>;
}

/// One open atomic scope
///
/// Clones share the same underlying scope. After `commit` or `rollback` the scope
/// is closed and repository calls on it fail with `PersistenceError::ScopeClosed`.
#[async_trait]
pub trait TransactionScope: Clone + Send + Sync + 'static {
    async fn commit(&self) -> Result<(), PersistenceError>;

    /// Discard the scope's work. Rolling back a closed scope is a no-op.
    async fn rollback(&self) -> Result<(), PersistenceError>;
}
