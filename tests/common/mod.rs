//! Common test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use wallet_core::repository::in_memory::{
    self, InMemoryAccountRepository, InMemoryCustomerRepository, InMemoryScope,
    InMemoryTransactionRepository,
};
use wallet_core::repository::{
    AccountRepository, CustomerRepository, InMemoryStore, PersistenceError, TransactionRepository,
    TransactionScope, TransactionalResource, ACCOUNT_REPOSITORY, CUSTOMER_REPOSITORY,
    TRANSACTION_REPOSITORY,
};
use wallet_core::{Account, Customer, EventPublisher, UnitOfWork, WalletEvent};

/// Message returned by `FailingResource::begin`
pub const UNIT_OF_WORK_FAILURE: &str = "any error on unit of work";

/// In-memory store with every repository registered
pub fn setup_in_memory() -> (InMemoryStore, Arc<UnitOfWork<InMemoryStore>>) {
    let store = InMemoryStore::new();
    let unit_of_work = Arc::new(UnitOfWork::new(store.clone()));
    in_memory::register_repositories(&unit_of_work);
    (store, unit_of_work)
}

/// Commit a customer with one account holding `balance`
pub async fn seed_account(store: &InMemoryStore, balance: Decimal) -> Account {
    let customer = Customer::new("Test Customer", "customer@example.com").unwrap();
    let mut account = Account::new(&customer);
    if balance > Decimal::ZERO {
        account.credit(balance).unwrap();
    }

    let scope = store.begin().await.unwrap();
    InMemoryCustomerRepository::new(scope.clone())
        .save(&customer)
        .await
        .unwrap();
    InMemoryAccountRepository::new(scope.clone())
        .save(&account)
        .await
        .unwrap();
    scope.commit().await.unwrap();

    account
}

/// Publisher that records how it was called
#[derive(Default)]
pub struct RecordingPublisher {
    registered: Mutex<Vec<WalletEvent>>,
    published: Mutex<Vec<WalletEvent>>,
    publish_calls: AtomicUsize,
}

impl RecordingPublisher {
    pub fn registered(&self) -> Vec<WalletEvent> {
        self.registered.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<WalletEvent> {
        self.published.lock().unwrap().clone()
    }

    pub fn publish_calls(&self) -> usize {
        self.publish_calls.load(Ordering::SeqCst)
    }
}

impl EventPublisher for RecordingPublisher {
    fn register(&self, event: WalletEvent) -> &Self {
        self.registered.lock().unwrap().push(event);
        self
    }

    fn publish(&self) {
        self.publish_calls.fetch_add(1, Ordering::SeqCst);
        let registered = self.registered.lock().unwrap().clone();
        let mut published = self.published.lock().unwrap();
        let already = published.len();
        published.extend(registered.into_iter().skip(already));
    }
}

/// Wraps a resource and counts opened scopes
pub struct CountingResource<P> {
    inner: P,
    begins: AtomicUsize,
}

impl<P> CountingResource<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            begins: AtomicUsize::new(0),
        }
    }

    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<P: TransactionalResource> TransactionalResource for CountingResource<P> {
    type Scope = P::Scope;

    async fn begin(&self) -> Result<P::Scope, PersistenceError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        self.inner.begin().await
    }
}

/// Register the in-memory repositories on a unit of work over a counted store
pub fn register_counted(unit_of_work: &UnitOfWork<CountingResource<InMemoryStore>>) {
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

/// Resource whose scopes can never be opened
pub struct FailingResource;

#[async_trait]
impl TransactionalResource for FailingResource {
    type Scope = InMemoryScope;

    async fn begin(&self) -> Result<InMemoryScope, PersistenceError> {
        Err(PersistenceError::Backend(UNIT_OF_WORK_FAILURE.to_string()))
    }
}
