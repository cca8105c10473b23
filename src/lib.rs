//! wallet_core Library
//!
//! Double-entry wallet ledger: accounts and transfers persisted through a unit of
//! work, with `TransactionCreated` events published after commit.

pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod publisher;
pub mod repository;
pub mod unit_of_work;
pub mod usecase;

pub use config::{Config, ConfigError, LogFormat};
pub use domain::{Account, Customer, DomainError, Transaction, TransactionStatus, WalletEvent, WorkContext};
pub use error::{ErrorKind, WalletError, WalletResult};
pub use publisher::{EventDispatcher, EventHandler, EventPublisher};
pub use unit_of_work::{UnitOfWork, UnitOfWorkError};
