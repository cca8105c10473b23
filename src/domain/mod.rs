//! Domain module
//!
//! Core entities and business rules.

pub mod account;
pub mod context;
pub mod customer;
pub mod error;
pub mod events;
pub mod transaction;

pub use account::Account;
pub use context::WorkContext;
pub use customer::Customer;
pub use error::DomainError;
pub use events::WalletEvent;
pub use transaction::{Transaction, TransactionRecord, TransactionStatus};
