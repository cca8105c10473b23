//! Use case module
//!
//! Application operations. Each one runs its repository work inside a single unit
//! of work so it either fully commits or leaves storage untouched.

mod commands;
mod create_account;
mod create_customer;
mod create_transaction;


pub use commands::*;
pub use create_account::CreateAccountUseCase;
pub use create_customer::CreateCustomerUseCase;
pub use create_transaction::CreateTransactionUseCase;
