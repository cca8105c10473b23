//! Unit of Work module
//!
//! Binds repository operations to one atomic commit/rollback boundary.
//!
//! ```ignore
//! let output = unit_of_work
//!     .run(&ctx, |scope| async move {
//!         let accounts: Arc<dyn AccountRepository> = scope.get_repository(ACCOUNT_REPOSITORY)?;
//!         // ... load, mutate, save ...
//!         Ok::<_, WalletError>(output)
//!     })
//!     .await?;
//! ```

mod error;
mod handle;
mod runner;

pub use error::UnitOfWorkError;
pub use handle::ScopeHandle;
pub use runner::UnitOfWork;
