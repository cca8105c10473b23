//! CreateAccount use case

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Account, WorkContext};
use crate::error::{WalletError, WalletResult};
use crate::repository::{
    AccountRepository, CustomerRepository, TransactionalResource, ACCOUNT_REPOSITORY,
    CUSTOMER_REPOSITORY,
};
use crate::unit_of_work::UnitOfWork;

use super::CreateAccountCommand;

/// Use case for opening accounts
pub struct CreateAccountUseCase<P: TransactionalResource> {
    unit_of_work: Arc<UnitOfWork<P>>,
}

impl<P: TransactionalResource> CreateAccountUseCase<P> {
    pub fn new(unit_of_work: Arc<UnitOfWork<P>>) -> Self {
        Self { unit_of_work }
    }

    /// Open a zero-balance account for an existing customer, returning its ID
    #[tracing::instrument(skip(self, ctx), fields(correlation_id = ?ctx.correlation_id()))]
    pub async fn execute(&self, ctx: &WorkContext, command: CreateAccountCommand) -> WalletResult<Uuid> {
        let customer_id = command.customer_id;

        let account_id = self
            .unit_of_work
            .run(ctx, |scope| async move {
                let customers: Arc<dyn CustomerRepository> = scope.get_repository(CUSTOMER_REPOSITORY)?;
                let accounts: Arc<dyn AccountRepository> = scope.get_repository(ACCOUNT_REPOSITORY)?;

                let customer = customers
                    .get_by_id(customer_id)
                    .await?
                    .ok_or(WalletError::CustomerNotFound(customer_id))?;

                let account = Account::new(&customer);
                accounts.save(&account).await?;

                Ok::<_, WalletError>(account.id())
            })
            .await?;

        tracing::info!(account_id = %account_id, customer_id = %customer_id, "Account created");
        Ok(account_id)
    }
}
