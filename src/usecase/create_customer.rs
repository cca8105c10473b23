//! CreateCustomer use case

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Customer, WorkContext};
use crate::error::{WalletError, WalletResult};
use crate::repository::{CustomerRepository, TransactionalResource, CUSTOMER_REPOSITORY};
use crate::unit_of_work::UnitOfWork;

use super::CreateCustomerCommand;

/// Use case for registering customers
pub struct CreateCustomerUseCase<P: TransactionalResource> {
    unit_of_work: Arc<UnitOfWork<P>>,
}

impl<P: TransactionalResource> CreateCustomerUseCase<P> {
    pub fn new(unit_of_work: Arc<UnitOfWork<P>>) -> Self {
        Self { unit_of_work }
    }

    /// Validate and store a new customer, returning its ID
    #[tracing::instrument(skip(self, ctx), fields(correlation_id = ?ctx.correlation_id()))]
    pub async fn execute(&self, ctx: &WorkContext, command: CreateCustomerCommand) -> WalletResult<Uuid> {
        let customer = Customer::new(command.name, command.email)?;

        let customer_id = self
            .unit_of_work
            .run(ctx, |scope| async move {
                let customers: Arc<dyn CustomerRepository> = scope.get_repository(CUSTOMER_REPOSITORY)?;
                customers.save(&customer).await?;
                Ok::<_, WalletError>(customer.id())
            })
            .await?;

        tracing::info!(customer_id = %customer_id, "Customer created");
        Ok(customer_id)
    }
}
