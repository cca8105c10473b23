//! CreateTransaction use case
//!
//! Transfers funds between two accounts inside one unit of work and announces the
//! result with a `TransactionCreated` event once the scope has committed.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Account, Transaction, WalletEvent, WorkContext};
use crate::error::{WalletError, WalletResult};
use crate::publisher::EventPublisher;
use crate::repository::{
    AccountRepository, TransactionRepository, TransactionalResource, ACCOUNT_REPOSITORY,
    TRANSACTION_REPOSITORY,
};
use crate::unit_of_work::UnitOfWork;

use super::{CreateTransactionCommand, CreateTransactionOutput};

/// Use case for account-to-account transfers
pub struct CreateTransactionUseCase<P: TransactionalResource, E: EventPublisher> {
    unit_of_work: Arc<UnitOfWork<P>>,
    publisher: Arc<E>,
}

impl<P: TransactionalResource, E: EventPublisher> CreateTransactionUseCase<P, E> {
    pub fn new(unit_of_work: Arc<UnitOfWork<P>>, publisher: Arc<E>) -> Self {
        Self {
            unit_of_work,
            publisher,
        }
    }

    /// Execute the transfer.
    ///
    /// Nothing is persisted and no event is published unless every step succeeds.
    #[tracing::instrument(
        skip(self, ctx),
        fields(correlation_id = ?ctx.correlation_id())
    )]
    pub async fn execute(
        &self,
        ctx: &WorkContext,
        command: CreateTransactionCommand,
    ) -> WalletResult<CreateTransactionOutput> {
        let output = self
            .unit_of_work
            .run(ctx, |scope| async move {
                let accounts: Arc<dyn AccountRepository> = scope.get_repository(ACCOUNT_REPOSITORY)?;
                let transactions: Arc<dyn TransactionRepository> =
                    scope.get_repository(TRANSACTION_REPOSITORY)?;

                let (mut from_account, mut to_account) =
                    load_accounts(accounts.as_ref(), command.from_account_id, command.to_account_id).await?;

                let record = Transaction::between(&mut from_account, &mut to_account, command.amount)?.record();

                transactions.save(&record).await?;
                accounts.update_balance(&from_account).await?;
                accounts.update_balance(&to_account).await?;

                Ok::<_, WalletError>(CreateTransactionOutput {
                    transaction_id: record.id,
                    from_account_id: record.from_account_id,
                    to_account_id: record.to_account_id,
                    amount: record.amount,
                    from_balance: from_account.balance(),
                    to_balance: to_account.balance(),
                    status: record.status,
                    created_at: record.created_at,
                })
            })
            .await?;

        tracing::info!(
            transaction_id = %output.transaction_id,
            amount = %output.amount,
            "Transaction created"
        );

        self.publisher
            .register(WalletEvent::TransactionCreated {
                transaction_id: output.transaction_id,
                from_account_id: output.from_account_id,
                to_account_id: output.to_account_id,
                amount: output.amount,
                created_at: output.created_at,
            })
            .publish();

        Ok(output)
    }
}

/// Load both accounts in ascending id order.
///
/// Loading locks the rows; every transfer must take the locks in the same order.
async fn load_accounts(
    accounts: &dyn AccountRepository,
    from_account_id: Uuid,
    to_account_id: Uuid,
) -> WalletResult<(Account, Account)> {
    if from_account_id <= to_account_id {
        let from_account = load_account(accounts, from_account_id).await?;
        let to_account = load_account(accounts, to_account_id).await?;
        Ok((from_account, to_account))
    } else {
        let to_account = load_account(accounts, to_account_id).await?;
        let from_account = load_account(accounts, from_account_id).await?;
        Ok((from_account, to_account))
    }
}

async fn load_account(accounts: &dyn AccountRepository, id: Uuid) -> WalletResult<Account> {
    accounts
        .get_by_id(id)
        .await?
        .ok_or(WalletError::AccountNotFound(id))
}
