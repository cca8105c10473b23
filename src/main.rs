//! wallet-core - Wallet ledger command line
//!
//! Creates customers and accounts and transfers funds against a Postgres store.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use wallet_core::publisher::TracingEventHandler;
use wallet_core::repository::{postgres, PgResource};
use wallet_core::usecase::{
    CreateAccountCommand, CreateAccountUseCase, CreateCustomerCommand, CreateCustomerUseCase,
    CreateTransactionCommand, CreateTransactionUseCase,
};
use wallet_core::{db, Config, EventDispatcher, LogFormat, UnitOfWork, WalletEvent, WorkContext};

#[derive(Debug, Parser)]
#[command(name = "wallet-core", version, about = "Wallet ledger operations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a customer
    CreateCustomer {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Open a zero-balance account for a customer
    CreateAccount {
        #[arg(long)]
        customer_id: Uuid,
    },
    /// Move funds between two accounts
    Transfer {
        #[arg(long)]
        from: Uuid,
        #[arg(long)]
        to: Uuid,
        #[arg(long)]
        amount: Decimal,
    },
}

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wallet_core=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Context for one command: fresh correlation id, configured deadline, Ctrl+C cancels
fn command_context(config: &Config) -> WorkContext {
    let mut ctx = WorkContext::new().with_correlation_id(Uuid::new_v4());
    if let Some(timeout) = config.unit_of_work_timeout {
        ctx = ctx.with_timeout(timeout);
    }

    let cancellation = ctx.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, cancelling");
            cancellation.cancel();
        }
    });

    ctx
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(environment = %config.environment, "Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    db::verify_connection(&pool).await?;
    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    let unit_of_work = Arc::new(UnitOfWork::new(PgResource::new(pool.clone())));
    postgres::register_repositories(&unit_of_work);

    let dispatcher = Arc::new(EventDispatcher::new());
    dispatcher.subscribe(WalletEvent::TRANSACTION_CREATED, Arc::new(TracingEventHandler))?;

    let ctx = command_context(&config);
    let result = run_command(cli.command, &ctx, unit_of_work, dispatcher).await;

    pool.close().await;
    tracing::info!("Database connections closed");

    let output = result?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_command(
    command: Command,
    ctx: &WorkContext,
    unit_of_work: Arc<UnitOfWork<PgResource>>,
    dispatcher: Arc<EventDispatcher>,
) -> anyhow::Result<serde_json::Value> {
    let output = match command {
        Command::CreateCustomer { name, email } => {
            let customer_id = CreateCustomerUseCase::new(unit_of_work)
                .execute(ctx, CreateCustomerCommand::new(name, email))
                .await?;
            serde_json::json!({ "customer_id": customer_id })
        }
        Command::CreateAccount { customer_id } => {
            let account_id = CreateAccountUseCase::new(unit_of_work)
                .execute(ctx, CreateAccountCommand::new(customer_id))
                .await?;
            serde_json::json!({ "account_id": account_id, "customer_id": customer_id })
        }
        Command::Transfer { from, to, amount } => {
            let output = CreateTransactionUseCase::new(unit_of_work, dispatcher)
                .execute(ctx, CreateTransactionCommand::new(from, to, amount))
                .await?;
            serde_json::to_value(output)?
        }
    };

    Ok(output)
}
