//! Unit of Work
//!
//! Groups repository operations into one atomic scope. `run` guarantees the scope
//! is finalized on every exit path: commit on success, rollback on error, panic,
//! cancellation or timeout.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures::FutureExt;

use crate::domain::WorkContext;
use crate::repository::{TransactionScope, TransactionalResource};

use super::handle::RepositoryFactory;
use super::{ScopeHandle, UnitOfWorkError};

/// How the work inside a scope ended
enum Outcome<T, E> {
    Finished(Result<T, E>),
    Interrupted(UnitOfWorkError),
}

/// Unit of Work over a transactional resource
///
/// Holds named repository factories. Each `run` call opens an independent scope,
/// so one `UnitOfWork` can be shared (e.g. behind an `Arc`) by concurrent callers.
pub struct UnitOfWork<P: TransactionalResource> {
    resource: P,
    factories: RwLock<HashMap<String, RepositoryFactory<P::Scope>>>,
}

impl<P: TransactionalResource> UnitOfWork<P> {
    pub fn new(resource: P) -> Self {
        Self {
            resource,
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// The resource scopes are opened on
    pub fn resource(&self) -> &P {
        &self.resource
    }

    /// Register a repository factory under `name`, replacing any previous one
    pub fn add<R, F>(&self, name: impl Into<String>, factory: F)
    where
        R: Send + Sync + 'static,
        F: Fn(&P::Scope) -> R + Send + Sync + 'static,
    {
        let factory: RepositoryFactory<P::Scope> =
            Arc::new(move |scope: &P::Scope| Box::new(factory(scope)) as Box<dyn Any + Send + Sync>);

        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Deregister a repository factory. Returns whether one was registered.
    pub fn remove(&self, name: &str) -> bool {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    fn snapshot(&self) -> Arc<HashMap<String, RepositoryFactory<P::Scope>>> {
        Arc::new(
            self.factories
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        )
    }

    /// Run `work` inside a fresh scope.
    ///
    /// Commits when `work` returns `Ok`. Rolls back and returns the error when
    /// `work` fails, and rolls back with `Panicked`, `Cancelled` or `TimedOut`
    /// when it panics or the context stops it.
    #[tracing::instrument(skip_all, fields(correlation_id = ?ctx.correlation_id()))]
    pub async fn run<T, E, F, Fut>(&self, ctx: &WorkContext, work: F) -> Result<T, E>
    where
        F: FnOnce(ScopeHandle<P::Scope>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<UnitOfWorkError>,
    {
        if ctx.is_cancelled() {
            return Err(UnitOfWorkError::Cancelled.into());
        }

        let scope = self.resource.begin().await.map_err(UnitOfWorkError::from)?;
        let handle = ScopeHandle::new(scope.clone(), self.snapshot());
        tracing::debug!("Unit of work scope opened");

        let outcome = match panic::catch_unwind(AssertUnwindSafe(move || work(handle))) {
            Ok(future) => drive(ctx, future).await,
            Err(payload) => Outcome::Interrupted(UnitOfWorkError::Panicked(panic_message(
                payload.as_ref(),
            ))),
        };

        match outcome {
            Outcome::Finished(Ok(value)) => {
                commit_or_rollback(&scope).await?;
                tracing::info!("Unit of work committed");
                Ok(value)
            }
            Outcome::Finished(Err(err)) => {
                tracing::warn!("Unit of work failed, rolling back");
                release(&scope).await;
                Err(err)
            }
            Outcome::Interrupted(err) => {
                tracing::warn!(error = %err, "Unit of work interrupted, rolling back");
                release(&scope).await;
                Err(err.into())
            }
        }
    }
}

/// Poll the work until it finishes, panics, or the context stops it
async fn drive<T, E, Fut>(ctx: &WorkContext, work: Fut) -> Outcome<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    let deadline = async {
        match ctx.timeout() {
            Some(timeout) => {
                tokio::time::sleep(timeout).await;
                timeout
            }
            None => std::future::pending::<Duration>().await,
        }
    };

    tokio::select! {
        result = AssertUnwindSafe(work).catch_unwind() => match result {
            Ok(result) => Outcome::Finished(result),
            Err(payload) => Outcome::Interrupted(UnitOfWorkError::Panicked(panic_message(payload.as_ref()))),
        },
        _ = ctx.cancellation().cancelled() => Outcome::Interrupted(UnitOfWorkError::Cancelled),
        timeout = deadline => Outcome::Interrupted(UnitOfWorkError::TimedOut(timeout)),
    }
}

/// Commit the scope; if the commit fails, roll back and return the commit error
pub(crate) async fn commit_or_rollback<S: TransactionScope>(scope: &S) -> Result<(), UnitOfWorkError> {
    if let Err(err) = scope.commit().await {
        tracing::warn!(error = %err, "Commit failed, rolling back");
        release(scope).await;
        return Err(err.into());
    }
    Ok(())
}

/// Roll back the scope
pub(crate) async fn rollback<S: TransactionScope>(scope: &S) -> Result<(), UnitOfWorkError> {
    scope.rollback().await?;
    tracing::info!("Unit of work rolled back");
    Ok(())
}

/// Roll back on an error path; a failing rollback is logged, never surfaced
async fn release<S: TransactionScope>(scope: &S) {
    if let Err(err) = rollback(scope).await {
        tracing::error!(error = %err, "Rollback failed");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
