//! Scope Handle
//!
//! What the work closure receives: the open scope plus the repository factories
//! that were registered when the scope was opened.

use std::any::{self, Any};
use std::collections::HashMap;
use std::sync::Arc;

use crate::repository::TransactionScope;

use super::UnitOfWorkError;

/// Builds a repository bound to a scope
pub(crate) type RepositoryFactory<S> = Arc<dyn Fn(&S) -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// Handle to one open unit-of-work scope
#[derive(Clone)]
pub struct ScopeHandle<S> {
    scope: S,
    factories: Arc<HashMap<String, RepositoryFactory<S>>>,
}

impl<S: TransactionScope> ScopeHandle<S> {
    pub(crate) fn new(scope: S, factories: Arc<HashMap<String, RepositoryFactory<S>>>) -> Self {
        Self { scope, factories }
    }

    /// Resolve the repository registered under `name`, bound to this scope.
    ///
    /// `R` must be exactly the type the factory returns, e.g.
    /// `Arc<dyn AccountRepository>`.
    pub fn get_repository<R: 'static>(&self, name: &str) -> Result<R, UnitOfWorkError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| UnitOfWorkError::RepositoryNotRegistered(name.to_string()))?;

        tracing::debug!(repository = name, "Resolving repository");

        factory(&self.scope)
            .downcast::<R>()
            .map(|repository| *repository)
            .map_err(|_| UnitOfWorkError::RepositoryTypeMismatch {
                name: name.to_string(),
                expected: any::type_name::<R>(),
            })
    }
}
