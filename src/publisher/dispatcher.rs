//! Event Dispatcher
//!
//! Default `EventPublisher`: handlers subscribe per event type; delivery is
//! synchronous, in registration order, at most once.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::domain::WalletEvent;

use super::{EventHandler, EventPublisher};

/// Dispatcher errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DispatcherError {
    #[error("Handler already registered for event type {0}")]
    HandlerAlreadyRegistered(String),
}

/// In-process event dispatcher
#[derive(Default)]
pub struct EventDispatcher {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    pending: Mutex<Vec<WalletEvent>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to events of `event_type`
    pub fn subscribe(
        &self,
        event_type: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), DispatcherError> {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let subscribed = handlers.entry(event_type.to_string()).or_default();

        if subscribed.iter().any(|existing| Arc::ptr_eq(existing, &handler)) {
            return Err(DispatcherError::HandlerAlreadyRegistered(event_type.to_string()));
        }

        subscribed.push(handler);
        Ok(())
    }

    /// Remove `handler` from `event_type`. Returns whether it was subscribed.
    pub fn unsubscribe(&self, event_type: &str, handler: &Arc<dyn EventHandler>) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let Some(subscribed) = handlers.get_mut(event_type) else {
            return false;
        };

        let before = subscribed.len();
        subscribed.retain(|existing| !Arc::ptr_eq(existing, handler));
        before != subscribed.len()
    }

    pub fn has_handler(&self, event_type: &str, handler: &Arc<dyn EventHandler>) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .is_some_and(|subscribed| subscribed.iter().any(|existing| Arc::ptr_eq(existing, handler)))
    }

    /// Drop every subscription
    pub fn clear_handlers(&self) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of events waiting for `publish`
    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn handlers_for(&self, event_type: &str) -> Vec<Arc<dyn EventHandler>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }
}

impl EventPublisher for EventDispatcher {
    fn register(&self, event: WalletEvent) -> &Self {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        self
    }

    fn publish(&self) {
        // Take the queue first so handlers may register follow-up events
        let events = std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner));
        if events.is_empty() {
            return;
        }

        for event in &events {
            let handlers = self.handlers_for(event.event_type());
            tracing::info!(
                event_type = event.event_type(),
                handlers = handlers.len(),
                "Publishing event"
            );

            for handler in handlers {
                let delivered = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event)));
                if delivered.is_err() {
                    tracing::error!(event_type = event.event_type(), "Event handler panicked");
                }
            }
        }
    }
}

/// Logs every event it receives
#[derive(Debug, Default)]
pub struct TracingEventHandler;

impl EventHandler for TracingEventHandler {
    fn handle(&self, event: &WalletEvent) {
        tracing::info!(
            event_type = event.event_type(),
            occurred_at = %event.occurred_at(),
            payload = %event.payload(),
            "Event delivered"
        );
    }
}
