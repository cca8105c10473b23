//! Event Publisher module
//!
//! In-process pub/sub for domain events. Events are queued by `register` and only
//! delivered by `publish`, which callers invoke after the unit of work that produced
//! the events has committed.

mod dispatcher;

pub use dispatcher::{DispatcherError, EventDispatcher, TracingEventHandler};

use crate::domain::WalletEvent;

/// Queues events and flushes them to subscribers
pub trait EventPublisher: Send + Sync {
    /// Queue an event without delivering it. Returns the publisher for chaining.
    fn register(&self, event: WalletEvent) -> &Self
    where
        Self: Sized;

    /// Deliver every queued event in registration order, then clear the queue
    fn publish(&self);
}

/// Receives published events
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &WalletEvent);
}
