//! Event bus — publishes domain events to zero or more listeners.
//!
//! Events resolve to an optional primary handler plus an ordered list of
//! additional listeners (the fan-out mechanism). Publishing an event nobody
//! subscribed to is a no-op, not an error.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use herald_core::error::AppError;
use herald_core::event::DomainEvent;

use crate::handler::{ErasedHandler, EventAdapter, EventHandler};
use crate::pipeline::{DispatchResult, Middleware, Pipeline, Terminal};

/// Primary handler binding plus listener fan-out, keyed by event type.
#[derive(Default)]
struct DispatchTable {
    primary: RwLock<HashMap<TypeId, Arc<dyn ErasedHandler<dyn DomainEvent>>>>,
    listeners: RwLock<HashMap<TypeId, Vec<Arc<dyn ErasedHandler<dyn DomainEvent>>>>>,
}

#[async_trait]
impl Terminal<dyn DomainEvent> for DispatchTable {
    async fn call(&self, event: &dyn DomainEvent) -> DispatchResult {
        let key = event.as_any().type_id();

        let primary = self
            .primary
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .unwrap_or_default();

        if let Some(handler) = primary {
            handler.invoke(event).await?;
        }
        for listener in listeners {
            listener.invoke(event).await?;
        }
        Ok(None)
    }
}

/// Publishes domain events through the configured middleware pipeline to the
/// handler and listeners registered for the event's runtime type.
#[derive(Default)]
pub struct EventBus {
    table: DispatchTable,
    pipeline: Pipeline<dyn DomainEvent>,
}

impl EventBus {
    /// Creates a bus with no subscriptions and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the primary handler for event type `E`. The last registration
    /// wins.
    pub fn register<E, H>(&self, handler: H)
    where
        E: DomainEvent,
        H: EventHandler<E> + 'static,
    {
        self.table
            .primary
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<E>(), Arc::new(EventAdapter::new(handler)));
    }

    /// Subscribes an additional listener for event type `E`. Listeners run
    /// after the primary handler, in subscription order.
    pub fn listen<E, H>(&self, listener: H)
    where
        E: DomainEvent,
        H: EventHandler<E> + 'static,
    {
        self.table
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Arc::new(EventAdapter::new(listener)));
    }

    /// Appends a middleware to the pipeline. Order is significant and fixed
    /// at configuration time.
    pub fn add_middleware(&self, middleware: Arc<dyn Middleware<dyn DomainEvent>>) {
        self.pipeline.add(middleware);
    }

    /// Publishes one event through the full pipeline.
    ///
    /// # Errors
    ///
    /// Whatever the pipeline, handler, or a listener raises. An event with
    /// no subscriptions publishes successfully.
    pub async fn publish(&self, event: &dyn DomainEvent) -> Result<(), AppError> {
        self.pipeline.execute(event, &self.table).await.map(|_| ())
    }

    /// Publishes `events` in order, each through the full per-event pipeline
    /// and handler resolution independently.
    ///
    /// # Errors
    ///
    /// The first failing publish aborts the remainder; previously published
    /// events stay published — there is no atomicity across events.
    pub async fn publish_all(&self, events: &[Arc<dyn DomainEvent>]) -> Result<(), AppError> {
        for event in events {
            self.publish(event.as_ref()).await?;
        }
        Ok(())
    }
}
