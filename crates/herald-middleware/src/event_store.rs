//! Append-only event persistence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_bus::{DispatchResult, Middleware, Next};
use herald_core::error::AppError;
use herald_core::event::DomainEvent;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// One persisted event row.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEvent {
    /// The event's unique id.
    pub event_id: Uuid,
    /// The aggregate the event belongs to.
    pub aggregate_id: String,
    /// Stable event discriminator.
    pub event_name: String,
    /// The event's payload projection.
    pub payload: Value,
    /// When the event occurred.
    pub occurred_on: DateTime<Utc>,
}

impl StoredEvent {
    /// Projects a domain event into its persisted form.
    #[must_use]
    pub fn from_event(event: &dyn DomainEvent) -> Self {
        let metadata = event.metadata();
        Self {
            event_id: metadata.event_id,
            aggregate_id: metadata.aggregate_id.clone(),
            event_name: event.event_name().to_owned(),
            payload: event.to_payload(),
            occurred_on: metadata.occurred_on,
        }
    }
}

/// Append-only event log persistence.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends one event row.
    async fn append(&self, event: StoredEvent) -> Result<(), AppError>;
}

/// Appends every published event to the event store before the listeners
/// run. The log is independent of the Unit of Work's buffer: by the time an
/// event reaches this middleware its transaction has already committed (or
/// it never had one).
///
/// A failing append fails the publish — an event that cannot be recorded is
/// not delivered.
pub struct EventStoreMiddleware {
    store: Arc<dyn EventStore>,
}

impl EventStoreMiddleware {
    /// Creates the middleware over an event store.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Middleware<dyn DomainEvent> for EventStoreMiddleware {
    async fn handle(
        &self,
        event: &dyn DomainEvent,
        next: Next<'_, dyn DomainEvent>,
    ) -> DispatchResult {
        self.store.append(StoredEvent::from_event(event)).await?;
        next.run().await
    }
}
