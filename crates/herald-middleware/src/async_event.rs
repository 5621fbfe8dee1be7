//! Background off-loading of async-preferring events.

use std::sync::Arc;

use async_trait::async_trait;
use herald_bus::{DispatchResult, Middleware, Next};
use herald_core::event::DomainEvent;

use crate::queue::JobQueue;

/// Diverts events that prefer background handling onto the job queue.
///
/// First pass: an event with `prefers_async()` is cloned onto the queue and
/// the publish short-circuits with `Ok(None)` — its listeners have not run
/// yet. Second pass: when the queue's worker republishes, the queue reports
/// the event as a redelivery and the middleware lets it through to the
/// listeners. Synchronous events pass through on every publish.
pub struct AsyncEventMiddleware {
    queue: Arc<dyn JobQueue>,
}

impl AsyncEventMiddleware {
    /// Creates the middleware over a job queue.
    #[must_use]
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl Middleware<dyn DomainEvent> for AsyncEventMiddleware {
    async fn handle(
        &self,
        event: &dyn DomainEvent,
        next: Next<'_, dyn DomainEvent>,
    ) -> DispatchResult {
        if event.prefers_async() && !self.queue.is_redelivering(event.metadata().event_id) {
            self.queue.enqueue(event.clone_event()).await?;
            tracing::debug!(
                event = event.event_name(),
                event_id = %event.metadata().event_id,
                "event handed to background queue",
            );
            return Ok(None);
        }
        next.run().await
    }
}
