//! Background job queue for async-preferring events.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use herald_bus::EventBus;
use herald_core::error::AppError;
use herald_core::event::DomainEvent;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use uuid::Uuid;

/// Hands events to a background worker for later delivery.
///
/// Redelivery goes back through the same Event Bus, so the queue must also
/// answer whether a given event is currently a redelivery — the async event
/// middleware uses that to let the second pass reach the handlers instead of
/// enqueueing forever.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueues an event for background delivery.
    async fn enqueue(&self, event: Box<dyn DomainEvent>) -> Result<(), AppError>;

    /// Whether `event_id` is currently being redelivered by this queue's
    /// worker.
    fn is_redelivering(&self, event_id: Uuid) -> bool;
}

type Redeliveries = Arc<Mutex<HashSet<Uuid>>>;

/// In-process queue backed by an unbounded tokio channel.
///
/// Delivery is at-most-once: an event accepted before the worker stops may
/// never run, and a failed redelivery is logged, not retried. Deployments
/// needing stronger guarantees supply their own [`JobQueue`].
pub struct InProcessJobQueue {
    sender: UnboundedSender<Box<dyn DomainEvent>>,
    redelivering: Redeliveries,
}

impl InProcessJobQueue {
    /// Creates the queue and its worker half. Spawn the worker's
    /// [`JobWorker::run`] future on the runtime.
    #[must_use]
    pub fn new() -> (Arc<Self>, JobWorker) {
        let (sender, receiver) = unbounded_channel();
        let redelivering: Redeliveries = Arc::new(Mutex::new(HashSet::new()));
        let queue = Arc::new(Self {
            sender,
            redelivering: Arc::clone(&redelivering),
        });
        (queue, JobWorker {
            receiver,
            redelivering,
        })
    }
}

#[async_trait]
impl JobQueue for InProcessJobQueue {
    async fn enqueue(&self, event: Box<dyn DomainEvent>) -> Result<(), AppError> {
        self.sender
            .send(event)
            .map_err(|_| AppError::Infrastructure("job queue worker has shut down".to_owned()))
    }

    fn is_redelivering(&self, event_id: Uuid) -> bool {
        self.redelivering
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&event_id)
    }
}

/// Drains the in-process queue, republishing each event through the Event
/// Bus. Runs until every sender handle is dropped.
pub struct JobWorker {
    receiver: UnboundedReceiver<Box<dyn DomainEvent>>,
    redelivering: Redeliveries,
}

impl JobWorker {
    /// Consumes the worker and processes events until the queue closes.
    pub async fn run(mut self, bus: Arc<EventBus>) {
        while let Some(event) = self.receiver.recv().await {
            let event_id = event.metadata().event_id;
            self.redelivering
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(event_id);

            if let Err(error) = bus.publish(event.as_ref()).await {
                tracing::error!(
                    event = event.event_name(),
                    %event_id,
                    %error,
                    "background event delivery failed",
                );
            }

            self.redelivering
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&event_id);
        }
    }
}
