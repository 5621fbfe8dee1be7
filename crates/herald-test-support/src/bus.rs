//! Test bus doubles — recording middleware and listeners.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use herald_bus::{DispatchResult, EventHandler, Middleware, Next};
use herald_core::error::AppError;
use herald_core::event::DomainEvent;
use herald_core::message::Message;

/// A middleware that records the name of every message it sees, before and
/// after the rest of the chain, tagged with its label. Useful for asserting
/// pipeline order.
pub struct RecordingMiddleware {
    label: &'static str,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingMiddleware {
    /// Creates a labelled middleware appending to a shared call log.
    #[must_use]
    pub fn new(label: &'static str, calls: Arc<Mutex<Vec<String>>>) -> Self {
        Self { label, calls }
    }

    fn record(&self, phase: &str, message: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{phase}:{message}", self.label));
    }
}

#[async_trait]
impl<M: Message + ?Sized> Middleware<M> for RecordingMiddleware {
    async fn handle(&self, message: &M, next: Next<'_, M>) -> DispatchResult {
        self.record("before", message.message_name());
        let result = next.run().await;
        self.record("after", message.message_name());
        result
    }
}

/// An event listener that records the name of every event it receives.
pub struct RecordingListener {
    seen: Arc<Mutex<Vec<String>>>,
}

impl RecordingListener {
    /// Creates a listener appending to a shared log.
    #[must_use]
    pub fn new(seen: Arc<Mutex<Vec<String>>>) -> Self {
        Self { seen }
    }
}

#[async_trait]
impl<E: DomainEvent> EventHandler<E> for RecordingListener {
    async fn handle(&self, event: &E) -> Result<(), AppError> {
        self.seen.lock().unwrap().push(event.event_name().to_owned());
        Ok(())
    }
}
