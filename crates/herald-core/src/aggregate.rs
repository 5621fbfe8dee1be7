//! Aggregate root abstraction.
//!
//! Aggregates record domain events as a side effect of state changes. The
//! recorder is a plain value held by composition — concrete aggregates embed
//! an [`EventRecorder`] field rather than inheriting shared state.

use std::sync::Arc;

use crate::event::DomainEvent;

/// Ordered buffer of not-yet-dispatched domain events.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<Arc<dyn DomainEvent>>,
}

impl EventRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the buffer.
    pub fn record<E: DomainEvent>(&mut self, event: E) {
        self.events.push(Arc::new(event));
    }

    /// Atomically drains the buffer, returning the recorded events in order.
    pub fn drain(&mut self) -> Vec<Arc<dyn DomainEvent>> {
        std::mem::take(&mut self.events)
    }

    /// Discards all recorded events without returning them.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Trait for consistency-boundary entities that record domain events.
pub trait AggregateRoot: Send + Sync {
    /// The aggregate's event recorder.
    fn recorder(&self) -> &EventRecorder;

    /// The aggregate's event recorder, mutably.
    fn recorder_mut(&mut self) -> &mut EventRecorder;

    /// Drains and returns the recorded events in order.
    fn pull_domain_events(&mut self) -> Vec<Arc<dyn DomainEvent>> {
        self.recorder_mut().drain()
    }

    /// Discards recorded events without returning them.
    fn clear_domain_events(&mut self) {
        self.recorder_mut().clear();
    }

    /// Whether the aggregate has events pending dispatch.
    fn has_domain_events(&self) -> bool {
        !self.recorder().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::clock::Clock;
    use crate::event::EventMetadata;
    use crate::message::Message;

    #[derive(Debug, Clone)]
    struct Pinged {
        metadata: EventMetadata,
        value: u32,
    }

    impl Message for Pinged {
        fn message_name(&self) -> &'static str {
            "test.pinged"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::json!({ "value": self.value })
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    impl DomainEvent for Pinged {
        fn event_name(&self) -> &'static str {
            "test.pinged"
        }

        fn metadata(&self) -> &EventMetadata {
            &self.metadata
        }

        fn clone_event(&self) -> Box<dyn DomainEvent> {
            Box::new(self.clone())
        }
    }

    struct TestClock;

    impl Clock for TestClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            Utc::now()
        }
    }

    fn pinged(value: u32) -> Pinged {
        Pinged {
            metadata: EventMetadata::new("agg-1", &TestClock),
            value,
        }
    }

    #[test]
    fn test_drain_returns_events_in_recording_order_and_empties_recorder() {
        let mut recorder = EventRecorder::new();
        recorder.record(pinged(1));
        recorder.record(pinged(2));

        let drained = recorder.drain();

        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].to_payload()["value"], 1);
        assert_eq!(drained[1].to_payload()["value"], 2);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_clear_discards_events() {
        let mut recorder = EventRecorder::new();
        recorder.record(pinged(1));

        recorder.clear();

        assert!(recorder.is_empty());
        assert!(recorder.drain().is_empty());
    }

    #[test]
    fn test_metadata_is_stamped_once_at_construction() {
        let event = pinged(7);
        let before = event.metadata().event_id;
        let when = event.metadata().occurred_on;

        // Reading the metadata never reassigns it.
        assert_eq!(event.metadata().event_id, before);
        assert_eq!(event.metadata().occurred_on, when);
    }
}
