//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::message::Message;

/// Metadata attached to every domain event.
///
/// `event_id` and `occurred_on` are assigned exactly once, when the metadata
/// is constructed. The fields are public for reading and serialization, but
/// [`EventMetadata::new`] is the only way to produce a value — events carry
/// the metadata by composition and never reassign it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Globally unique event identifier, generated at construction.
    pub event_id: Uuid,
    /// Identifier of the aggregate that produced the event.
    pub aggregate_id: String,
    /// Timestamp of event creation.
    pub occurred_on: DateTime<Utc>,
}

impl EventMetadata {
    /// Creates metadata for a new event, stamping it with a fresh id and
    /// the clock's current time.
    #[must_use]
    pub fn new(aggregate_id: impl Into<String>, clock: &dyn Clock) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id: aggregate_id.into(),
            occurred_on: clock.now(),
        }
    }
}

/// An immutable fact about something that happened to an aggregate,
/// published to zero or more listeners.
pub trait DomainEvent: Message {
    /// Stable string discriminator for serialization (e.g.
    /// `"users.user_was_created"`).
    fn event_name(&self) -> &'static str;

    /// The event's metadata.
    fn metadata(&self) -> &EventMetadata;

    /// Whether this event wants to be handled on a background queue instead
    /// of synchronously inside the publishing dispatch.
    fn prefers_async(&self) -> bool {
        false
    }

    /// Clones the event behind a fresh box, so it can be buffered or queued.
    fn clone_event(&self) -> Box<dyn DomainEvent>;
}
