//! Domain events of the Users context.

use std::any::Any;

use herald_core::event::{DomainEvent, EventMetadata};
use herald_core::message::Message;
use serde_json::Value;

/// A user account came into existence.
///
/// Carries the full public aggregate data so other contexts can react
/// without a query round-trip. The password hash never leaves the aggregate.
#[derive(Debug, Clone)]
pub struct UserWasCreated {
    /// Event metadata; `aggregate_id` is the user's id.
    pub metadata: EventMetadata,
    /// The new user's email address.
    pub email: String,
    /// The new user's display name, when one was given.
    pub name: Option<String>,
}

impl Message for UserWasCreated {
    fn message_name(&self) -> &'static str {
        "users.user_was_created"
    }

    fn to_payload(&self) -> Value {
        serde_json::json!({
            "user_id": self.metadata.aggregate_id,
            "email": self.email,
            "name": self.name,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DomainEvent for UserWasCreated {
    fn event_name(&self) -> &'static str {
        "users.user_was_created"
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn clone_event(&self) -> Box<dyn DomainEvent> {
        Box::new(self.clone())
    }
}
