//! Aggregate roots of the Users context.

use chrono::{DateTime, Utc};
use herald_core::aggregate::{AggregateRoot, EventRecorder};
use herald_core::clock::Clock;
use herald_core::event::EventMetadata;
use uuid::Uuid;

use super::events::UserWasCreated;

/// A user account.
#[derive(Debug)]
pub struct User {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Email address, unique across users.
    pub email: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Hash of the user's password. Never leaves the aggregate through an
    /// event or payload.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    recorder: EventRecorder,
}

impl User {
    /// Creates a new account and records [`UserWasCreated`].
    #[must_use]
    pub fn create(
        email: impl Into<String>,
        name: Option<String>,
        password_hash: impl Into<String>,
        clock: &dyn Clock,
    ) -> Self {
        let id = Uuid::new_v4();
        let email = email.into();
        let metadata = EventMetadata::new(id.to_string(), clock);
        let created_at = metadata.occurred_on;

        let mut user = Self {
            id,
            email: email.clone(),
            name: name.clone(),
            password_hash: password_hash.into(),
            created_at,
            recorder: EventRecorder::new(),
        };
        user.recorder.record(UserWasCreated {
            metadata,
            email,
            name,
        });
        user
    }

    /// Rebuilds an already-persisted account. Records nothing.
    #[must_use]
    pub fn rehydrate(
        id: Uuid,
        email: impl Into<String>,
        name: Option<String>,
        password_hash: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            name,
            password_hash: password_hash.into(),
            created_at,
            recorder: EventRecorder::new(),
        }
    }
}

impl AggregateRoot for User {
    fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    fn recorder_mut(&mut self) -> &mut EventRecorder {
        &mut self.recorder
    }
}
