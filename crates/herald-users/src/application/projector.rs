//! Read-model projection of the Users context.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use herald_bus::EventHandler;
use herald_core::error::AppError;
use uuid::Uuid;

use crate::domain::events::UserWasCreated;

/// One line of the user directory read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// The user's id.
    pub user_id: Uuid,
    /// Email address.
    pub email: String,
    /// Display name, when one was given.
    pub name: Option<String>,
}

/// Maintains an in-memory user directory from [`UserWasCreated`] events.
///
/// Clones share the same directory, so the composition root can keep one
/// handle for reads while the Event Bus owns another as listener.
#[derive(Clone, Default)]
pub struct UserDirectoryProjector {
    entries: Arc<Mutex<Vec<DirectoryEntry>>>,
}

impl UserDirectoryProjector {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the directory, in projection order.
    #[must_use]
    pub fn entries(&self) -> Vec<DirectoryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EventHandler<UserWasCreated> for UserDirectoryProjector {
    async fn handle(&self, event: &UserWasCreated) -> Result<(), AppError> {
        let user_id = event
            .metadata
            .aggregate_id
            .parse()
            .map_err(|_| AppError::Internal(format!(
                "user event carries a non-uuid aggregate id: {}",
                event.metadata.aggregate_id,
            )))?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DirectoryEntry {
                user_id,
                email: event.email.clone(),
                name: event.name.clone(),
            });
        Ok(())
    }
}
