//! Repository port of the Users context.

use async_trait::async_trait;
use herald_core::error::AppError;
use uuid::Uuid;

use super::aggregates::User;

/// Persistence port for [`User`] aggregates.
///
/// `save` owns the event hand-off: implementations persist the aggregate's
/// state and then drain its recorded events into the Unit of Work, so a
/// handler that saves never has to remember to forward events itself.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists the aggregate and forwards its recorded events.
    async fn save(&self, user: &mut User) -> Result<(), AppError>;

    /// Looks a user up by id.
    async fn find(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Looks a user up by exact email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Returns every user, in insertion order.
    async fn all(&self) -> Result<Vec<User>, AppError>;
}
