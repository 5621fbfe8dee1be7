//! Startup wiring of the Users context.

use std::sync::Arc;

use herald_bus::{CommandBus, ContextModule, EventBus, QueryBus};
use herald_core::clock::Clock;

use crate::application::command_handlers::CreateUserHandler;
use crate::application::projector::UserDirectoryProjector;
use crate::application::query_handlers::GetUsersHandler;
use crate::domain::commands::CreateUser;
use crate::domain::events::UserWasCreated;
use crate::domain::queries::GetUsers;
use crate::domain::repository::UserRepository;

/// Registers the Users context on the three buses.
pub struct UsersModule {
    repository: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    projector: UserDirectoryProjector,
}

impl UsersModule {
    /// Creates the module over its collaborators.
    #[must_use]
    pub fn new(
        repository: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        projector: UserDirectoryProjector,
    ) -> Self {
        Self {
            repository,
            clock,
            projector,
        }
    }
}

impl ContextModule for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    fn register_command_handlers(&self, bus: &CommandBus) {
        bus.register::<CreateUser, _>(CreateUserHandler::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.clock),
        ));
    }

    fn register_query_handlers(&self, bus: &QueryBus) {
        bus.register::<GetUsers, _>(GetUsersHandler::new(Arc::clone(&self.repository)));
    }

    fn register_event_listeners(&self, bus: &EventBus) {
        bus.listen::<UserWasCreated, _>(self.projector.clone());
    }
}
