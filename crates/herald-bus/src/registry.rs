//! Startup registration of bounded-context handlers.
//!
//! Discovery is static and explicit: each bounded context implements
//! [`ContextModule`] and contributes its handlers once, at startup. There is
//! no runtime scanning — a module that forgets to register a handler shows
//! up as a `HandlerMissing` dispatch error, not as silent behavior.

use crate::command_bus::CommandBus;
use crate::event_bus::EventBus;
use crate::query_bus::QueryBus;

/// A bounded context that contributes handlers and listeners at startup.
pub trait ContextModule: Send + Sync {
    /// The module's name, for startup logging.
    fn name(&self) -> &'static str;

    /// Registers the module's command handlers.
    fn register_command_handlers(&self, _bus: &CommandBus) {}

    /// Registers the module's query handlers.
    fn register_query_handlers(&self, _bus: &QueryBus) {}

    /// Registers the module's event handlers and listeners.
    fn register_event_listeners(&self, _bus: &EventBus) {}
}

/// Walks `modules` once and installs every handler on the three buses.
pub fn install_modules(
    modules: &[&dyn ContextModule],
    commands: &CommandBus,
    queries: &QueryBus,
    events: &EventBus,
) {
    for module in modules {
        module.register_command_handlers(commands);
        module.register_query_handlers(queries);
        module.register_event_listeners(events);
        tracing::info!(module = module.name(), "context module installed");
    }
}
