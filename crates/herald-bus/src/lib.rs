//! Herald Bus — message buses and their middleware pipelines.
//!
//! Three specialized buses share one dispatch mechanism: a registry of
//! message-type → handler bindings and an ordered middleware pipeline that
//! wraps the terminal handler invocation. Commands and queries resolve to
//! exactly one handler; events fan out to zero or more listeners.

pub mod command_bus;
pub mod event_bus;
mod handler;
pub mod pipeline;
pub mod registry;
pub mod query_bus;

pub use command_bus::CommandBus;
pub use event_bus::EventBus;
pub use handler::{CommandHandler, EventHandler, QueryHandler};
pub use pipeline::{BoxFuture, DispatchResult, DispatchValue, Middleware, Next, Pipeline, Terminal, value_as};
pub use query_bus::QueryBus;
pub use registry::{ContextModule, install_modules};
