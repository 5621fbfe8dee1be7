//! Command bus — dispatches each command to exactly one handler.

use std::any::TypeId;
use std::sync::Arc;

use herald_core::message::Command;

use crate::handler::{CommandAdapter, CommandHandler, HandlerMap};
use crate::pipeline::{DispatchResult, Middleware, Pipeline};

/// Dispatches commands through the configured middleware pipeline to the
/// handler registered for the command's runtime type.
#[derive(Default)]
pub struct CommandBus {
    handlers: HandlerMap<dyn Command>,
    pipeline: Pipeline<dyn Command>,
}

impl CommandBus {
    /// Creates a bus with no handlers and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to command type `C`. The last registration for a
    /// given command type wins.
    pub fn register<C, H>(&self, handler: H)
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        self.handlers
            .insert(TypeId::of::<C>(), Arc::new(CommandAdapter::new(handler)));
    }

    /// Appends a middleware to the pipeline. Order is significant and fixed
    /// at configuration time.
    pub fn add_middleware(&self, middleware: Arc<dyn Middleware<dyn Command>>) {
        self.pipeline.add(middleware);
    }

    /// Dispatches a command, resolving its handler and executing the
    /// pipeline with the handler invocation as terminal step.
    ///
    /// # Errors
    ///
    /// [`herald_core::error::AppError::HandlerMissing`] when no handler is
    /// registered for the command's type; otherwise whatever the pipeline
    /// or handler raises.
    pub async fn dispatch(&self, command: &dyn Command) -> DispatchResult {
        self.pipeline.execute(command, &self.handlers).await
    }
}
