//! Query bus — answers each query through exactly one handler.

use std::any::TypeId;
use std::sync::Arc;

use herald_core::error::AppError;
use herald_core::message::Query;

use crate::handler::{HandlerMap, QueryAdapter, QueryHandler};
use crate::pipeline::{DispatchResult, Middleware, Pipeline, value_as};

/// Dispatches queries through the configured middleware pipeline to the
/// handler registered for the query's runtime type.
#[derive(Default)]
pub struct QueryBus {
    handlers: HandlerMap<dyn Query>,
    pipeline: Pipeline<dyn Query>,
}

impl QueryBus {
    /// Creates a bus with no handlers and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to query type `Q`. The last registration for a given
    /// query type wins.
    pub fn register<Q, H>(&self, handler: H)
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        self.handlers
            .insert(TypeId::of::<Q>(), Arc::new(QueryAdapter::new(handler)));
    }

    /// Appends a middleware to the pipeline. Order is significant and fixed
    /// at configuration time.
    pub fn add_middleware(&self, middleware: Arc<dyn Middleware<dyn Query>>) {
        self.pipeline.add(middleware);
    }

    /// Asks a query, returning the handler's result type-erased.
    ///
    /// # Errors
    ///
    /// [`AppError::HandlerMissing`] when no handler is registered for the
    /// query's type; otherwise whatever the pipeline or handler raises.
    pub async fn ask(&self, query: &dyn Query) -> DispatchResult {
        self.pipeline.execute(query, &self.handlers).await
    }

    /// Asks a query and recovers the result as `R`, the output type the
    /// registered handler declared.
    ///
    /// # Errors
    ///
    /// Everything [`QueryBus::ask`] raises, plus
    /// [`AppError::Internal`] when the produced result is not an `R`.
    pub async fn ask_as<R: Send + Sync + 'static>(
        &self,
        query: &dyn Query,
    ) -> Result<Arc<R>, AppError> {
        let value = self.ask(query).await?;
        value_as::<R>(&value).ok_or_else(|| {
            AppError::Internal(format!(
                "query {} did not produce a result of the requested type",
                query.message_name(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use async_trait::async_trait;
    use herald_core::message::Message;

    use super::*;

    #[derive(Debug)]
    struct CountWidgets {
        color: &'static str,
    }

    impl Message for CountWidgets {
        fn message_name(&self) -> &'static str {
            "test.count_widgets"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::json!({ "color": self.color })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl Query for CountWidgets {}

    struct CountHandler;

    #[async_trait]
    impl QueryHandler<CountWidgets> for CountHandler {
        type Output = u64;

        async fn handle(&self, query: &CountWidgets) -> Result<u64, AppError> {
            Ok(if query.color == "red" { 3 } else { 0 })
        }
    }

    #[tokio::test]
    async fn test_ask_as_returns_typed_result() {
        let bus = QueryBus::new();
        bus.register::<CountWidgets, _>(CountHandler);

        let count = bus.ask_as::<u64>(&CountWidgets { color: "red" }).await.unwrap();

        assert_eq!(*count, 3);
    }

    #[tokio::test]
    async fn test_ask_as_with_wrong_type_is_an_internal_error() {
        let bus = QueryBus::new();
        bus.register::<CountWidgets, _>(CountHandler);

        let result = bus.ask_as::<String>(&CountWidgets { color: "red" }).await;

        assert!(matches!(result.unwrap_err(), AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_ask_without_handler_is_a_configuration_error() {
        let bus = QueryBus::new();

        let result = bus.ask(&CountWidgets { color: "red" }).await;

        assert!(matches!(result.unwrap_err(), AppError::HandlerMissing(_)));
    }
}
