//! Transactional scoping for command dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use herald_bus::{DispatchResult, Middleware, Next};
use herald_core::message::Command;
use herald_uow::UnitOfWork;

/// Wraps each command dispatch in a Unit of Work session.
///
/// When a session is already active the middleware passes through, so a
/// handler dispatching a nested command participates in the outer session
/// instead of opening a second one. Otherwise it begins a session, commits
/// on handler success, and rolls back (re-raising the handler's error) on
/// failure.
pub struct UnitOfWorkMiddleware {
    uow: Arc<UnitOfWork>,
}

impl UnitOfWorkMiddleware {
    /// Creates the middleware over a Unit of Work.
    #[must_use]
    pub fn new(uow: Arc<UnitOfWork>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl Middleware<dyn Command> for UnitOfWorkMiddleware {
    async fn handle(&self, command: &dyn Command, next: Next<'_, dyn Command>) -> DispatchResult {
        if self.uow.is_active() {
            return next.run().await;
        }

        self.uow.begin().await?;
        match next.run().await {
            Ok(value) => {
                self.uow.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = self.uow.rollback().await {
                    tracing::error!(
                        command = command.message_name(),
                        %rollback_error,
                        "rollback failed after command error",
                    );
                }
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use herald_bus::{CommandBus, CommandHandler, EventBus, EventHandler};
    use herald_core::clock::Clock;
    use herald_core::error::AppError;
    use herald_core::event::{DomainEvent, EventMetadata};
    use herald_core::message::Message;
    use herald_uow::{Transaction, TransactionProvider};

    use super::*;

    #[derive(Debug)]
    struct Enroll {
        succeed: bool,
    }

    impl Message for Enroll {
        fn message_name(&self) -> &'static str {
            "test.enroll"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::json!({})
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl Command for Enroll {}

    #[derive(Debug, Clone)]
    struct Enrolled {
        metadata: EventMetadata,
    }

    impl Message for Enrolled {
        fn message_name(&self) -> &'static str {
            "test.enrolled"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::json!({})
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl DomainEvent for Enrolled {
        fn event_name(&self) -> &'static str {
            "test.enrolled"
        }

        fn metadata(&self) -> &EventMetadata {
            &self.metadata
        }

        fn clone_event(&self) -> Box<dyn DomainEvent> {
            Box::new(self.clone())
        }
    }

    struct WallClock;

    impl Clock for WallClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            chrono::Utc::now()
        }
    }

    struct NullTransaction {
        commits: Arc<AtomicUsize>,
        rollbacks: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transaction for NullTransaction {
        async fn commit(&mut self) -> Result<(), AppError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(&mut self) -> Result<(), AppError> {
            self.rollbacks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullProvider {
        commits: Arc<AtomicUsize>,
        rollbacks: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TransactionProvider for NullProvider {
        async fn begin_transaction(&self) -> Result<Box<dyn Transaction>, AppError> {
            Ok(Box::new(NullTransaction {
                commits: Arc::clone(&self.commits),
                rollbacks: Arc::clone(&self.rollbacks),
            }))
        }
    }

    struct EnrollHandler {
        uow: Arc<UnitOfWork>,
    }

    #[async_trait]
    impl CommandHandler<Enroll> for EnrollHandler {
        type Output = ();

        async fn handle(&self, command: &Enroll) -> Result<(), AppError> {
            self.uow
                .collect_event(Arc::new(Enrolled {
                    metadata: EventMetadata::new("enrollment-1", &WallClock),
                }))
                .await?;
            if command.succeed {
                Ok(())
            } else {
                Err(AppError::Domain("enrollment closed".to_owned()))
            }
        }
    }

    struct CountingListener {
        published: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl EventHandler<Enrolled> for CountingListener {
        async fn handle(&self, _event: &Enrolled) -> Result<(), AppError> {
            *self.published.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn harness() -> (CommandBus, Arc<NullProvider>, Arc<Mutex<u32>>) {
        let published = Arc::new(Mutex::new(0));
        let event_bus = Arc::new(EventBus::new());
        event_bus.register::<Enrolled, _>(CountingListener {
            published: Arc::clone(&published),
        });
        let provider = Arc::new(NullProvider::default());
        let uow = Arc::new(UnitOfWork::new(
            Arc::clone(&provider) as Arc<dyn TransactionProvider>,
            event_bus,
        ));
        let bus = CommandBus::new();
        bus.add_middleware(Arc::new(UnitOfWorkMiddleware::new(Arc::clone(&uow))));
        bus.register::<Enroll, _>(EnrollHandler { uow });
        (bus, provider, published)
    }

    #[tokio::test]
    async fn test_successful_command_commits_and_flushes_events() {
        // Arrange
        let (bus, provider, published) = harness();

        // Act
        bus.dispatch(&Enroll { succeed: true }).await.unwrap();

        // Assert
        assert_eq!(provider.commits.load(Ordering::SeqCst), 1);
        assert_eq!(provider.rollbacks.load(Ordering::SeqCst), 0);
        assert_eq!(*published.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failing_command_rolls_back_and_publishes_nothing() {
        let (bus, provider, published) = harness();

        let result = bus.dispatch(&Enroll { succeed: false }).await;

        assert!(matches!(result.unwrap_err(), AppError::Domain(_)));
        assert_eq!(provider.commits.load(Ordering::SeqCst), 0);
        assert_eq!(provider.rollbacks.load(Ordering::SeqCst), 1);
        assert_eq!(*published.lock().unwrap(), 0);
    }
}
