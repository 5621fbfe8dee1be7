//! Command audit trail.
//!
//! Every command dispatch leaves two marks in the audit store: a record in
//! `Executing` state before the handler runs, and a conclusion afterwards.
//! The trail survives handler failure, and a handler failure is always
//! re-raised to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_bus::{DispatchResult, Middleware, Next};
use herald_core::clock::Clock;
use herald_core::error::AppError;
use herald_core::message::Command;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::logging::redact_payload;

/// Execution state of an audited command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditStatus {
    /// The handler has been entered but not yet returned.
    Executing,
    /// The handler returned a result.
    Succeeded,
    /// The handler (or a later middleware) raised an error.
    Failed,
}

/// One row of the audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Unique record id.
    pub id: Uuid,
    /// The audited command's stable name.
    pub command: String,
    /// The command's payload projection, sensitive fields redacted.
    pub payload: Value,
    /// The acting principal, when the deployment knows one.
    pub actor: Option<String>,
    /// Current execution state.
    pub status: AuditStatus,
    /// When the dispatch entered the pipeline.
    pub started_at: DateTime<Utc>,
    /// When the dispatch concluded. `None` while `Executing`.
    pub finished_at: Option<DateTime<Utc>>,
    /// The error message, for `Failed` records.
    pub failure: Option<String>,
}

/// Append-only audit persistence.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Appends a fresh record in `Executing` state.
    async fn append(&self, record: AuditRecord) -> Result<(), AppError>;

    /// Concludes the record `id` with a terminal status.
    async fn conclude(
        &self,
        id: Uuid,
        status: AuditStatus,
        finished_at: DateTime<Utc>,
        failure: Option<String>,
    ) -> Result<(), AppError>;
}

/// Writes the audit trail around every command dispatch.
///
/// A failing `append` aborts the dispatch before the handler runs — a
/// command that cannot be audited does not execute. A failing `conclude`
/// is only logged: by then the handler's outcome is the truth and must
/// reach the caller unchanged.
pub struct AuditMiddleware {
    store: Arc<dyn AuditStore>,
    clock: Arc<dyn Clock>,
    actor: Option<String>,
}

impl AuditMiddleware {
    /// Creates the middleware over an audit store, without an actor.
    #[must_use]
    pub fn new(store: Arc<dyn AuditStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            actor: None,
        }
    }

    /// Sets the acting principal recorded on every row.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

#[async_trait]
impl Middleware<dyn Command> for AuditMiddleware {
    async fn handle(&self, command: &dyn Command, next: Next<'_, dyn Command>) -> DispatchResult {
        let id = Uuid::new_v4();
        self.store
            .append(AuditRecord {
                id,
                command: command.message_name().to_owned(),
                payload: redact_payload(command.to_payload()),
                actor: self.actor.clone(),
                status: AuditStatus::Executing,
                started_at: self.clock.now(),
                finished_at: None,
                failure: None,
            })
            .await?;

        let result = next.run().await;

        let (status, failure) = match &result {
            Ok(_) => (AuditStatus::Succeeded, None),
            Err(error) => (AuditStatus::Failed, Some(error.to_string())),
        };
        if let Err(error) = self
            .store
            .conclude(id, status, self.clock.now(), failure)
            .await
        {
            tracing::error!(
                audit_id = %id,
                command = command.message_name(),
                %error,
                "failed to conclude audit record",
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use herald_bus::{CommandBus, CommandHandler};
    use herald_core::clock::SystemClock;
    use herald_core::message::Message;

    use super::*;
    use crate::memory::InMemoryAuditStore;

    #[derive(Debug)]
    struct ChangePassword {
        succeed: bool,
    }

    impl Message for ChangePassword {
        fn message_name(&self) -> &'static str {
            "test.change_password"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::json!({ "password": "hunter2" })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl Command for ChangePassword {}

    struct ChangePasswordHandler;

    #[async_trait]
    impl CommandHandler<ChangePassword> for ChangePasswordHandler {
        type Output = ();

        async fn handle(&self, command: &ChangePassword) -> Result<(), AppError> {
            if command.succeed {
                Ok(())
            } else {
                Err(AppError::Domain("password too weak".to_owned()))
            }
        }
    }

    fn audited_bus(store: &Arc<InMemoryAuditStore>) -> CommandBus {
        let bus = CommandBus::new();
        bus.add_middleware(Arc::new(
            AuditMiddleware::new(Arc::clone(store) as Arc<dyn AuditStore>, Arc::new(SystemClock))
                .with_actor("system"),
        ));
        bus.register::<ChangePassword, _>(ChangePasswordHandler);
        bus
    }

    #[tokio::test]
    async fn test_successful_command_leaves_a_succeeded_record() {
        // Arrange
        let store = Arc::new(InMemoryAuditStore::new());
        let bus = audited_bus(&store);

        // Act
        bus.dispatch(&ChangePassword { succeed: true }).await.unwrap();

        // Assert
        let records = store.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.command, "test.change_password");
        assert_eq!(record.status, AuditStatus::Succeeded);
        assert_eq!(record.actor.as_deref(), Some("system"));
        assert!(record.finished_at.is_some());
        assert_eq!(record.payload["password"], "[redacted]");
    }

    #[tokio::test]
    async fn test_failed_command_is_recorded_and_re_raised() {
        let store = Arc::new(InMemoryAuditStore::new());
        let bus = audited_bus(&store);

        let result = bus.dispatch(&ChangePassword { succeed: false }).await;

        assert!(matches!(result.unwrap_err(), AppError::Domain(_)));
        let records = store.records();
        assert_eq!(records[0].status, AuditStatus::Failed);
        assert!(records[0].failure.as_deref().unwrap().contains("password too weak"));
    }
}
