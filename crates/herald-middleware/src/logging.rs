//! Structured logging around every dispatch.

use herald_bus::{DispatchResult, Middleware, Next};
use herald_core::message::Message;
use serde_json::Value;
use uuid::Uuid;

use async_trait::async_trait;

/// Payload keys whose values must never reach a log line.
const SENSITIVE_KEY_FRAGMENTS: [&str; 3] = ["password", "secret", "token"];

/// Returns `payload` with sensitive fields replaced by `"[redacted]"`.
///
/// A field is sensitive when its key contains `password`, `secret`, or
/// `token` (case-insensitive). Nested objects and arrays are walked.
#[must_use]
pub fn redact_payload(payload: Value) -> Value {
    match payload {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let lowered = key.to_lowercase();
                    if SENSITIVE_KEY_FRAGMENTS
                        .iter()
                        .any(|fragment| lowered.contains(fragment))
                    {
                        (key, Value::String("[redacted]".to_owned()))
                    } else {
                        (key, redact_payload(value))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_payload).collect()),
        other => other,
    }
}

/// Logs the start and outcome of every dispatch, correlating the entries
/// with a fresh UUID per dispatch. Failures are logged and re-raised, never
/// swallowed. Works on all three buses.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<M: Message + ?Sized> Middleware<M> for LoggingMiddleware {
    async fn handle(&self, message: &M, next: Next<'_, M>) -> DispatchResult {
        let correlation_id = Uuid::new_v4();
        let payload = redact_payload(message.to_payload());
        tracing::info!(
            message = message.message_name(),
            %correlation_id,
            %payload,
            "dispatch started",
        );

        match next.run().await {
            Ok(value) => {
                tracing::info!(
                    message = message.message_name(),
                    %correlation_id,
                    "dispatch succeeded",
                );
                Ok(value)
            }
            Err(error) => {
                tracing::error!(
                    message = message.message_name(),
                    %correlation_id,
                    %error,
                    "dispatch failed",
                );
                Err(error)
            }
        }
    }
}
