//! Message abstractions — commands, queries, and the trait they share.

use std::any::Any;

use crate::validation::ValidationRule;

/// Trait shared by every message that travels through a bus.
///
/// Handlers are resolved by the message's runtime type, so every message
/// must expose itself as [`Any`] via [`Message::as_any`]. The payload
/// projection is what middlewares validate, log, audit, and hash. It must
/// contain only primitive data; sensitive fields stay in the payload (the
/// validation rules need them) and are redacted by key in the logging and
/// audit layers.
pub trait Message: Any + Send + Sync + std::fmt::Debug {
    /// Stable name for this message (for logging, auditing, and routing).
    fn message_name(&self) -> &'static str;

    /// Primitive-data projection of the message for storage and logging.
    fn to_payload(&self) -> serde_json::Value;

    /// The message as [`Any`], for runtime-type handler resolution.
    fn as_any(&self) -> &dyn Any;
}

/// An intent to change state, dispatched to exactly one handler.
pub trait Command: Message {
    /// Validation rules evaluated against [`Message::to_payload`] before the
    /// handler runs. Empty means the command skips validation.
    fn validation_rules(&self) -> Vec<ValidationRule> {
        Vec::new()
    }
}

/// An intent to read state, dispatched to exactly one handler and
/// side-effect-free by convention.
pub trait Query: Message {
    /// Cache lifetime in seconds for this query's result. Zero or negative
    /// disables caching entirely; caching is opt-in per query type.
    fn cache_ttl_seconds(&self) -> i64 {
        0
    }
}
