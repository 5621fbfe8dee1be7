//! Application error types.

use thiserror::Error;

use crate::validation::Violation;

/// Top-level error type surfaced by buses, middlewares, and the Unit of Work.
#[derive(Debug, Error)]
pub enum AppError {
    /// No handler is registered for the dispatched message's type.
    #[error("no handler registered for message: {0}")]
    HandlerMissing(String),

    /// A configuration error (unknown sort field, invalid wiring).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// `begin` was called while a Unit of Work session was already active.
    #[error("unit of work is already active")]
    UnitOfWorkAlreadyActive,

    /// `commit` was called without an active Unit of Work session.
    #[error("no active unit of work to commit")]
    UnitOfWorkNotActive,

    /// A command failed validation before reaching its handler.
    #[error("validation failed for {message}: {}", format_violations(.violations))]
    Validation {
        /// The message that failed validation.
        message: String,
        /// The collected rule violations.
        violations: Vec<Violation>,
    },

    /// A business rule was violated by a handler or aggregate.
    #[error("domain rule violated: {0}")]
    Domain(String),

    /// A persistence operation (begin/commit/rollback/write) failed.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// An infrastructure collaborator (cache, queue, store) failed.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// A defect inside the dispatch machinery itself (e.g. a handler bound
    /// to the wrong message type).
    #[error("internal dispatch error: {0}")]
    Internal(String),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
