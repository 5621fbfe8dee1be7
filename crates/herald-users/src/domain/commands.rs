//! Commands of the Users context.

use std::any::Any;

use herald_core::message::{Command, Message};
use herald_core::validation::{Constraint, ValidationRule};
use serde_json::Value;

/// Creates a new user account.
///
/// The plain password travels in the payload so the validation rules can see
/// it; the logging and audit layers redact it by key.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address, unique across users.
    pub email: String,
    /// Plain-text password, hashed by the handler.
    pub password: String,
    /// Optional display name.
    pub name: Option<String>,
}

impl Message for CreateUser {
    fn message_name(&self) -> &'static str {
        "users.create_user"
    }

    fn to_payload(&self) -> Value {
        serde_json::json!({
            "email": self.email,
            "password": self.password,
            "name": self.name,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Command for CreateUser {
    fn validation_rules(&self) -> Vec<ValidationRule> {
        vec![
            ValidationRule::new("email", Constraint::Required),
            ValidationRule::new("email", Constraint::Email),
            ValidationRule::new("password", Constraint::Required),
            ValidationRule::new("password", Constraint::MinLength(8)),
            ValidationRule::new("name", Constraint::MinLength(2)),
        ]
    }
}
