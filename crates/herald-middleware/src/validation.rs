//! Pre-handler command validation.

use async_trait::async_trait;
use herald_bus::{DispatchResult, Middleware, Next};
use herald_core::error::AppError;
use herald_core::message::Command;
use herald_core::validation;

/// Evaluates a command's declared validation rules against its payload
/// projection before the handler runs. Any violation short-circuits the
/// dispatch with [`AppError::Validation`]; commands without rules pass
/// through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationMiddleware;

impl ValidationMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware<dyn Command> for ValidationMiddleware {
    async fn handle(&self, command: &dyn Command, next: Next<'_, dyn Command>) -> DispatchResult {
        let rules = command.validation_rules();
        if !rules.is_empty() {
            let violations = validation::evaluate(&command.to_payload(), &rules);
            if !violations.is_empty() {
                return Err(AppError::Validation {
                    message: command.message_name().to_owned(),
                    violations,
                });
            }
        }
        next.run().await
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::{Arc, Mutex};

    use herald_bus::CommandBus;
    use herald_bus::CommandHandler;
    use herald_core::message::Message;
    use herald_core::validation::{Constraint, ValidationRule};

    use super::*;

    #[derive(Debug)]
    struct Register {
        email: &'static str,
    }

    impl Message for Register {
        fn message_name(&self) -> &'static str {
            "test.register"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::json!({ "email": self.email })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl Command for Register {
        fn validation_rules(&self) -> Vec<ValidationRule> {
            vec![
                ValidationRule::new("email", Constraint::Required),
                ValidationRule::new("email", Constraint::Email),
            ]
        }
    }

    struct RegisterHandler {
        handled: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl CommandHandler<Register> for RegisterHandler {
        type Output = ();

        async fn handle(&self, _command: &Register) -> Result<(), AppError> {
            *self.handled.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn bus_with_validation(handled: &Arc<Mutex<u32>>) -> CommandBus {
        let bus = CommandBus::new();
        bus.add_middleware(Arc::new(ValidationMiddleware::new()));
        bus.register::<Register, _>(RegisterHandler {
            handled: Arc::clone(handled),
        });
        bus
    }

    #[tokio::test]
    async fn test_invalid_command_never_reaches_the_handler() {
        // Arrange
        let handled = Arc::new(Mutex::new(0));
        let bus = bus_with_validation(&handled);

        // Act
        let result = bus.dispatch(&Register { email: "nope" }).await;

        // Assert
        match result.unwrap_err() {
            AppError::Validation { message, violations } => {
                assert_eq!(message, "test.register");
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].field, "email");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert_eq!(*handled.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_valid_command_passes_through() {
        let handled = Arc::new(Mutex::new(0));
        let bus = bus_with_validation(&handled);

        bus.dispatch(&Register { email: "ada@lovelace.dev" }).await.unwrap();

        assert_eq!(*handled.lock().unwrap(), 1);
    }
}
