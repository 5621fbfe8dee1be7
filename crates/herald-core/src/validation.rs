//! Validation rules for command payloads.
//!
//! Commands declare rules against their payload projection; the validation
//! middleware evaluates them before the handler runs. Rules are a small typed
//! vocabulary rather than strings, so an impossible rule cannot be written.

use std::fmt;

use serde_json::Value;

/// A single constraint on one payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Field must be present and non-null (empty strings fail too).
    Required,
    /// String field must have at least this many characters.
    MinLength(usize),
    /// String field must have at most this many characters.
    MaxLength(usize),
    /// Field must look like an email address.
    Email,
}

/// A constraint bound to a payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRule {
    /// The payload field the constraint applies to.
    pub field: &'static str,
    /// The constraint to evaluate.
    pub constraint: Constraint,
}

impl ValidationRule {
    /// Binds a constraint to a field.
    #[must_use]
    pub fn new(field: &'static str, constraint: Constraint) -> Self {
        Self { field, constraint }
    }
}

/// A failed rule, with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The offending field.
    pub field: String,
    /// Why the field failed.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Evaluates `rules` against a payload projection, collecting every
/// violation rather than stopping at the first.
///
/// Absent or null fields only fail [`Constraint::Required`]; the other
/// constraints treat them as vacuously satisfied so optional fields can
/// still carry length or format rules.
#[must_use]
pub fn evaluate(payload: &Value, rules: &[ValidationRule]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rule in rules {
        let value = payload.get(rule.field);
        if let Some(message) = check(value, &rule.constraint) {
            violations.push(Violation {
                field: rule.field.to_owned(),
                message,
            });
        }
    }

    violations
}

fn check(value: Option<&Value>, constraint: &Constraint) -> Option<String> {
    let present = match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    };

    match constraint {
        Constraint::Required => {
            (!present).then(|| "is required".to_owned())
        }
        Constraint::MinLength(min) => match value {
            Some(Value::String(s)) if !s.is_empty() && s.chars().count() < *min => {
                Some(format!("must be at least {min} characters"))
            }
            _ => None,
        },
        Constraint::MaxLength(max) => match value {
            Some(Value::String(s)) if s.chars().count() > *max => {
                Some(format!("must be at most {max} characters"))
            }
            _ => None,
        },
        Constraint::Email => match value {
            Some(Value::String(s)) if !s.is_empty() && !looks_like_email(s) => {
                Some("must be a valid email address".to_owned())
            }
            _ => None,
        },
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
