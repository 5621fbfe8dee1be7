//! Time source abstraction.
//!
//! Event metadata stamps `occurred_on`, the audit trail stamps its rows, and
//! cache entries compute expiry — all through [`Clock`] rather than
//! `Utc::now()`, so tests can pin time to one instant.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system. The production choice everywhere a
/// [`Clock`] is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
