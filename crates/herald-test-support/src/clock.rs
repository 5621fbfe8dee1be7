//! Deterministic clock for tests.

use chrono::{DateTime, Utc};
use herald_core::clock::Clock;

/// A clock pinned to one instant, so event `occurred_on` stamps, audit
/// timestamps, and cache expiry are reproducible across runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// A fixed clock pinned to the Unix epoch.
    #[must_use]
    pub fn epoch() -> Self {
        Self(DateTime::UNIX_EPOCH)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
