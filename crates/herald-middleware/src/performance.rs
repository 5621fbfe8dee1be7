//! Query performance measurement.

use std::time::Instant;

use async_trait::async_trait;
use herald_bus::{DispatchResult, Middleware, Next};
use herald_core::message::Query;

const DEFAULT_SLOW_THRESHOLD_MS: u64 = 1000;

#[cfg(target_os = "linux")]
fn resident_memory_bytes() -> Option<i64> {
    // Second field of /proc/self/statm is resident size in pages.
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let pages: i64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(pages * 4096)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_bytes() -> Option<i64> {
    None
}

/// Measures wall time and resident-memory delta for every query, logging a
/// warning when the wall time crosses the slow-query threshold. Results and
/// errors pass through untouched.
///
/// The memory probe reads `/proc/self/statm` and reports `None` on other
/// platforms.
pub struct PerformanceMiddleware {
    slow_threshold_ms: u64,
}

impl Default for PerformanceMiddleware {
    fn default() -> Self {
        Self {
            slow_threshold_ms: DEFAULT_SLOW_THRESHOLD_MS,
        }
    }
}

impl PerformanceMiddleware {
    /// Creates the middleware with the default 1000 ms slow-query threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the slow-query threshold.
    #[must_use]
    pub fn with_slow_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.slow_threshold_ms = threshold_ms;
        self
    }
}

#[async_trait]
impl Middleware<dyn Query> for PerformanceMiddleware {
    async fn handle(&self, query: &dyn Query, next: Next<'_, dyn Query>) -> DispatchResult {
        let started = Instant::now();
        let memory_before = resident_memory_bytes();

        let result = next.run().await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let memory_delta_bytes = memory_before
            .zip(resident_memory_bytes())
            .map(|(before, after)| after - before);

        if elapsed_ms >= self.slow_threshold_ms {
            tracing::warn!(
                query = query.message_name(),
                elapsed_ms,
                memory_delta_bytes,
                "slow query",
            );
        } else {
            tracing::debug!(
                query = query.message_name(),
                elapsed_ms,
                memory_delta_bytes,
                "query measured",
            );
        }

        result
    }
}
