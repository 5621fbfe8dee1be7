//! Shared test mocks and utilities for the Herald CQRS toolkit.

mod bus;
mod clock;
mod transaction;

pub use bus::{RecordingListener, RecordingMiddleware};
pub use clock::FixedClock;
pub use transaction::{FailingTransactionProvider, RecordingTransactionProvider};
