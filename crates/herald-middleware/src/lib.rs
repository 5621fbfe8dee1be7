//! Herald Middleware — the standard pipeline interceptors and their ports.
//!
//! Each middleware wraps one cross-cutting concern around bus dispatch:
//! logging, validation, auditing, transactional scoping, query caching,
//! performance measurement, event persistence, and background event
//! handling. Middlewares depend on narrow ports ([`AuditStore`],
//! [`CacheStore`], [`EventStore`], [`JobQueue`]); the [`memory`] module
//! provides in-process implementations of each.

pub mod audit;
pub mod async_event;
pub mod cache;
pub mod event_store;
pub mod logging;
pub mod memory;
pub mod performance;
pub mod queue;
pub mod unit_of_work;
pub mod validation;

pub use audit::{AuditMiddleware, AuditRecord, AuditStatus, AuditStore};
pub use async_event::AsyncEventMiddleware;
pub use cache::{CacheStore, CachingMiddleware, cache_key};
pub use event_store::{EventStore, EventStoreMiddleware, StoredEvent};
pub use logging::{LoggingMiddleware, redact_payload};
pub use memory::{InMemoryAuditStore, InMemoryCacheStore, InMemoryEventStore};
pub use performance::PerformanceMiddleware;
pub use queue::{InProcessJobQueue, JobQueue, JobWorker};
pub use unit_of_work::UnitOfWorkMiddleware;
pub use validation::ValidationMiddleware;
