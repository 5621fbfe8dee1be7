//! In-memory implementations of the middleware ports.
//!
//! Suitable for tests and single-process deployments. All of them keep their
//! rows behind a plain mutex; none of them ever hold it across an await.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use herald_core::clock::Clock;
use herald_core::error::AppError;
use uuid::Uuid;

use crate::audit::{AuditRecord, AuditStatus, AuditStore};
use crate::cache::CacheStore;
use crate::event_store::{EventStore, StoredEvent};

/// Audit trail kept in a vector, in append order.
#[derive(Default)]
pub struct InMemoryAuditStore {
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the trail, in append order.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AppError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }

    async fn conclude(
        &self,
        id: Uuid,
        status: AuditStatus,
        finished_at: DateTime<Utc>,
        failure: Option<String>,
    ) -> Result<(), AppError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| AppError::Infrastructure(format!("unknown audit record: {id}")))?;
        record.status = status;
        record.finished_at = Some(finished_at);
        record.failure = failure;
        Ok(())
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: DateTime<Utc>,
}

/// Expiring key-value cache over a clock, so tests can control expiry.
pub struct InMemoryCacheStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Arc<dyn Any + Send + Sync>>, AppError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(Arc::clone(&entry.value))),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &str,
        value: Arc<dyn Any + Send + Sync>,
        ttl_seconds: i64,
    ) -> Result<(), AppError> {
        let expires_at = self.clock.now() + Duration::seconds(ttl_seconds);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), CacheEntry { value, expires_at });
        Ok(())
    }
}

/// Event log kept in a vector, in append order.
#[derive(Default)]
pub struct InMemoryEventStore {
    rows: Mutex<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the log, in append order.
    #[must_use]
    pub fn rows(&self) -> Vec<StoredEvent> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: StoredEvent) -> Result<(), AppError> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }
}
