//! Query result caching.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use herald_bus::{DispatchResult, Middleware, Next};
use herald_core::error::AppError;
use herald_core::message::Query;
use sha2::{Digest, Sha256};

/// Keyed storage for query results.
///
/// Values are the type-erased results the buses already traffic in, so a hit
/// hands back exactly what the handler produced. Implementations own TTL
/// enforcement; the middleware never offers a key whose TTL is zero or
/// negative.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks up a live entry.
    async fn get(&self, key: &str) -> Result<Option<Arc<dyn Any + Send + Sync>>, AppError>;

    /// Stores `value` under `key` for `ttl_seconds`.
    async fn put(
        &self,
        key: &str,
        value: Arc<dyn Any + Send + Sync>,
        ttl_seconds: i64,
    ) -> Result<(), AppError>;
}

/// Derives the cache key for a query: its stable name plus a SHA-256 digest
/// of the payload projection, so two queries of the same type with different
/// parameters never share an entry.
#[must_use]
pub fn cache_key(query: &dyn Query) -> String {
    let digest = Sha256::digest(query.to_payload().to_string().as_bytes());
    format!("{}:{digest:x}", query.message_name())
}

/// Serves repeat queries from the cache store.
///
/// Queries opt in by returning a positive `cache_ttl_seconds`; everything
/// else bypasses the store entirely. A hit short-circuits the pipeline with
/// the cached value; a miss runs the handler and stores its result. Store
/// failures degrade to uncached behavior with a warning rather than failing
/// the query.
pub struct CachingMiddleware {
    store: Arc<dyn CacheStore>,
}

impl CachingMiddleware {
    /// Creates the middleware over a cache store.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Middleware<dyn Query> for CachingMiddleware {
    async fn handle(&self, query: &dyn Query, next: Next<'_, dyn Query>) -> DispatchResult {
        let ttl = query.cache_ttl_seconds();
        if ttl <= 0 {
            return next.run().await;
        }

        let key = cache_key(query);
        match self.store.get(&key).await {
            Ok(Some(hit)) => {
                tracing::debug!(query = query.message_name(), key, "cache hit");
                return Ok(Some(hit));
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(query = query.message_name(), key, %error, "cache read failed");
            }
        }

        let value = next.run().await?;
        if let Some(result) = &value {
            if let Err(error) = self.store.put(&key, Arc::clone(result), ttl).await {
                tracing::warn!(query = query.message_name(), key, %error, "cache write failed");
            }
        }
        Ok(value)
    }
}
