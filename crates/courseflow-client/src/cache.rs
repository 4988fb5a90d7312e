//! Read-through cache for reference resources.
//!
//! A CLI invocation (and any other short-lived driver) tends to ask for the
//! same course or progress record several times while rendering one view.
//! This cache keys fetched values by (resource kind, parent id) and fetches
//! each key at most once per instance. It is deliberately instance-scoped
//! with no TTL or eviction; drop the cache to invalidate everything.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::debug;

use courseflow_session::BackendError;

/// Cache key: a resource kind plus the id it belongs to.
type Key = (String, String);

/// Instance-scoped read-through cache over an async fetch.
#[derive(Debug, Default)]
pub struct ResourceCache<T> {
    entries: Mutex<HashMap<Key, T>>,
}

impl<T: Clone> ResourceCache<T> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for (resource, parent id), fetching and
    /// storing it on first use.
    ///
    /// The lock is held across the fetch, so concurrent callers for the
    /// same key wait rather than fetching twice.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error; nothing is cached on failure.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        resource: &str,
        parent_id: &str,
        fetch: F,
    ) -> Result<T, BackendError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, BackendError>>,
    {
        let key = (resource.to_string(), parent_id.to_string());
        let mut entries = self.entries.lock().await;
        if let Some(value) = entries.get(&key) {
            debug!(resource, parent_id, "cache hit");
            return Ok(value.clone());
        }

        debug!(resource, parent_id, "cache miss");
        let value = fetch().await?;
        entries.insert(key, value.clone());
        Ok(value)
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
