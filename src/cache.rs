use crate::error::DataError;
use crate::types::DatasetRequest;
use polars::prelude::DataFrame;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const CACHE_TTL_SECS: u64 = 15 * 60; // 15 minutes

/// Process-wide table cache, shared by every webview session.
///
/// Entries are keyed by a fingerprint of the full request, so value-equal
/// requests from any session share one slot. Concurrent misses for the same
/// fingerprint may both fetch; last writer wins, which is harmless because
/// the bucket objects are treated as immutable within a TTL window.
pub struct DataCache {
    entries: Mutex<HashMap<u64, CacheEntry>>,
    ttl: Duration,
}

struct CacheEntry {
    table: DataFrame,
    fetched_at: Instant,
}

impl DataCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(CACHE_TTL_SECS))
    }

    /// Same cache with a caller-chosen TTL. Production uses `new`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Deterministic cache key over every field of the request.
    pub fn fingerprint(request: &DatasetRequest) -> u64 {
        let mut hasher = DefaultHasher::new();
        request.hash(&mut hasher);
        hasher.finish()
    }

    /// Live entry for this request; an entry past its TTL is never returned.
    pub fn get(&self, request: &DatasetRequest) -> Option<DataFrame> {
        let guard = self.entries.lock().ok()?;
        let entry = guard.get(&Self::fingerprint(request))?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.table.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, request: &DatasetRequest, table: DataFrame) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.insert(
                Self::fingerprint(request),
                CacheEntry {
                    table,
                    fetched_at: Instant::now(),
                },
            );
        }
    }

    /// Last stored table for this request regardless of age.
    pub fn get_even_if_expired(&self, request: &DatasetRequest) -> Option<DataFrame> {
        let guard = self.entries.lock().ok()?;
        guard
            .get(&Self::fingerprint(request))
            .map(|entry| entry.table.clone())
    }

    /// Serve a live entry with zero I/O, or run `fetch` and store the
    /// result. A failed fetch is never cached and leaves any earlier entry
    /// in place; the error simply propagates to the caller.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        request: &DatasetRequest,
        fetch: F,
    ) -> Result<DataFrame, DataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DataFrame, DataError>>,
    {
        if let Some(table) = self.get(request) {
            return Ok(table);
        }

        let table = fetch().await?;
        self.insert(request, table.clone());
        Ok(table)
    }
}
