//! Whole-response store used by the caching proxy.
//!
//! # Responsibilities
//! - Hold full responses keyed by request identity
//! - Expire entries lazily once their TTL has elapsed
//! - Bound the number of stored entries
//!
//! # Design Decisions
//! - Entries are immutable `Arc`s: a reader sees the old or the new entry, never a mix
//! - Same-key writers race freely (last writer wins)
//! - No background sweeper; expiry is checked on read and on a full write

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::observability::metrics;

/// Errors from a response store. The proxy treats all of them as a miss.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("response store unavailable: {0}")]
    Unavailable(String),
}

/// A captured response, ready to be replayed.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// One stored response and its lifetime.
#[derive(Debug)]
pub struct ProxyCacheEntry {
    pub request_key: String,
    pub response: StoredResponse,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl ProxyCacheEntry {
    pub fn new(request_key: String, response: StoredResponse, ttl: Duration) -> Self {
        Self {
            request_key,
            response,
            stored_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) >= self.ttl
    }

    /// Whole seconds since the entry was stored.
    pub fn age_secs(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.stored_at).as_secs()
    }
}

/// Storage backend for the caching proxy.
pub trait ProxyStore: Send + Sync {
    /// Live entry for `key`, if any. Expired entries are never returned.
    fn get(&self, key: &str) -> Result<Option<Arc<ProxyCacheEntry>>, StoreError>;

    /// Store `entry` under its request key, replacing any previous entry.
    fn put(&self, entry: ProxyCacheEntry) -> Result<(), StoreError> {
        let is_new = !self.entries.contains_key(&entry.request_key);
        if is_new && self.entries.len() >= self.max_entries {
            let purged = self.purge_expired();
            if self.entries.len() >= self.max_entries {
                tracing::debug!(
                    key = %entry.request_key,
                    max_entries = self.max_entries,
                    purged,
                    "Response store full, not storing"
                );
                return Ok(());
            }
        }

        let key = entry.request_key.clone();
        let entry = Arc::new(entry);
        let replaced = self.entries.insert(key.clone(), entry.clone());

        // Concurrent first writes can all pass the check above; the one that
        // overshoots the cap takes its own entry back out.
        if replaced.is_none() && self.entries.len() > self.max_entries {
            self.entries
                .remove_if(&key, |_, current| Arc::ptr_eq(current, &entry));
            tracing::debug!(
                key = %key,
                max_entries = self.max_entries,
                "Response store full, not storing"
            );
        }

        metrics::record_cache_size(self.entries.len());
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
