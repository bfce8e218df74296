//! Thread-safe TTL cache for market snapshots.
//!
//! Stores whole snapshots, not per-field values, so a cached ticker returns
//! a consistent `fetched_at` across price, shares, and market cap.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use super::MarketSnapshot;

struct CacheEntry {
    snapshot: MarketSnapshot,
    expires_at: Instant,
}

/// Snapshot cache keyed by uppercase symbol.
///
/// A TTL of zero disables reuse entirely.
pub struct SnapshotCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl SnapshotCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a live snapshot, if one is cached and unexpired.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<MarketSnapshot> {
        if self.ttl.is_zero() {
            return None;
        }
        let entries = self.entries.read();
        entries
            .get(symbol)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.snapshot.clone())
    }

    pub fn insert(&self, symbol: impl Into<String>, snapshot: MarketSnapshot) {
        if self.ttl.is_zero() {
            return;
        }
        let entry = CacheEntry {
            snapshot,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.write().insert(symbol.into(), entry);
    }

    /// Number of cached symbols, expired entries included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
