//! Bounded match cache for regex based filters
//!
//! A regex filter sees the same tag values over and over while a scan walks
//! millions of metric definitions. The cache remembers, per filter, which
//! values matched and which missed so the regex only runs once per distinct
//! value.
//!
//! Both maps are capped at the configured size. The size check and the
//! insert are not atomic with each other, so concurrent inserts can overshoot
//! the cap by a few entries. The cache never evicts: once full it simply
//! stops growing and further misses fall through to the regex.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::DashSet;
use tracing::trace;

/// Per-filter cache of regex outcomes keyed by the tested value
#[derive(Debug)]
pub struct MatchCache {
    matched: DashSet<String>,
    missed: DashSet<String>,
    matched_len: AtomicUsize,
    missed_len: AtomicUsize,
    capacity: usize,
    stats: MatchCacheCounters,
}

#[derive(Debug, Default)]
struct MatchCacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
}

/// Snapshot of match cache activity (non-atomic copy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchCacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to run the regex
    pub misses: u64,
    /// Values added to either map
    pub inserts: u64,
    /// Current entries in the matched map
    pub matched_entries: usize,
    /// Current entries in the missed map
    pub missed_entries: usize,
}

impl MatchCache {
    /// Create a cache holding at most `capacity` entries per map
    pub fn new(capacity: usize) -> Self {
        Self {
            matched: DashSet::new(),
            missed: DashSet::new(),
            matched_len: AtomicUsize::new(0),
            missed_len: AtomicUsize::new(0),
            capacity,
            stats: MatchCacheCounters::default(),
        }
    }

    /// Maximum entries per map
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a previously recorded outcome. Misses are consulted first.
    pub fn lookup(&self, value: &str) -> Option<bool> {
        if self.missed.contains(value) {
            return Some(false);
        }
        if self.matched.contains(value) {
            return Some(true);
        }
        None
    }

    /// Record an outcome if the corresponding map still has room
    pub fn record(&self, value: &str, matched: bool) {
        let (set, len) = if matched {
            (&self.matched, &self.matched_len)
        } else {
            (&self.missed, &self.missed_len)
        };

        if len.load(Ordering::Relaxed) >= self.capacity {
            return;
        }

        if set.insert(value.to_string()) {
            let size = len.fetch_add(1, Ordering::Relaxed) + 1;
            self.stats.inserts.fetch_add(1, Ordering::Relaxed);
            if size == self.capacity {
                trace!(capacity = self.capacity, matched, "match cache map is full");
            }
        }
    }

    /// Return the cached outcome for `value` or compute it with `evaluate`
    /// and try to remember it
    pub fn get_or_evaluate<F>(&self, value: &str, evaluate: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        if let Some(matched) = self.lookup(value) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return matched;
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let matched = evaluate(value);
        self.record(value, matched);
        matched
    }

    /// Get a snapshot of statistics
    pub fn stats(&self) -> MatchCacheStats {
        MatchCacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            inserts: self.stats.inserts.load(Ordering::Relaxed),
            matched_entries: self.matched_len.load(Ordering::Relaxed),
            missed_entries: self.missed_len.load(Ordering::Relaxed),
        }
    }
}
