//! Single-slot cache for the most recent analysis snapshot.
//!
//! Lives only inside the running process; the cooldown record is the
//! durable half of the pair. When the gate denies a fresh fetch, the UI
//! falls back to whatever is held here.

use crate::models::AnalysisSnapshot;

/// A cached snapshot together with when it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub snapshot: AnalysisSnapshot,
    /// Seconds since epoch at fetch time; staleness is judged by the
    /// caller against the cooldown window, not by the cache.
    pub fetched_at: f64,
}

/// Holds at most the last successful snapshot.
#[derive(Debug, Default)]
pub struct ResultCache {
    entry: Option<CacheEntry>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite any prior entry unconditionally.
    pub fn store(&mut self, snapshot: AnalysisSnapshot, fetched_at: f64) {
        self.entry = Some(CacheEntry {
            snapshot,
            fetched_at,
        });
    }

    /// Non-destructive read. `None` only before the first successful
    /// fetch in this process lifetime.
    pub fn peek(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }
}
