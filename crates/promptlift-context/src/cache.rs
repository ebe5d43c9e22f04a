//! Per-instance, memory-resident context cache
//!
//! Keys are canonical project paths. Entries are whole values swapped in with
//! a single map insert, so readers never observe a partially built context.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::ProjectContext;

/// Cached outcome of a context lookup
#[derive(Debug, Clone)]
pub(crate) enum CacheEntry {
    Available(Arc<ProjectContext>),
    /// The path exists but is not a project directory
    Unavailable,
}

/// Snapshot of cache activity
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub writes: usize,
    pub clears: usize,
    /// Entries currently held
    pub entries: usize,
}

impl CacheStats {
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ContextCache {
    entries: RwLock<HashMap<Utf8PathBuf, CacheEntry>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    writes: AtomicUsize,
    clears: AtomicUsize,
}

impl ContextCache {
    /// Look up `key`, counting a hit or a miss.
    pub(crate) fn get(&self, key: &Utf8Path) -> Option<CacheEntry> {
        let found = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store `entry`; a concurrent writer for the same key may replace it.
    pub(crate) fn insert(&self, key: Utf8PathBuf, entry: CacheEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn contains(&self, key: &Utf8Path) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub(crate) fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            entries: self
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }
}
