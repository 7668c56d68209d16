//! Memoized classification decisions.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Decisions keyed by prefix-stripped, upper-cased routine name.
///
/// Entries are never evicted and never invalidated by file changes; a stale
/// decision survives until [`ClassificationCache::clear`] is called.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    entries: RwLock<HashMap<String, bool>>,
}

impl ClassificationCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached decision for `key`: `true` = standard.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.read().get(key).copied()
    }

    /// Store a decision. An existing entry for `key` is kept.
    ///
    /// Returns the decision now held by the cache, which differs from
    /// `standard` only if another caller raced us to the same key.
    pub fn insert(&self, key: String, standard: bool) -> bool {
        *self.entries.write().entry(key).or_insert(standard)
    }

    /// Number of cached decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every cached decision.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
