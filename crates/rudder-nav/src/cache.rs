//! Process-wide content cache: navigation key → decoded content entry.
//!
//! Entries are never evicted. A page session performs finitely many
//! navigations, and evicting old keys would break back/forward recovery.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rudder_core::{ClientError, ContentEntry, NavigationKey, Result};
use tracing::trace;

/// Shared mapping from [`NavigationKey`] to [`ContentEntry`].
///
/// Cloning the cache clones the handle; all clones see the same entries.
#[derive(Clone, Default)]
pub struct ContentCache {
    entries: Arc<RwLock<HashMap<NavigationKey, ContentEntry>>>,
}

impl ContentCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry exists for `key`.
    pub fn has(&self, key: &NavigationKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Entry for `key`, or [`ClientError::NotFound`].
    pub fn get(&self, key: &NavigationKey) -> Result<ContentEntry> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ClientError::not_found(key.as_str()))
    }

    /// Insert or overwrite the entry for `key`.
    pub fn set(&self, key: NavigationKey, entry: ContentEntry) {
        trace!(key = %key, "content cache set");
        let _ = self.entries.write().insert(key, entry);
    }

    /// Insert `entry` only if `key` is absent. Returns whether it was inserted.
    pub fn set_if_absent(&self, key: NavigationKey, entry: ContentEntry) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return false;
        }
        trace!(key = %key, "content cache set");
        let _ = entries.insert(key, entry);
        true
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of all cached keys, in no particular order.
    pub fn keys(&self) -> Vec<NavigationKey> {
        self.entries.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("len", &self.len())
            .finish()
    }
}
