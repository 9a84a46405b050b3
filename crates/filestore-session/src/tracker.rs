use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use filestore_core::FileHeader;

/// Set of shared values compared by pointer identity.
///
/// Two `Arc`s holding equal values are distinct members unless they point
/// to the same allocation. Members are kept alive by the set, so an address
/// is never reused while it is tracked.
pub struct IdentitySet<T> {
    members: DashMap<usize, Arc<T>>,
}

impl<T> IdentitySet<T> {
    pub fn new() -> Self {
        Self {
            members: DashMap::new(),
        }
    }

    fn address(item: &Arc<T>) -> usize {
        Arc::as_ptr(item) as *const () as usize
    }

    /// Insert `item`, returning false if this exact allocation was present.
    pub fn insert(&self, item: &Arc<T>) -> bool {
        self.members
            .insert(Self::address(item), Arc::clone(item))
            .is_none()
    }

    pub fn contains(&self, item: &Arc<T>) -> bool {
        self.members.contains_key(&Self::address(item))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T> Default for IdentitySet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for IdentitySet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentitySet")
            .field("len", &self.len())
            .finish()
    }
}

/// Paths compare case-insensitively.
fn path_key(path: &str) -> String {
    path.to_lowercase()
}

/// What a session has learned about the remote store so far.
///
/// - loaded: path -> header of a file known to exist
/// - deleted: headers marked for deletion, by identity
/// - known missing: paths known not to exist
///
/// A path is never both loaded and known missing.
#[derive(Debug, Default)]
pub struct EntityTracker {
    loaded: DashMap<String, Arc<FileHeader>>,
    deleted: IdentitySet<FileHeader>,
    known_missing: DashSet<String>,
}

impl EntityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entity` as the loaded header for `path`, replacing any
    /// previous one.
    pub fn record_loaded(&self, path: &str, entity: Arc<FileHeader>) {
        let key = path_key(path);
        self.known_missing.remove(&key);
        self.loaded.insert(key, entity);
    }

    /// Record that `path` does not exist remotely.
    pub fn record_missing(&self, path: &str) {
        let key = path_key(path);
        self.loaded.remove(&key);
        self.known_missing.insert(key);
    }

    pub fn is_loaded(&self, path: &str) -> bool {
        self.loaded.contains_key(&path_key(path))
    }

    /// The loaded header for `path`, if any.
    pub fn loaded(&self, path: &str) -> Option<Arc<FileHeader>> {
        self.loaded
            .get(&path_key(path))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_known_missing(&self, path: &str) -> bool {
        self.known_missing.contains(&path_key(path))
    }

    pub fn mark_deleted(&self, entity: &Arc<FileHeader>) {
        self.deleted.insert(entity);
    }

    pub fn is_marked_deleted(&self, entity: &Arc<FileHeader>) -> bool {
        self.deleted.contains(entity)
    }
}
