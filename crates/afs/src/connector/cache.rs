//! Optional per-connector metadata cache (spec §4.3, §5).
//!
//! Caches `{exists, size}` for logical file paths. Reads consult the cache
//! before the backend; every mutating operation at the fragmented-file
//! layer (C4) invalidates the affected path and its ancestor directory
//! entries. Cached values are an optimization only and never cross the
//! connector boundary as a guarantee of freshness (spec §4.3).

use std::collections::HashMap;

use parking_lot::Mutex;

/// Cached metadata for one logical file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedMeta {
    /// Whether the file is known to exist.
    pub exists: bool,
    /// Known size in bytes.
    pub size: u64,
}

/// A single-lock cache from full-qualified path name to [`CachedMeta`].
///
/// The lock is held only across map mutations, never across a backend
/// call, per spec §5's shared-resource policy.
#[derive(Default)]
pub struct MetadataCache {
    entries: Mutex<HashMap<String, CachedMeta>>,
}

impl MetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up cached metadata for `path`.
    pub fn get(&self, path: &str) -> Option<CachedMeta> {
        self.entries.lock().get(path).copied()
    }

    /// Record metadata for `path`.
    pub fn put(&self, path: &str, meta: CachedMeta) {
        self.entries.lock().insert(path.to_string(), meta);
    }

    /// Invalidate the cache entry for `path`, if any.
    pub fn invalidate(&self, path: &str) {
        self.entries.lock().remove(path);
    }

    /// Invalidate `path` and every ancestor directory entry of `path`
    /// (slash-delimited), per §4.3's "write-invalidated on every mutating
    /// op for the affected path and any ancestor directory entry".
    pub fn invalidate_with_ancestors(&self, path: &str) {
        let mut entries = self.entries.lock();
        entries.remove(path);
        let mut current = path;
        while let Some(idx) = current.rfind('/') {
            current = &current[..idx];
            entries.remove(current);
        }
    }

    /// Drop every cached entry (used when a connector is released).
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_after_put_hits() {
        let cache = MetadataCache::new();
        cache.put("bkt/f.txt", CachedMeta { exists: true, size: 5 });
        assert_eq!(
            cache.get("bkt/f.txt"),
            Some(CachedMeta { exists: true, size: 5 })
        );
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = MetadataCache::new();
        cache.put("bkt/f.txt", CachedMeta { exists: true, size: 5 });
        cache.invalidate("bkt/f.txt");
        assert_eq!(cache.get("bkt/f.txt"), None);
    }

    #[test]
    fn invalidate_with_ancestors_clears_parent_directories() {
        let cache = MetadataCache::new();
        cache.put("bkt/d1", CachedMeta { exists: true, size: 0 });
        cache.put("bkt/d1/f.txt", CachedMeta { exists: true, size: 5 });
        cache.invalidate_with_ancestors("bkt/d1/f.txt");
        assert_eq!(cache.get("bkt/d1"), None);
        assert_eq!(cache.get("bkt/d1/f.txt"), None);
    }
}
