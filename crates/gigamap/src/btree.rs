//! B-tree range index (spec §5, C6).
//!
//! Built on [`std::collections::BTreeMap`] — the standard library's B-tree
//! already picks a sensible node degree for cache locality, so this module
//! adds range semantics and the unique-key constraint on top rather than
//! hand-rolling node splitting.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::error::{GigaMapError, Result};

/// Ids sharing one range-index key. The common case is a single id; a
/// `SmallVec` avoids a heap allocation for it.
pub type IdSet = SmallVec<[u64; 4]>;

/// Point-in-time statistics about a [`BTreeRangeIndex`].
///
/// `avg_lookup_micros`/`avg_insert_micros`/`cache_hit_ratio` are only
/// meaningful when the index was built with [`BTreeRangeIndex::with_stats`]
/// (spec §4.6: "collected when enabled") — they read `0.0` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BTreeStats {
    /// Distinct keys currently indexed.
    pub distinct_keys: usize,
    /// Total ids indexed across all keys.
    pub total_ids: usize,
    /// Smallest key present, if any.
    pub min_key: Option<i64>,
    /// Largest key present, if any.
    pub max_key: Option<i64>,
    /// Mean wall-clock cost of a lookup (`get`/`get_range`/`greater_than`/
    /// `less_than`), in microseconds.
    pub avg_lookup_micros: f64,
    /// Mean wall-clock cost of a `put`, in microseconds.
    pub avg_insert_micros: f64,
    /// Fraction of point/range lookups that returned at least one id,
    /// tracking how often queries land on populated keys.
    pub cache_hit_ratio: f64,
}

#[derive(Default)]
struct Counters {
    lookup_count: AtomicU64,
    lookup_micros: AtomicU64,
    insert_count: AtomicU64,
    insert_micros: AtomicU64,
    lookup_hits: AtomicU64,
}

/// A range index over `i64` keys (numeric and datetime indexers both
/// produce `i64`, see [`crate::indexer::IndexKey`]).
pub struct BTreeRangeIndex {
    name: String,
    unique: bool,
    entries: RwLock<BTreeMap<i64, IdSet>>,
    stats_enabled: AtomicBool,
    counters: Counters,
}

impl BTreeRangeIndex {
    /// Create an empty range index. `unique` rejects a `put` whose key
    /// already maps to a different id.
    pub fn new(name: impl Into<String>, unique: bool) -> Self {
        BTreeRangeIndex {
            name: name.into(),
            unique,
            entries: RwLock::new(BTreeMap::new()),
            stats_enabled: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Create an empty range index with lookup/insert timing and cache-hit
    /// tracking turned on (spec §4.6).
    pub fn with_stats(name: impl Into<String>, unique: bool) -> Self {
        let index = Self::new(name, unique);
        index.stats_enabled.store(true, Ordering::Relaxed);
        index
    }

    fn record_lookup(&self, started: Instant, hit: bool) {
        if !self.stats_enabled.load(Ordering::Relaxed) {
            return;
        }
        self.counters.lookup_count.fetch_add(1, Ordering::Relaxed);
        self.counters
            .lookup_micros
            .fetch_add(started.elapsed().as_micros() as u64, Ordering::Relaxed);
        if hit {
            self.counters.lookup_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_insert(&self, started: Instant) {
        if !self.stats_enabled.load(Ordering::Relaxed) {
            return;
        }
        self.counters.insert_count.fetch_add(1, Ordering::Relaxed);
        self.counters
            .insert_micros
            .fetch_add(started.elapsed().as_micros() as u64, Ordering::Relaxed);
    }

    /// Name this index is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert `id` under `key`.
    pub fn put(&self, key: i64, id: u64) -> Result<()> {
        let started = Instant::now();
        let result = (|| {
            let mut entries = self.entries.write();
            let ids = entries.entry(key).or_default();
            if self.unique && !ids.is_empty() && !ids.contains(&id) {
                return Err(GigaMapError::DuplicateKey { indexer: self.name.clone() });
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
            Ok(())
        })();
        self.record_insert(started);
        result
    }

    /// Remove `id` from `key`'s entry, dropping the entry if it becomes
    /// empty.
    pub fn remove(&self, key: i64, id: u64) {
        let mut entries = self.entries.write();
        if let Some(ids) = entries.get_mut(&key) {
            ids.retain(|existing| *existing != id);
            if ids.is_empty() {
                entries.remove(&key);
            }
        }
    }

    /// Remove every id stored under `key`, returning them. A no-op
    /// returning an empty set if `key` is absent.
    pub fn remove_key(&self, key: i64) -> IdSet {
        self.entries.write().remove(&key).unwrap_or_default()
    }

    /// Ids stored under exactly `key`.
    pub fn get(&self, key: i64) -> IdSet {
        let started = Instant::now();
        let result = self.entries.read().get(&key).cloned().unwrap_or_default();
        self.record_lookup(started, !result.is_empty());
        result
    }

    /// All ids across every key, in ascending key order.
    pub fn get_all(&self) -> Vec<u64> {
        self.entries.read().values().flat_map(|ids| ids.iter().copied()).collect()
    }

    /// Ids whose key lies in `[low, high]`, in ascending key order.
    pub fn get_range(&self, low: i64, high: i64) -> Vec<u64> {
        let started = Instant::now();
        let result: Vec<u64> = self
            .entries
            .read()
            .range((Bound::Included(low), Bound::Included(high)))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        self.record_lookup(started, !result.is_empty());
        result
    }

    /// Ids whose key is greater than `key` (or equal to it, if `inclusive`),
    /// ascending.
    pub fn greater_than(&self, key: i64, inclusive: bool) -> Vec<u64> {
        let started = Instant::now();
        let lower = if inclusive { Bound::Included(key) } else { Bound::Excluded(key) };
        let result: Vec<u64> = self
            .entries
            .read()
            .range((lower, Bound::Unbounded))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        self.record_lookup(started, !result.is_empty());
        result
    }

    /// Ids whose key is less than `key` (or equal to it, if `inclusive`),
    /// ascending.
    pub fn less_than(&self, key: i64, inclusive: bool) -> Vec<u64> {
        let started = Instant::now();
        let upper = if inclusive { Bound::Included(key) } else { Bound::Excluded(key) };
        let result: Vec<u64> = self
            .entries
            .read()
            .range((Bound::Unbounded, upper))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        self.record_lookup(started, !result.is_empty());
        result
    }

    /// Smallest key currently indexed.
    pub fn min_key(&self) -> Option<i64> {
        self.entries.read().keys().next().copied()
    }

    /// Largest key currently indexed.
    pub fn max_key(&self) -> Option<i64> {
        self.entries.read().keys().next_back().copied()
    }

    /// Snapshot statistics. Timing/cache-hit fields read `0.0` unless this
    /// index was created with [`Self::with_stats`].
    pub fn stats(&self) -> BTreeStats {
        let entries = self.entries.read();
        let lookup_count = self.counters.lookup_count.load(Ordering::Relaxed);
        let insert_count = self.counters.insert_count.load(Ordering::Relaxed);
        let avg_lookup_micros = if lookup_count == 0 {
            0.0
        } else {
            self.counters.lookup_micros.load(Ordering::Relaxed) as f64 / lookup_count as f64
        };
        let avg_insert_micros = if insert_count == 0 {
            0.0
        } else {
            self.counters.insert_micros.load(Ordering::Relaxed) as f64 / insert_count as f64
        };
        let cache_hit_ratio = if lookup_count == 0 {
            0.0
        } else {
            self.counters.lookup_hits.load(Ordering::Relaxed) as f64 / lookup_count as f64
        };
        BTreeStats {
            distinct_keys: entries.len(),
            total_ids: entries.values().map(|ids| ids.len()).sum(),
            min_key: entries.keys().next().copied(),
            max_key: entries.keys().next_back().copied(),
            avg_lookup_micros,
            avg_insert_micros,
            cache_hit_ratio,
        }
    }
}
