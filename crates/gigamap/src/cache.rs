//! Compressed query-result cache (spec §5, §9 Open Question 3, C8).
//!
//! Caches the id list a [`crate::query::Query`] resolved to, keyed by a
//! signature hashed over a canonical encoding of its condition tree so that
//! logically identical queries built in different call orders (`a AND b`
//! vs. `b AND a`) hit the same entry. Entries are stored zstd-compressed;
//! a capacity limit evicts the entry with the oldest `compressed_at`, and a
//! TTL expires entries outright regardless of capacity pressure.

use std::collections::HashMap;
use std::hash::Hasher;
use std::time::{Duration, Instant};

use nebula_core::serialize::{read_varint, write_signed_varint, write_varint};
use parking_lot::Mutex;
use rustc_hash::FxHasher;

use crate::indexer::IndexKey;
use crate::query::QueryNode;

/// How aggressively to compress cached results, mirroring the levels a
/// caller would pick for any zstd-backed cache: `None` disables
/// compression, `Fastest`/`Optimal`/`SmallestSize` trade CPU for ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// No compression (zstd level 0 — store, only framing overhead).
    None,
    /// Cheapest compression (zstd level 1).
    Fastest,
    /// Balanced compression (zstd level 19).
    Optimal,
    /// Maximum compression (zstd level 22).
    SmallestSize,
}

impl CompressionLevel {
    fn zstd_level(self) -> i32 {
        match self {
            CompressionLevel::None => 0,
            CompressionLevel::Fastest => 1,
            CompressionLevel::Optimal => 19,
            CompressionLevel::SmallestSize => 22,
        }
    }
}

struct CacheEntry {
    compressed: Vec<u8>,
    created_at: Instant,
    compressed_at: Instant,
}

/// A bounded, TTL-expiring cache from query signature to a compressed id
/// list.
pub struct QueryCache {
    entries: Mutex<HashMap<u64, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
    level: CompressionLevel,
}

impl QueryCache {
    /// Create a cache holding at most `capacity` entries, each valid for
    /// `ttl`, compressed at `level`.
    pub fn new(capacity: usize, ttl: Duration, level: CompressionLevel) -> Self {
        QueryCache { entries: Mutex::new(HashMap::new()), capacity, ttl, level }
    }

    /// Look up a cached id list for `signature`. Returns `None` on a miss
    /// or an expired entry (which is also evicted as a side effect).
    pub fn get(&self, signature: u64) -> Option<Vec<u64>> {
        let mut entries = self.entries.lock();
        let entry = entries.get(&signature)?;
        if entry.created_at.elapsed() >= self.ttl {
            entries.remove(&signature);
            return None;
        }
        let raw = zstd::stream::decode_all(entry.compressed.as_slice()).ok()?;
        decode_ids(&raw)
    }

    /// Store `ids` under `signature`, evicting the oldest entry by
    /// `compressed_at` if the cache is at capacity.
    pub fn put(&self, signature: u64, ids: &[u64]) {
        let raw = encode_ids(ids);
        let Ok(compressed) = zstd::stream::encode_all(raw.as_slice(), self.level.zstd_level()) else {
            return;
        };
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity && !entries.contains_key(&signature) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.compressed_at)
                .map(|(sig, _)| *sig)
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(signature, CacheEntry { compressed, created_at: now, compressed_at: now });
    }

    /// Drop every entry whose TTL has elapsed. Intended to be called
    /// periodically (spec: a five-minute sweep) rather than relying solely
    /// on lazy expiry-on-read.
    pub fn sweep_expired(&self) {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
    }

    /// Number of entries currently cached (including any not yet swept
    /// past their TTL).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The sweep interval recommended for [`QueryCache::sweep_expired`].
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

fn encode_ids(ids: &[u64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(ids.len() * 2);
    write_varint(&mut buf, ids.len() as u64).expect("writing to a Vec never fails");
    for id in ids {
        write_varint(&mut buf, *id).expect("writing to a Vec never fails");
    }
    buf
}

fn decode_ids(buf: &[u8]) -> Option<Vec<u64>> {
    let mut cursor = buf;
    let count = read_varint(&mut cursor).ok()?;
    let mut ids = Vec::with_capacity(count as usize);
    for _ in 0..count {
        ids.push(read_varint(&mut cursor).ok()?);
    }
    Some(ids)
}

/// Hash a query's condition tree into a cache signature. Canonicalizes
/// commutative `AND`/`OR` operands by sorting their encoded bytes first, so
/// `a.and(b)` and `b.and(a)` produce the same signature.
pub fn signature_of(node: &QueryNode) -> u64 {
    let mut buf = Vec::new();
    encode_node(node, &mut buf);
    let mut hasher = FxHasher::default();
    hasher.write(&buf);
    hasher.finish()
}

fn encode_node(node: &QueryNode, out: &mut Vec<u8>) {
    match node {
        QueryNode::All => out.push(0),
        QueryNode::Eq(index, key) => {
            out.push(1);
            write_varint(out, index.len() as u64).unwrap();
            out.extend_from_slice(index.as_bytes());
            encode_key(key, out);
        }
        QueryNode::And(nodes) => encode_commutative(2, nodes, out),
        QueryNode::Or(nodes) => encode_commutative(3, nodes, out),
    }
}

fn encode_commutative(tag: u8, nodes: &[QueryNode], out: &mut Vec<u8>) {
    out.push(tag);
    let mut encoded: Vec<Vec<u8>> = nodes
        .iter()
        .map(|n| {
            let mut buf = Vec::new();
            encode_node(n, &mut buf);
            buf
        })
        .collect();
    encoded.sort();
    write_varint(out, encoded.len() as u64).unwrap();
    for child in encoded {
        write_varint(out, child.len() as u64).unwrap();
        out.extend_from_slice(&child);
    }
}

fn encode_key(key: &IndexKey, out: &mut Vec<u8>) {
    match key {
        IndexKey::Str(s) => {
            out.push(0);
            write_varint(out, s.len() as u64).unwrap();
            out.extend_from_slice(s.as_bytes());
        }
        IndexKey::I64(v) => {
            out.push(1);
            write_signed_varint(out, *v).unwrap();
        }
        IndexKey::Guid(guid) => {
            out.push(2);
            out.extend_from_slice(guid.as_bytes());
        }
        IndexKey::Id(id) => {
            out.push(3);
            write_varint(out, *id).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips_ids() {
        let cache = QueryCache::new(8, Duration::from_secs(60), CompressionLevel::Fastest);
        cache.put(42, &[1, 2, 3]);
        assert_eq!(cache.get(42), Some(vec![1, 2, 3]));
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache = QueryCache::new(8, Duration::from_millis(1), CompressionLevel::None);
        cache.put(1, &[1]);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get(1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_evicts_oldest_compressed_entry() {
        let cache = QueryCache::new(2, Duration::from_secs(60), CompressionLevel::None);
        cache.put(1, &[1]);
        std::thread::sleep(Duration::from_millis(5));
        cache.put(2, &[2]);
        std::thread::sleep(Duration::from_millis(5));
        cache.put(3, &[3]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1), None);
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn commutative_and_hashes_identically_regardless_of_operand_order() {
        let a = QueryNode::Eq("city".into(), IndexKey::Str("hanoi".into()));
        let b = QueryNode::Eq("age".into(), IndexKey::I64(30));
        let ab = QueryNode::And(vec![a.clone(), b.clone()]);
        let ba = QueryNode::And(vec![b, a]);
        assert_eq!(signature_of(&ab), signature_of(&ba));
    }

    #[test]
    fn sweep_expired_drops_only_stale_entries() {
        let cache = QueryCache::new(8, Duration::from_millis(5), CompressionLevel::None);
        cache.put(1, &[1]);
        std::thread::sleep(Duration::from_millis(20));
        cache.put(2, &[2]);
        // entry 1 is now stale relative to its own TTL window; sweep should
        // only remove expired entries, not everything indiscriminately.
        cache.sweep_expired();
        assert!(cache.get(1).is_none());
    }
}
