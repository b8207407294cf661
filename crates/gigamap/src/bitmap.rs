//! Bitmap index (spec §5, C5).
//!
//! Maps each distinct [`IndexKey`] produced by an [`Indexer`] to the set of
//! entity ids that produced it, stored as a [`RoaringTreemap`] (roaring's
//! 64-bit variant — entity ids are `u64` and a billions-capable map can
//! exceed `u32::MAX` entries) so that AND/OR/NOT composition across many
//! indices stays cheap even at that scale.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::RwLock;
use roaring::RoaringTreemap;

use crate::indexer::{IndexKey, Indexer};

/// Lifecycle state of a [`BitmapIndex`]. An index under bulk (re)construction
/// is `Building` and not safe to query; `Ready` indices serve queries;
/// `Mutating` is the brief window a single add/remove holds while updating
/// the map, after which the index returns to `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BitmapIndexState {
    /// Entries are being bulk-loaded; queries against the index are invalid.
    Building = 0,
    /// Normal serving state.
    Ready = 1,
    /// A single mutation is in flight.
    Mutating = 2,
}

impl From<u8> for BitmapIndexState {
    fn from(value: u8) -> Self {
        match value {
            0 => BitmapIndexState::Building,
            2 => BitmapIndexState::Mutating,
            _ => BitmapIndexState::Ready,
        }
    }
}

/// A bitmap index over one [`Indexer`].
pub struct BitmapIndex<E> {
    indexer: Box<dyn Indexer<E>>,
    entries: RwLock<HashMap<IndexKey, RoaringTreemap>>,
    state: AtomicU8,
}

impl<E> BitmapIndex<E> {
    /// Create a new, empty, `Ready` bitmap index over `indexer`.
    pub fn new(indexer: Box<dyn Indexer<E>>) -> Self {
        BitmapIndex {
            indexer,
            entries: RwLock::new(HashMap::new()),
            state: AtomicU8::new(BitmapIndexState::Ready as u8),
        }
    }

    /// Name of the underlying indexer.
    pub fn name(&self) -> &str {
        self.indexer.name()
    }

    /// Kind of the underlying indexer (used by [`crate::GigaMap`] to
    /// special-case `Identity` indices, whose key is the entity's id rather
    /// than anything extracted from the entity itself).
    pub fn indexer_kind(&self) -> crate::indexer::IndexerKind {
        self.indexer.kind()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BitmapIndexState {
        self.state.load(Ordering::Acquire).into()
    }

    /// Extract the key `entity` would index under.
    pub fn key_for(&self, entity: &E) -> Option<IndexKey> {
        self.indexer.key_of(entity)
    }

    /// Record that `id` now indexes under `key` (the `Identity` indexer
    /// passes `id` itself as the key via [`IndexKey::Id`]).
    pub fn insert(&self, id: u64, key: IndexKey) {
        self.state.store(BitmapIndexState::Mutating as u8, Ordering::Release);
        self.entries.write().entry(key).or_default().insert(id);
        self.state.store(BitmapIndexState::Ready as u8, Ordering::Release);
    }

    /// Remove `id` from the bitmap for `key`, dropping the key entirely if
    /// its bitmap becomes empty.
    pub fn remove(&self, id: u64, key: &IndexKey) {
        self.state.store(BitmapIndexState::Mutating as u8, Ordering::Release);
        let mut entries = self.entries.write();
        if let Some(bitmap) = entries.get_mut(key) {
            bitmap.remove(id);
            if bitmap.is_empty() {
                entries.remove(key);
            }
        }
        self.state.store(BitmapIndexState::Ready as u8, Ordering::Release);
    }

    /// Ids indexed under exactly `key`.
    pub fn equals(&self, key: &IndexKey) -> RoaringTreemap {
        self.entries.read().get(key).cloned().unwrap_or_default()
    }

    /// Whether any entity is indexed under `key`.
    pub fn contains_key(&self, key: &IndexKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of distinct keys currently indexed.
    pub fn distinct_key_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Union of every id ever inserted, used to compute `NOT` against the
    /// whole map's id space.
    pub fn universe(&self) -> RoaringTreemap {
        self.entries.read().values().fold(RoaringTreemap::new(), |mut acc, bitmap| {
            acc |= bitmap;
            acc
        })
    }
}

/// Intersect every bitmap in `bitmaps` (logical AND). An empty input yields
/// an empty bitmap, matching the "match nothing" semantics of an empty
/// conjunction rather than the mathematically correct "match everything".
pub fn and_all(bitmaps: &[RoaringTreemap]) -> RoaringTreemap {
    let mut iter = bitmaps.iter();
    let Some(first) = iter.next() else {
        return RoaringTreemap::new();
    };
    let mut acc = first.clone();
    for bitmap in iter {
        acc &= bitmap;
    }
    acc
}

/// Union every bitmap in `bitmaps` (logical OR).
pub fn or_all(bitmaps: &[RoaringTreemap]) -> RoaringTreemap {
    bitmaps.iter().fold(RoaringTreemap::new(), |mut acc, bitmap| {
        acc |= bitmap;
        acc
    })
}

/// Everything in `universe` that is not in `bitmap` (logical NOT).
pub fn not_in(bitmap: &RoaringTreemap, universe: &RoaringTreemap) -> RoaringTreemap {
    universe - bitmap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::FieldIndexer;

    struct Person {
        city: String,
    }

    fn index() -> BitmapIndex<Person> {
        BitmapIndex::new(Box::new(FieldIndexer::property("city", |p: &Person| p.city.clone())))
    }

    #[test]
    fn insert_then_equals_finds_members() {
        let idx = index();
        idx.insert(1, IndexKey::Str("hanoi".into()));
        idx.insert(2, IndexKey::Str("hanoi".into()));
        idx.insert(3, IndexKey::Str("hue".into()));
        let hanoi = idx.equals(&IndexKey::Str("hanoi".into()));
        assert!(hanoi.contains(1) && hanoi.contains(2) && !hanoi.contains(3));
    }

    #[test]
    fn remove_drops_empty_key_entirely() {
        let idx = index();
        idx.insert(1, IndexKey::Str("hanoi".into()));
        idx.remove(1, &IndexKey::Str("hanoi".into()));
        assert!(!idx.contains_key(&IndexKey::Str("hanoi".into())));
        assert_eq!(idx.distinct_key_count(), 0);
    }

    #[test]
    fn and_or_not_compose() {
        let mut a = RoaringTreemap::new();
        a.insert(1);
        a.insert(2);
        let mut b = RoaringTreemap::new();
        b.insert(2);
        b.insert(3);
        assert_eq!(and_all(&[a.clone(), b.clone()]).len(), 1);
        assert_eq!(or_all(&[a.clone(), b.clone()]).len(), 3);
        let universe = or_all(&[a.clone(), b.clone()]);
        let not_a = not_in(&a, &universe);
        assert!(not_a.contains(3) && !not_a.contains(1));
    }
}
