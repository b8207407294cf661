//! The core GigaMap collection (spec §5, C7).
//!
//! A billions-capable, indexed in-memory collection. Entities live behind
//! monotonically allocated ids; every registered bitmap and range index is
//! kept in lock-step with the entity map on every add, remove, and update.
//! A single-entity update is transactional: the candidate value is built
//! and validated entirely off to the side, and only spliced into the map
//! (and its indices) once every constraint has passed — a failed update
//! never touches the committed state.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use roaring::RoaringTreemap;
use tracing::{instrument, trace};

use crate::bitmap::BitmapIndex;
use crate::constraint::Constraint;
use crate::error::{GigaMapError, Result};
use crate::indexer::{IndexKey, Indexer, IndexerKind};
use crate::segment::IdAllocator;

/// Re-materialises a released entity's payload from its id. Given to
/// [`GigaMap::with_loader`]; without one, a released entity is simply gone
/// until re-`add`ed (see [`GigaMap::release`]).
pub type Loader<E> = Box<dyn Fn(u64) -> Option<E> + Send + Sync>;

/// An indexed, constrained, in-memory collection of entities of type `E`.
pub struct GigaMap<E> {
    entities: RwLock<HashMap<u64, E>>,
    known_ids: RwLock<HashSet<u64>>,
    id_alloc: IdAllocator,
    bitmap_indices: RwLock<HashMap<String, BitmapIndex<E>>>,
    unique_indices: RwLock<HashSet<String>>,
    constraints: RwLock<Vec<Box<dyn Constraint<E>>>>,
    loader: Option<Loader<E>>,
}

impl<E: Clone> Default for GigaMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> GigaMap<E> {
    /// Create an empty map with no indices or constraints registered.
    pub fn new() -> Self {
        GigaMap {
            entities: RwLock::new(HashMap::new()),
            known_ids: RwLock::new(HashSet::new()),
            id_alloc: IdAllocator::new(),
            bitmap_indices: RwLock::new(HashMap::new()),
            unique_indices: RwLock::new(HashSet::new()),
            constraints: RwLock::new(Vec::new()),
            loader: None,
        }
    }

    /// Create an empty map backed by `loader` for rematerialising entities
    /// dropped by [`Self::release`]. Without a loader, `release` still drops
    /// payload and preserves size/index state, but a released id can never
    /// be read back (`get` returns `None`) until it is re-`add`ed.
    pub fn with_loader(loader: impl Fn(u64) -> Option<E> + Send + Sync + 'static) -> Self {
        GigaMap { loader: Some(Box::new(loader)), ..Self::new() }
    }

    /// Register a bitmap index. Existing entities are not retroactively
    /// indexed — register indices before adding entities, or rebuild is the
    /// caller's responsibility.
    pub fn register_index(&self, indexer: Box<dyn Indexer<E>>) {
        let name = indexer.name().to_string();
        self.bitmap_indices.write().insert(name, BitmapIndex::new(indexer));
    }

    /// Register a bitmap index and enforce it as a uniqueness constraint:
    /// after this call, `add`/`set`/`update_with` reject any entity whose
    /// extracted key collides with a different entity's.
    pub fn register_unique_index(&self, indexer: Box<dyn Indexer<E>>) -> Result<()> {
        if !indexer.is_suitable_as_unique_constraint() {
            return Err(GigaMapError::ConstraintViolation {
                constraint: indexer.name().to_string(),
                message: "this indexer's key space is lossy and cannot back a uniqueness constraint"
                    .to_string(),
            });
        }
        let name = indexer.name().to_string();
        self.bitmap_indices.write().insert(name.clone(), BitmapIndex::new(indexer));
        self.unique_indices.write().insert(name);
        Ok(())
    }

    /// Register an arbitrary constraint, checked on every add and update.
    pub fn add_constraint(&self, constraint: Box<dyn Constraint<E>>) {
        self.constraints.write().push(constraint);
    }

    fn check_constraints(&self, entity: &E, existing: Option<&E>) -> Result<()> {
        for constraint in self.constraints.read().iter() {
            constraint.check(entity, existing)?;
        }
        Ok(())
    }

    fn check_unique_indices(&self, entity: &E, self_id: Option<u64>) -> Result<()> {
        let bitmap_indices = self.bitmap_indices.read();
        for name in self.unique_indices.read().iter() {
            let index = bitmap_indices.get(name).expect("unique index is registered");
            let Some(key) = index.key_for(entity) else { continue };
            let occupants = index.equals(&key);
            let conflict = match self_id {
                Some(id) => occupants.len() > 1 || (occupants.len() == 1 && !occupants.contains(id)),
                None => !occupants.is_empty(),
            };
            if conflict {
                return Err(GigaMapError::DuplicateKey { indexer: name.clone() });
            }
        }
        Ok(())
    }

    fn index_key_for(index: &BitmapIndex<E>, id: u64, entity: &E) -> Option<IndexKey> {
        if index.indexer_kind() == IndexerKind::Identity {
            Some(IndexKey::Id(id))
        } else {
            index.key_for(entity)
        }
    }

    fn index_insert(&self, id: u64, entity: &E) {
        for index in self.bitmap_indices.read().values() {
            if let Some(key) = Self::index_key_for(index, id, entity) {
                index.insert(id, key);
            }
        }
    }

    fn index_remove(&self, id: u64, entity: &E) {
        for index in self.bitmap_indices.read().values() {
            if let Some(key) = Self::index_key_for(index, id, entity) {
                index.remove(id, &key);
            }
        }
    }

    /// Insert `entity`, allocating a fresh id. Fails, leaving the map
    /// unchanged, if any constraint or unique index rejects it.
    #[instrument(skip(self, entity))]
    pub fn add(&self, entity: E) -> Result<u64> {
        self.check_constraints(&entity, None)?;
        self.check_unique_indices(&entity, None)?;
        let id = self.id_alloc.allocate();
        self.entities.write().insert(id, entity.clone());
        self.known_ids.write().insert(id);
        self.index_insert(id, &entity);
        trace!(id, "entity added");
        Ok(id)
    }

    /// Fetch a copy of the entity at `id`. If `id` was dropped by a prior
    /// [`Self::release`] and this map has a loader, it is rematerialised and
    /// cached on the way out.
    pub fn get(&self, id: u64) -> Option<E> {
        if let Some(entity) = self.entities.read().get(&id).cloned() {
            return Some(entity);
        }
        if !self.known_ids.read().contains(&id) {
            return None;
        }
        let loader = self.loader.as_ref()?;
        let entity = loader(id)?;
        self.entities.write().insert(id, entity.clone());
        Some(entity)
    }

    /// Whether `id` is present, counting ids whose payload is currently
    /// released but whose size/index state survives (spec §4.7 "Release").
    pub fn contains(&self, id: u64) -> bool {
        self.known_ids.read().contains(&id)
    }

    /// Remove and return the entity at `id`.
    #[instrument(skip(self))]
    pub fn remove(&self, id: u64) -> Result<E> {
        let entity = self.get(id).ok_or(GigaMapError::NotFound(id))?;
        self.known_ids.write().remove(&id);
        self.entities.write().remove(&id);
        self.index_remove(id, &entity);
        Ok(entity)
    }

    /// Replace the entity at `id` with `new_entity` wholesale. Equivalent to
    /// `update_with(id, |e| *e = new_entity)` but avoids requiring the
    /// caller to already have the old value in hand.
    #[instrument(skip(self, new_entity))]
    pub fn set(&self, id: u64, new_entity: E) -> Result<()> {
        self.update_with(id, move |slot| *slot = new_entity)
    }

    /// Apply `mutator` to the entity at `id`, transactionally: `mutator`
    /// runs against a private clone, the clone is validated against every
    /// constraint and unique index, and only on success is it spliced back
    /// into the map and its indices. A failing mutation leaves the
    /// committed entity and every index untouched — there is nothing to
    /// roll back because nothing was mutated in place.
    #[instrument(skip(self, mutator))]
    pub fn update_with(&self, id: u64, mutator: impl FnOnce(&mut E)) -> Result<()> {
        let old = self.get(id).ok_or(GigaMapError::NotFound(id))?;
        let mut candidate = old.clone();
        mutator(&mut candidate);

        self.check_constraints(&candidate, Some(&old))?;
        self.check_unique_indices(&candidate, Some(id))?;

        self.index_remove(id, &old);
        self.entities.write().insert(id, candidate.clone());
        self.index_insert(id, &candidate);
        Ok(())
    }

    /// Number of entities currently stored (released-but-known ids still
    /// count — release only drops payload, never size, per spec §4.7).
    pub fn len(&self) -> usize {
        self.known_ids.read().len()
    }

    /// Whether the map holds no entities.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every id currently in the map, ascending.
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.known_ids.read().iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Ids matching `key` on the named bitmap index.
    pub fn ids_matching(&self, index_name: &str, key: &IndexKey) -> Result<RoaringTreemap> {
        self.bitmap_indices
            .read()
            .get(index_name)
            .map(|index| index.equals(key))
            .ok_or_else(|| GigaMapError::UnknownIndex(index_name.to_string()))
    }

    /// Start a query matching every entity (see [`crate::query::Query`]).
    pub fn query(&self) -> crate::query::Query<'_, E> {
        crate::query::Query::all(self)
    }

    /// Start a query matching entities indexed under `key` on `index`.
    pub fn query_eq(&self, index: impl Into<String>, key: IndexKey) -> crate::query::Query<'_, E> {
        crate::query::Query::eq(self, index, key)
    }

    /// Drop every entity's materialised payload while preserving size and
    /// index state (spec §4.7): `len`/`ids`/`contains`/`ids_matching` all
    /// read the same after `release` as before it, and the next `get` on a
    /// released id rematerialises it through this map's loader, if any.
    /// Registered indices, unique constraints, and the id allocator are
    /// untouched.
    #[instrument(skip(self))]
    pub fn release(&self) {
        self.entities.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::FieldIndexer;

    #[derive(Clone, Debug, PartialEq)]
    struct Person {
        email: String,
        age: i64,
    }

    fn map_with_unique_email() -> GigaMap<Person> {
        let map = GigaMap::new();
        map.register_unique_index(Box::new(FieldIndexer::property("email", |p: &Person| {
            p.email.clone()
        })))
        .unwrap();
        map
    }

    #[test]
    fn add_then_get_round_trips() {
        let map = GigaMap::new();
        let id = map
            .add(Person { email: "a@example.com".into(), age: 30 })
            .unwrap();
        assert_eq!(map.get(id), Some(Person { email: "a@example.com".into(), age: 30 }));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn unique_index_rejects_duplicate_on_add() {
        let map = map_with_unique_email();
        map.add(Person { email: "a@example.com".into(), age: 30 }).unwrap();
        let err = map
            .add(Person { email: "a@example.com".into(), age: 40 })
            .unwrap_err();
        assert!(matches!(err, GigaMapError::DuplicateKey { .. }));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn unique_index_allows_update_that_keeps_same_key() {
        let map = map_with_unique_email();
        let id = map.add(Person { email: "a@example.com".into(), age: 30 }).unwrap();
        map.update_with(id, |p| p.age = 31).unwrap();
        assert_eq!(map.get(id).unwrap().age, 31);
    }

    #[test]
    fn failed_update_rolls_back_leaving_entity_and_indices_untouched() {
        let map = map_with_unique_email();
        let first = map.add(Person { email: "a@example.com".into(), age: 30 }).unwrap();
        let second = map.add(Person { email: "b@example.com".into(), age: 40 }).unwrap();

        let result = map.update_with(second, |p| p.email = "a@example.com".to_string());
        assert!(matches!(result, Err(GigaMapError::DuplicateKey { .. })));

        assert_eq!(map.get(second).unwrap().email, "b@example.com");
        assert_eq!(map.get(first).unwrap().email, "a@example.com");
    }

    #[test]
    fn remove_then_readd_with_same_key_succeeds() {
        let map = map_with_unique_email();
        let id = map.add(Person { email: "a@example.com".into(), age: 30 }).unwrap();
        map.remove(id).unwrap();
        assert!(map.get(id).is_none());
        let new_id = map.add(Person { email: "a@example.com".into(), age: 99 }).unwrap();
        assert_ne!(id, new_id);
    }

    #[test]
    fn ids_matching_queries_bitmap_index_by_key() {
        let map = GigaMap::new();
        map.register_index(Box::new(FieldIndexer::numeric("age", |p: &Person| p.age)));
        map.add(Person { email: "a@example.com".into(), age: 30 }).unwrap();
        map.add(Person { email: "b@example.com".into(), age: 30 }).unwrap();
        map.add(Person { email: "c@example.com".into(), age: 40 }).unwrap();
        let thirty = map.ids_matching("age", &IndexKey::I64(30)).unwrap();
        assert_eq!(thirty.len(), 2);
    }

    #[test]
    fn release_drops_payload_but_preserves_size_and_index_state() {
        let map = GigaMap::new();
        map.register_index(Box::new(FieldIndexer::numeric("age", |p: &Person| p.age)));
        let id = map.add(Person { email: "a@example.com".into(), age: 30 }).unwrap();
        map.release();
        assert_eq!(map.len(), 1);
        assert!(map.contains(id));
        assert_eq!(map.ids(), vec![id]);
        assert_eq!(map.ids_matching("age", &IndexKey::I64(30)).unwrap().len(), 1);
        assert_eq!(map.get(id), None, "no loader configured, payload cannot rematerialise");
    }

    #[test]
    fn release_rematerialises_through_loader_on_next_access() {
        use std::sync::{Arc, Mutex};

        let backing: Arc<Mutex<HashMap<u64, Person>>> = Arc::new(Mutex::new(HashMap::new()));
        let loader_backing = Arc::clone(&backing);
        let map = GigaMap::with_loader(move |id| loader_backing.lock().unwrap().get(&id).cloned());

        let id = map.add(Person { email: "a@example.com".into(), age: 30 }).unwrap();
        backing.lock().unwrap().insert(id, Person { email: "a@example.com".into(), age: 30 });
        map.release();

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(id), Some(Person { email: "a@example.com".into(), age: 30 }));
    }
}
