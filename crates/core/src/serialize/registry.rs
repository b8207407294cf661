//! Per-serialization-context object-id registry (spec §4.9, §9).
//!
//! The original system kept a single mutable object-id table as a process
//! global. Per the redesign flags in §9, that's replaced with a registry
//! owned by whoever is doing the serializing — typically one per commit or
//! one per root-object write — and passed explicitly rather than reached
//! for implicitly.

use std::collections::HashMap;
use std::hash::Hash;

use crate::serialize::format::{NULL_OBJECT_ID, ROOT_OBJECT_ID};

/// Assigns stable object ids within the scope of one serialization pass.
///
/// `K` is whatever the caller uses to identify "the same object" across
/// multiple references in one payload (e.g. a pointer identity wrapper, or
/// a content hash). Id `0` is reserved for null and is never assigned; id
/// `1` is reserved for the root object and is assigned by [`ObjectIdRegistry::root`].
pub struct ObjectIdRegistry<K> {
    ids: HashMap<K, u64>,
    next_id: u64,
}

impl<K: Eq + Hash + Clone> ObjectIdRegistry<K> {
    /// Create a new, empty registry. The next id handed out after the root
    /// is registered will be `2`.
    pub fn new() -> Self {
        ObjectIdRegistry {
            ids: HashMap::new(),
            next_id: ROOT_OBJECT_ID + 1,
        }
    }

    /// Register `key` as the root object, fixing its id at `1`.
    ///
    /// # Panics
    ///
    /// Panics if a root has already been registered with a different key,
    /// or if `key` was already registered as a non-root object — both
    /// indicate a caller bug (registries are scoped to a single pass).
    pub fn root(&mut self, key: K) -> u64 {
        match self.ids.get(&key) {
            Some(&id) if id == ROOT_OBJECT_ID => ROOT_OBJECT_ID,
            Some(&id) => panic!("key already registered with id {id}, cannot become root"),
            None => {
                self.ids.insert(key, ROOT_OBJECT_ID);
                ROOT_OBJECT_ID
            }
        }
    }

    /// Get the id already assigned to `key`, if any.
    pub fn lookup(&self, key: &K) -> Option<u64> {
        self.ids.get(key).copied()
    }

    /// Assign `key` an id if it doesn't have one yet, returning
    /// `(id, is_new)`. `is_new` tells the caller whether it still needs to
    /// serialize the referent (a second reference to the same object only
    /// needs to write the reference, not the payload again).
    pub fn assign(&mut self, key: K) -> (u64, bool) {
        if let Some(&id) = self.ids.get(&key) {
            return (id, false);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(key, id);
        (id, true)
    }

    /// Number of objects registered so far (root included, null excluded).
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no objects have been registered yet.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for ObjectIdRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience constant re-exported for callers matching on ids by hand.
pub const NULL_ID: u64 = NULL_OBJECT_ID;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_gets_id_one() {
        let mut reg: ObjectIdRegistry<&str> = ObjectIdRegistry::new();
        assert_eq!(reg.root("root-entity"), 1);
        assert_eq!(reg.lookup(&"root-entity"), Some(1));
    }

    #[test]
    fn subsequent_objects_start_at_two() {
        let mut reg: ObjectIdRegistry<&str> = ObjectIdRegistry::new();
        reg.root("root-entity");
        let (id, is_new) = reg.assign("child-a");
        assert_eq!(id, 2);
        assert!(is_new);
    }

    #[test]
    fn repeated_assign_returns_same_id_and_is_new_false() {
        let mut reg: ObjectIdRegistry<&str> = ObjectIdRegistry::new();
        let (first, _) = reg.assign("shared");
        let (second, is_new) = reg.assign("shared");
        assert_eq!(first, second);
        assert!(!is_new);
    }

    #[test]
    #[should_panic]
    fn rooting_a_key_already_assigned_elsewhere_panics() {
        let mut reg: ObjectIdRegistry<&str> = ObjectIdRegistry::new();
        reg.assign("already-assigned");
        reg.root("already-assigned");
    }
}
