//! Indexer definitions (spec §5, bitmap and range indices).
//!
//! An [`Indexer`] extracts a comparable, hashable key from an entity. Every
//! bitmap and range index in a [`crate::GigaMap`] is built from one.
//! `Identity` is the odd one out: it has no extraction function because its
//! key *is* the entity's allocated id, which only the map itself knows at
//! insert time.

use uuid::Uuid;

/// The value extracted from an entity by an [`Indexer`].
///
/// Deliberately a closed, small set of variants rather than a generic type
/// parameter — every index built on top (bitmap, range) needs `Eq + Hash`
/// or `Ord`, and mixing extraction types within one index would make the
/// index's own key type change shape at runtime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    /// A `Property`/`StringIgnoreCase` extraction.
    Str(String),
    /// A `Numeric`/`DateTime` extraction (`DateTime` stores 100ns ticks).
    I64(i64),
    /// A `Guid` extraction.
    Guid(Uuid),
    /// The entity's own allocated id (`Identity` indexer).
    Id(u64),
}

/// What kind of field an [`Indexer`] was built to extract. Carried purely
/// for diagnostics (error messages, `Debug` output) — the extraction logic
/// itself lives in the closure captured at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexerKind {
    /// Exact-match string property.
    Property,
    /// Case-insensitive string property.
    StringIgnoreCase,
    /// Signed integer property.
    Numeric,
    /// 100ns-tick timestamp property.
    DateTime,
    /// GUID property.
    Guid,
    /// The entity's own allocated id.
    Identity,
}

/// Extracts an [`IndexKey`] from an entity of type `E`.
pub trait Indexer<E>: Send + Sync {
    /// Name this indexer is registered under. Used as the index name and in
    /// constraint error messages.
    fn name(&self) -> &str;

    /// What kind of extraction this is.
    fn kind(&self) -> IndexerKind;

    /// Extract the key for `entity`. `None` means the entity has no value
    /// for this index (the entity is simply omitted from it).
    fn key_of(&self, entity: &E) -> Option<IndexKey>;

    /// Whether this indexer may back a uniqueness constraint. `false` for
    /// indexers whose key space is intentionally lossy (e.g.
    /// `StringIgnoreCase` over a field that two distinct entities may
    /// legitimately share case-insensitively) — callers may still attempt
    /// to register one as unique, but `GigaMap` surfaces that as a
    /// programmer error rather than quietly allowing collisions.
    fn is_suitable_as_unique_constraint(&self) -> bool {
        true
    }
}

type Extractor<E> = Box<dyn Fn(&E) -> Option<IndexKey> + Send + Sync>;

/// An [`Indexer`] built from a name, a [`IndexerKind`], and an extraction
/// closure. Constructed via the `Indexer::<E>::property`-style associated
/// functions below rather than directly.
pub struct FieldIndexer<E> {
    name: String,
    kind: IndexerKind,
    extract: Extractor<E>,
}

impl<E> FieldIndexer<E> {
    /// Index entities by an exact-match string property.
    pub fn property(name: impl Into<String>, f: impl Fn(&E) -> String + Send + Sync + 'static) -> Self {
        FieldIndexer {
            name: name.into(),
            kind: IndexerKind::Property,
            extract: Box::new(move |e| Some(IndexKey::Str(f(e)))),
        }
    }

    /// Index entities by a string property, folded to lowercase.
    pub fn string_ignore_case(
        name: impl Into<String>,
        f: impl Fn(&E) -> String + Send + Sync + 'static,
    ) -> Self {
        FieldIndexer {
            name: name.into(),
            kind: IndexerKind::StringIgnoreCase,
            extract: Box::new(move |e| Some(IndexKey::Str(f(e).to_lowercase()))),
        }
    }

    /// Index entities by a signed-integer property.
    pub fn numeric(name: impl Into<String>, f: impl Fn(&E) -> i64 + Send + Sync + 'static) -> Self {
        FieldIndexer {
            name: name.into(),
            kind: IndexerKind::Numeric,
            extract: Box::new(move |e| Some(IndexKey::I64(f(e)))),
        }
    }

    /// Index entities by a 100ns-tick timestamp property
    /// ([`nebula_core::serialize::write_datetime`]'s tick convention).
    pub fn datetime(name: impl Into<String>, f: impl Fn(&E) -> i64 + Send + Sync + 'static) -> Self {
        FieldIndexer {
            name: name.into(),
            kind: IndexerKind::DateTime,
            extract: Box::new(move |e| Some(IndexKey::I64(f(e)))),
        }
    }

    /// Index entities by a GUID property.
    pub fn guid(name: impl Into<String>, f: impl Fn(&E) -> Uuid + Send + Sync + 'static) -> Self {
        FieldIndexer {
            name: name.into(),
            kind: IndexerKind::Guid,
            extract: Box::new(move |e| Some(IndexKey::Guid(f(e)))),
        }
    }

    /// Index entities by their own allocated id. `GigaMap` special-cases
    /// this indexer, supplying the id itself rather than calling
    /// `key_of` with an entity reference.
    pub fn identity(name: impl Into<String>) -> Self {
        FieldIndexer {
            name: name.into(),
            kind: IndexerKind::Identity,
            extract: Box::new(|_| None),
        }
    }
}

impl<E> Indexer<E> for FieldIndexer<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> IndexerKind {
        self.kind
    }

    fn key_of(&self, entity: &E) -> Option<IndexKey> {
        (self.extract)(entity)
    }

    fn is_suitable_as_unique_constraint(&self) -> bool {
        !matches!(self.kind, IndexerKind::StringIgnoreCase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person {
        email: String,
        age: i64,
    }

    #[test]
    fn property_indexer_extracts_exact_string() {
        let idx = FieldIndexer::property("email", |p: &Person| p.email.clone());
        let p = Person { email: "A@Example.com".into(), age: 30 };
        assert_eq!(idx.key_of(&p), Some(IndexKey::Str("A@Example.com".to_string())));
    }

    #[test]
    fn string_ignore_case_lowercases() {
        let idx = FieldIndexer::string_ignore_case("email_ci", |p: &Person| p.email.clone());
        let p = Person { email: "A@Example.com".into(), age: 30 };
        assert_eq!(idx.key_of(&p), Some(IndexKey::Str("a@example.com".to_string())));
        assert!(!idx.is_suitable_as_unique_constraint());
    }

    #[test]
    fn numeric_indexer_extracts_i64() {
        let idx = FieldIndexer::numeric("age", |p: &Person| p.age);
        let p = Person { email: "x".into(), age: 42 };
        assert_eq!(idx.key_of(&p), Some(IndexKey::I64(42)));
    }

    #[test]
    fn identity_indexer_never_extracts_from_entity() {
        let idx: FieldIndexer<Person> = FieldIndexer::identity("id");
        let p = Person { email: "x".into(), age: 1 };
        assert_eq!(idx.key_of(&p), None);
        assert_eq!(idx.kind(), IndexerKind::Identity);
    }
}
