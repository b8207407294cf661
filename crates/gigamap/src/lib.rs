//! GigaMap: a billions-capable, indexed in-memory collection (spec §5).
//!
//! Entities are stored behind monotonically allocated ids (never hash
//! codes, so ascending-id iteration is free). [`bitmap`] provides
//! equality/membership indices backed by roaring bitmaps; [`btree`]
//! provides ordered range indices; [`constraint`] lets callers reject
//! invalid entities before they ever reach the map; [`query`] composes
//! bitmap lookups into AND/OR conditions; [`cache`] memoizes compressed
//! query results. [`GigaMap`] is the façade tying all of it together.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bitmap;
mod btree;
mod cache;
mod constraint;
mod error;
mod gigamap;
mod indexer;
mod query;
mod segment;

pub use bitmap::{and_all, not_in, or_all, BitmapIndex, BitmapIndexState};
pub use btree::{BTreeRangeIndex, BTreeStats, IdSet};
pub use cache::{CompressionLevel, QueryCache, SWEEP_INTERVAL};
pub use constraint::{Constraint, CustomConstraint};
pub use error::{GigaMapError, Result};
pub use gigamap::{GigaMap, Loader};
pub use indexer::{FieldIndexer, IndexKey, Indexer, IndexerKind};
pub use query::{Query, QueryNode};
pub use segment::{tier_of, IdAllocator, SegmentTier};
