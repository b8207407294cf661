//! NebulaStore: an embedded object-persistence engine.
//!
//! This crate is a thin façade over two independent subsystems, each its
//! own workspace member:
//!
//! - [`nebula_core`] — shared primitives: paths, backend kinds, the binary
//!   serialization framework, validation, cancellation, and the unified
//!   error type.
//! - [`nebula_afs`] — the Abstract File System: logical file semantics
//!   reconstructed over fragmented numbered blobs on pluggable backends.
//! - [`nebula_gigamap`] — GigaMap: a billions-capable, indexed in-memory
//!   collection with bitmap and range indices, constraints, transactional
//!   single-entity updates, and a compressed query-result cache.
//!
//! [`root_object`] ties AFS to the object model a database built on top of
//! it needs: one root object, plus id-addressed object pages underneath it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod root_object;

pub use nebula_afs as afs;
pub use nebula_core as core;
pub use nebula_gigamap as gigamap;

pub use nebula_core::{BackendKind, CancellationToken, Error, Path, Result};
pub use root_object::{ObjectStorer, RootObject};
