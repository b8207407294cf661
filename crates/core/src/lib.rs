//! Core types shared across NebulaStore.
//!
//! This crate defines the foundations the two engineered subsystems build
//! on:
//! - [`path`]: container-rooted hierarchical paths (C1)
//! - [`backend`]: the closed set of backend kinds (§9 REDESIGN FLAGS)
//! - [`validate`]: per-backend path and blob-key validators (C1)
//! - [`error`]: the unified error taxonomy (§7)
//! - [`cancel`]: cooperative cancellation (§5)
//! - [`serialize`]: the little-endian binary serialization framework (C9)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod cancel;
pub mod error;
pub mod path;
pub mod serialize;
pub mod validate;

pub use backend::BackendKind;
pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use path::Path;
pub use validate::{validator_for, Validator};
