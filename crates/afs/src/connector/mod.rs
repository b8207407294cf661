//! Backend-agnostic connector contract (spec §4.3).
//!
//! A [`Connector`] exposes opaque key/value primitives over one backend.
//! Everything above this layer (the blob codec, fragmented file I/O) is
//! backend-agnostic; only this trait and its implementations know how to
//! talk to a specific kind of store.

mod cache;
mod config;
mod error;
mod local;
mod memory;
mod object_store_backend;
mod retry;

pub use cache::{CachedMeta, MetadataCache};
pub use config::{ConnectorConfig, Credentials};
pub use error::ConnectorError;
pub use local::LocalConnector;
pub use memory::MemoryConnector;
pub use object_store_backend::ObjectStoreConnector;
pub use retry::with_retry;

use nebula_core::BackendKind;

/// Result type for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Backend-agnostic connector operations (spec §4.3).
///
/// Implementations must convert backend "not found" conditions into the
/// typed defaults documented per method — never into an error — and must
/// make `put`/`delete` idempotent so retries are safe.
pub trait Connector: Send + Sync {
    /// Which backend kind this connector talks to.
    fn kind(&self) -> BackendKind;

    /// Size in bytes of the object at `key`. Soft-NotFound: `0`.
    fn size(&self, key: &str) -> Result<u64>;

    /// Whether an object exists at `key`. Soft-NotFound: `false`.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Read up to `length` bytes starting at `offset`. `length = None` means
    /// "to end". Soft-NotFound: empty. Never returns a gap — if the object
    /// is shorter than requested, the returned slice is shorter too.
    fn read_range(&self, key: &str, offset: u64, length: Option<u64>) -> Result<Vec<u8>>;

    /// Write `data` to `key`, replacing any existing object at that key.
    /// Must be safe to retry (idempotent put-overwrite).
    fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Delete the object at `key`. Idempotent: deleting a nonexistent key
    /// is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// List all keys with the given prefix, in no particular order (callers
    /// that need ordinal order sort the results themselves — see the blob
    /// codec).
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Attempt a backend-native copy from `src_key` to `dst_key`. Returns
    /// `Ok(true)` if the backend performed the copy natively, `Ok(false)`
    /// if this connector has no native copy and the caller should fall back
    /// to read+write (§4.4 Copy algorithm).
    fn native_copy(&self, _src_key: &str, _dst_key: &str) -> Result<bool> {
        Ok(false)
    }
}
