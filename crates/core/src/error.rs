//! Error taxonomy shared across NebulaStore (see spec §7).
//!
//! `Error` is the unified type higher layers see once a lower-layer error
//! crosses a crate boundary. Each subsystem crate (`nebula-afs`,
//! `nebula-gigamap`) defines its own focused error enum and converts into
//! this one via `#[from]`, rather than depending on each other's error type
//! directly.

use thiserror::Error;

/// Result type alias for NebulaStore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for NebulaStore.
///
/// Soft conditions (`NotFound`, `CacheMiss`) are deliberately internal to the
/// connector/cache layers and are never constructed here — per §4.3/§7 they
/// are absorbed into typed defaults before reaching this level.
#[derive(Debug, Error)]
pub enum Error {
    /// Path failed validation (§4.1).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Connector could not reach the backend after exhausting retries (§4.3, §7).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A unique or custom constraint rejected a GigaMap write (§3 Constraints).
    #[error("constraint violation in {constraint}: {message}")]
    ConstraintViolation {
        /// Name of the violated constraint.
        constraint: String,
        /// Human-readable detail.
        message: String,
    },

    /// A unique range-index `put` collided with an existing key (§4.6).
    #[error("duplicate key")]
    DuplicateKey,

    /// Blob enumeration found a non-dense or non-numeric ordinal sequence (§3 Blob invariant).
    #[error("corrupt blob sequence at {path}, ordinal {ordinal}")]
    CorruptBlob {
        /// Logical path whose blob sequence is inconsistent.
        path: String,
        /// Ordinal at which the inconsistency was detected.
        ordinal: u64,
    },

    /// Operation was cancelled via a `CancellationToken` (§5).
    #[error("operation cancelled")]
    Cancelled,

    /// Underlying I/O failure not covered by a more specific variant.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failed operation is safe to retry.
    ///
    /// Per §7: all reads and idempotent writes are retriable; validation and
    /// constraint failures are not (retrying them deterministically repeats
    /// the same failure).
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::BackendUnavailable(_) | Error::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_classification() {
        assert!(Error::BackendUnavailable("timeout".into()).is_retriable());
        assert!(!Error::DuplicateKey.is_retriable());
        assert!(!Error::InvalidPath("bad".into()).is_retriable());
    }

    #[test]
    fn display_messages_are_informative() {
        let err = Error::CorruptBlob {
            path: "bkt/large.dat".into(),
            ordinal: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("bkt/large.dat"));
        assert!(msg.contains('3'));
    }
}
