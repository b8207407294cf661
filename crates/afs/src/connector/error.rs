//! Connector-level errors (spec §4.3, §7).

use thiserror::Error;

/// Errors a [`super::Connector`] implementation may raise.
///
/// Backend "not found" conditions are *not* represented here — per §4.3
/// they are converted by the connector itself into typed defaults
/// (`size -> 0`, `exists -> false`, `read_range -> empty`) before ever
/// reaching a caller.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The backend could not be reached after exhausting retries (§4.3, §7).
    #[error("backend unavailable after {attempts} attempt(s): {cause}")]
    Unavailable {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Underlying cause, as reported by the backend SDK.
        cause: String,
    },

    /// The backend reported an error not covered by a soft-NotFound
    /// conversion or retryable classification.
    #[error("backend error: {0}")]
    Backend(String),

    /// Local I/O failure (filesystem backend).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation's `CancellationToken` was cancelled before it ran to
    /// completion (§5). Any blobs already written or deleted before
    /// cancellation was observed remain as-is — cancellation is advisory,
    /// not transactional.
    #[error("operation cancelled")]
    Cancelled,

    /// Blob enumeration for `path` found a non-dense ordinal sequence: the
    /// listed ordinals are not exactly `0..len` (§3 Blob invariant, §7).
    #[error("corrupt blob sequence at {path}, ordinal {ordinal}")]
    CorruptBlob {
        /// Logical path whose blob sequence is inconsistent.
        path: String,
        /// First ordinal at which the expected dense sequence breaks.
        ordinal: u64,
    },
}

impl From<ConnectorError> for nebula_core::Error {
    fn from(e: ConnectorError) -> Self {
        match e {
            ConnectorError::Unavailable { cause, .. } => nebula_core::Error::BackendUnavailable(cause),
            ConnectorError::Backend(msg) => nebula_core::Error::BackendUnavailable(msg),
            ConnectorError::Io(io) => nebula_core::Error::Io(io),
            ConnectorError::Cancelled => nebula_core::Error::Cancelled,
            ConnectorError::CorruptBlob { path, ordinal } => {
                nebula_core::Error::CorruptBlob { path, ordinal }
            }
        }
    }
}
