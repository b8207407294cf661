//! GigaMap errors (spec §7).

use thiserror::Error;

/// Errors raised by a [`crate::GigaMap`].
#[derive(Debug, Error)]
pub enum GigaMapError {
    /// An entity failed a registered constraint check. The entity was never
    /// inserted (or, for an update, the update was rolled back).
    #[error("constraint '{constraint}' violated: {message}")]
    ConstraintViolation {
        /// Name of the violated constraint.
        constraint: String,
        /// Human-readable detail.
        message: String,
    },

    /// A unique-indexed value collided with an existing entity.
    #[error("duplicate key for unique indexer '{indexer}'")]
    DuplicateKey {
        /// Name of the unique indexer that rejected the insert/update.
        indexer: String,
    },

    /// The referenced entity id does not exist in the map.
    #[error("no entity with id {0}")]
    NotFound(u64),

    /// A named index was queried or registered under a name that does not
    /// exist, or was registered twice.
    #[error("no such index '{0}'")]
    UnknownIndex(String),
}

impl From<GigaMapError> for nebula_core::Error {
    fn from(e: GigaMapError) -> Self {
        match &e {
            GigaMapError::ConstraintViolation { constraint, message } => {
                nebula_core::Error::ConstraintViolation {
                    constraint: constraint.clone(),
                    message: message.clone(),
                }
            }
            GigaMapError::DuplicateKey { .. } => nebula_core::Error::DuplicateKey,
            GigaMapError::NotFound(_) | GigaMapError::UnknownIndex(_) => {
                nebula_core::Error::ConstraintViolation {
                    constraint: "lookup".to_string(),
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Result type for GigaMap operations.
pub type Result<T> = std::result::Result<T, GigaMapError>;
