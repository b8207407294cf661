//! The closed set of backend kinds NebulaStore can talk to (spec §9 REDESIGN FLAGS).
//!
//! The original system selected a backend by reflectively loading a type
//! named by a configuration string. That's replaced here with a closed
//! tagged enum: adding a backend means adding a variant (and a match arm
//! wherever one is required), not registering a string somewhere at
//! runtime.

/// Backend kind, used to select naming validators (§4.1) and default
/// per-backend knobs (max blob size, §3) at connector construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Local filesystem — directories are native, no marker blobs needed.
    Local,
    /// In-process in-memory backend, used for tests and for the
    /// document-store/append-log-broker kinds below (no production SDK for
    /// either was available; see `DESIGN.md`).
    Memory,
    /// S3-compatible object store (AWS S3 and API-compatible services).
    S3Compatible,
    /// Azure Blob Storage.
    Azure,
    /// Google Cloud Storage.
    Gcp,
    /// Oracle Cloud Infrastructure Object Storage.
    Oci,
    /// A generic document store (e.g. MongoDB-style collections).
    DocumentStore,
    /// An append-log broker (e.g. Kafka-style topics) used as a blob store.
    AppendLogBroker,
}

impl BackendKind {
    /// Default fragment size for this backend kind (spec §3 Blob).
    pub fn default_max_blob_size(self) -> u64 {
        match self {
            BackendKind::Local => 100 * MIB,
            BackendKind::Memory => 100 * MIB,
            BackendKind::S3Compatible | BackendKind::Azure | BackendKind::Gcp => 100 * MIB,
            BackendKind::Oci => 50 * GIB,
            BackendKind::DocumentStore => MIB,
            BackendKind::AppendLogBroker => MIB,
        }
    }

    /// Whether this backend has no native notion of a directory, and so
    /// needs `.directory` marker blobs (§3 Backend key).
    pub fn needs_directory_markers(self) -> bool {
        !matches!(self, BackendKind::Local)
    }

    /// Whether container names for this backend are lowercase-normalized
    /// before comparison (§3 Path).
    pub fn lowercase_normalized(self) -> bool {
        matches!(
            self,
            BackendKind::S3Compatible | BackendKind::Azure | BackendKind::Gcp | BackendKind::Oci
        )
    }
}

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_blob_sizes_match_spec() {
        assert_eq!(BackendKind::DocumentStore.default_max_blob_size(), MIB);
        assert_eq!(BackendKind::S3Compatible.default_max_blob_size(), 100 * MIB);
        assert_eq!(BackendKind::Oci.default_max_blob_size(), 50 * GIB);
        assert_eq!(BackendKind::AppendLogBroker.default_max_blob_size(), MIB);
    }

    #[test]
    fn local_has_no_directory_markers() {
        assert!(!BackendKind::Local.needs_directory_markers());
        assert!(BackendKind::S3Compatible.needs_directory_markers());
    }
}
