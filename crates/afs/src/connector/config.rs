//! Connector configuration (spec §6 "Connector configuration").

use std::time::Duration;

use nebula_core::BackendKind;

/// Credentials for a backend connector. Exactly one variant is relevant per
/// [`BackendKind`]; connectors ignore fields that don't apply to them.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// No credentials needed (local filesystem, in-memory).
    None,
    /// A full connection string (Azure-style).
    ConnectionString(String),
    /// Account name + key pair (Azure-style).
    AccountKey {
        /// Storage account name.
        account_name: String,
        /// Storage account key.
        account_key: String,
    },
    /// A SAS token or bearer token.
    Token(String),
    /// A config-file path plus named profile (AWS-style).
    Profile {
        /// Path to the credentials/config file.
        config_path: String,
        /// Profile name within that file.
        profile: String,
    },
    /// Bucket name alone, relying on ambient/instance credentials.
    BucketName(String),
}

/// Per-connector configuration (spec §6).
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Which backend this configuration targets.
    pub backend: BackendKind,
    /// Credentials for the backend.
    pub credentials: Credentials,
    /// Whether to enable the metadata cache (§4.3).
    pub use_cache: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts before surfacing `BackendUnavailable`.
    pub max_retry_attempts: u32,
    /// Fragment size; defaults to `backend.default_max_blob_size()`.
    pub max_blob_size: u64,
    /// Opt-in server-side encryption scope, where the backend supports it.
    pub encryption_scope: Option<String>,
    /// Cloud region override.
    pub region: Option<String>,
    /// Custom endpoint override (S3-compatible services, emulators).
    pub endpoint: Option<String>,
    /// Logical namespace override (used by document-store/append-log backends).
    pub namespace: Option<String>,
}

impl ConnectorConfig {
    /// Build a configuration with backend-appropriate defaults and no
    /// credentials, suitable for the local and in-memory connectors.
    pub fn new(backend: BackendKind) -> Self {
        ConnectorConfig {
            backend,
            credentials: Credentials::None,
            use_cache: true,
            timeout: Duration::from_secs(30),
            max_retry_attempts: 3,
            max_blob_size: backend.default_max_blob_size(),
            encryption_scope: None,
            region: None,
            endpoint: None,
            namespace: None,
        }
    }

    /// Builder-style credential setter.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Builder-style cache toggle.
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Builder-style max blob size override.
    pub fn with_max_blob_size(mut self, max_blob_size: u64) -> Self {
        self.max_blob_size = max_blob_size;
        self
    }

    /// Builder-style retry count override.
    pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = attempts;
        self
    }
}
