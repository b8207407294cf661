//! Per-backend path and blob-key validators (spec §4.1).
//!
//! `Path::validate` is deliberately not a method on `Path` itself — the
//! rules differ per backend, so validation is dispatched through a
//! `Validator` chosen by `BackendKind`, not baked into the path type.

use crate::backend::BackendKind;
use crate::error::{Error, Result};
use crate::path::Path;

const RESERVED_CONTAINER_NAMES: &[&str] = &["$root", "$web", "$logs"];
const FORBIDDEN_KEY_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];
const MAX_OBJECT_STORE_KEY_LEN: usize = 1024;

/// Validates a [`Path`] against one backend's naming rules.
pub trait Validator {
    /// Validate the whole path: container naming plus every key element.
    fn validate(&self, path: &Path) -> Result<()>;
}

/// Returns the validator appropriate for a given backend kind.
pub fn validator_for(kind: BackendKind) -> Box<dyn Validator> {
    match kind {
        BackendKind::Local => Box::new(GenericValidator { kind }),
        BackendKind::Memory => Box::new(GenericValidator { kind }),
        BackendKind::S3Compatible | BackendKind::Azure | BackendKind::Gcp => {
            Box::new(GenericValidator { kind })
        }
        BackendKind::Oci => Box::new(OciValidator),
        BackendKind::DocumentStore => Box::new(DocumentStoreValidator),
        BackendKind::AppendLogBroker => Box::new(GenericValidator { kind }),
    }
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidPath(reason.into())
}

/// Checks shared by every backend's blob-key validation (spec §4.1 "Blob
/// key validators").
fn validate_key_common(element: &str) -> Result<()> {
    if element.is_empty() {
        return Err(invalid("path element must not be empty"));
    }
    if element.len() > MAX_OBJECT_STORE_KEY_LEN {
        return Err(invalid(format!(
            "path element exceeds {MAX_OBJECT_STORE_KEY_LEN} bytes"
        )));
    }
    if element == "." || element == ".." {
        return Err(invalid("path element must not be bare '.' or '..'"));
    }
    if element.chars().any(|c| {
        matches!(c as u32, 0x00..=0x1F | 0x7F..=0x9F) || FORBIDDEN_KEY_CHARS.contains(&c)
    }) {
        return Err(invalid(
            "path element contains a control or forbidden character",
        ));
    }
    if element.starts_with(' ') || element.starts_with('\t') {
        return Err(invalid("path element must not start with whitespace"));
    }
    if element.ends_with(' ') || element.ends_with('\t') {
        return Err(invalid("path element must not end with whitespace"));
    }
    if element.ends_with('.') {
        return Err(invalid("path element must not end with a dot"));
    }
    Ok(())
}

/// Shared container-naming checks: alphanumeric and dashes, length bounds,
/// reserved names.
fn validate_container_common(container: &str) -> Result<()> {
    if container.len() < 3 || container.len() > 63 {
        return Err(invalid(
            "container name must be between 3 and 63 characters",
        ));
    }
    if RESERVED_CONTAINER_NAMES.contains(&container) {
        return Err(invalid(format!("'{container}' is a reserved container name")));
    }
    if !container
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(invalid(
            "container name must contain only alphanumeric characters and dashes",
        ));
    }
    Ok(())
}

/// Validator for backends with plain alphanumeric-and-dash container rules:
/// local filesystem, in-memory, S3-compatible, Azure, GCP, append-log
/// brokers. These differ only in whether names are later lowercased for
/// comparison (`BackendKind::lowercase_normalized`), which is not a
/// validation concern.
struct GenericValidator {
    kind: BackendKind,
}

impl Validator for GenericValidator {
    fn validate(&self, path: &Path) -> Result<()> {
        let _ = self.kind;
        validate_container_common(path.container())?;
        for element in path.key_elements() {
            validate_key_common(element)?;
        }
        Ok(())
    }
}

/// OCI allows dots in container names but rejects consecutive dots.
struct OciValidator;

impl Validator for OciValidator {
    fn validate(&self, path: &Path) -> Result<()> {
        let container = path.container();
        if container.len() < 3 || container.len() > 63 {
            return Err(invalid(
                "container name must be between 3 and 63 characters",
            ));
        }
        if RESERVED_CONTAINER_NAMES.contains(&container) {
            return Err(invalid(format!("'{container}' is a reserved container name")));
        }
        if !container
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(invalid(
                "container name must contain only alphanumeric characters, dashes, and dots",
            ));
        }
        if container.contains("..") {
            return Err(invalid("container name must not contain consecutive dots"));
        }
        for element in path.key_elements() {
            validate_key_common(element)?;
        }
        Ok(())
    }
}

/// Document-store collections reject `/`, `.`, `..`, and the `__...__`
/// dunder pattern some document stores reserve for system collections.
struct DocumentStoreValidator;

impl Validator for DocumentStoreValidator {
    fn validate(&self, path: &Path) -> Result<()> {
        let container = path.container();
        validate_container_common(container)?;
        if container.contains('/') || container == "." || container == ".." {
            return Err(invalid(
                "document-store collection must not contain '/', '.', or '..'",
            ));
        }
        if container.starts_with("__") && container.ends_with("__") && container.len() > 4 {
            return Err(invalid(
                "document-store collection must not match the reserved '__...__' pattern",
            ));
        }
        for element in path.key_elements() {
            validate_key_common(element)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_reserved_container_name() {
        let v = validator_for(BackendKind::S3Compatible);
        let p = Path::root("$root");
        assert!(v.validate(&p).is_err());
    }

    #[test]
    fn rejects_control_characters_in_key() {
        let v = validator_for(BackendKind::S3Compatible);
        let p = Path::new("bucket-ok", vec!["bad\u{0000}name".to_string()]);
        assert!(v.validate(&p).is_err());
    }

    #[test]
    fn rejects_trailing_dot() {
        let v = validator_for(BackendKind::Local);
        let p = Path::new("container", vec!["file.".to_string()]);
        assert!(v.validate(&p).is_err());
    }

    #[test]
    fn oci_rejects_consecutive_dots_but_allows_single_dots() {
        let v = validator_for(BackendKind::Oci);
        assert!(v.validate(&Path::root("my.bucket.name")).is_ok());
        assert!(v.validate(&Path::root("my..bucket")).is_err());
    }

    #[test]
    fn document_store_rejects_dunder_collection() {
        let v = validator_for(BackendKind::DocumentStore);
        assert!(v.validate(&Path::root("__system__")).is_err());
        assert!(v.validate(&Path::root("normal-col")).is_ok());
    }

    #[test]
    fn accepts_well_formed_path() {
        let v = validator_for(BackendKind::S3Compatible);
        let p = Path::new("my-bucket", vec!["dir".to_string(), "file.txt".to_string()]);
        assert!(v.validate(&p).is_ok());
    }
}
