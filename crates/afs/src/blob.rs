//! Blob key codec (spec §4.2).
//!
//! A logical file at path `p` is stored as a sequence of numbered blobs with
//! backend keys `p.0`, `p.1`, `p.2`, ... — ordinal `0` first, ascending, no
//! gaps. This module is the only place that knows that convention; callers
//! above it deal in `(logical path, ordinal)` pairs.

use once_cell::sync::Lazy;
use regex::Regex;

/// Suffix appended to a logical path to mark it as a directory in backends
/// that have no native directory concept (spec §4.1,
/// [`nebula_core::BackendKind::needs_directory_markers`]).
pub const DIRECTORY_MARKER_SUFFIX: &str = ".directory";

static BLOB_KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<path>.*)\.(?P<ordinal>\d+)$").expect("valid blob key regex")
});

/// Build the backend key for ordinal `n` of the logical file at `path`.
pub fn encode_key(path: &str, ordinal: u64) -> String {
    format!("{path}.{ordinal}")
}

/// Split a backend key back into its logical path and ordinal, if it
/// matches the `<path>.<ordinal>` convention.
pub fn decode_key(key: &str) -> Option<(&str, u64)> {
    let captures = BLOB_KEY_PATTERN.captures(key)?;
    let path = captures.name("path")?.as_str();
    let ordinal: u64 = captures.name("ordinal")?.as_str().parse().ok()?;
    Some((path, ordinal))
}

/// Build the backend key for the directory marker of `path`.
pub fn directory_marker_key(path: &str) -> String {
    format!("{path}{DIRECTORY_MARKER_SUFFIX}")
}

/// Whether `key` is a directory marker, and if so, the logical path it
/// marks.
pub fn decode_directory_marker(key: &str) -> Option<&str> {
    key.strip_suffix(DIRECTORY_MARKER_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_roundtrips() {
        let key = encode_key("bucket/dir/file.txt", 3);
        assert_eq!(key, "bucket/dir/file.txt.3");
        assert_eq!(decode_key(&key), Some(("bucket/dir/file.txt", 3)));
    }

    #[test]
    fn decode_rejects_non_blob_keys() {
        assert_eq!(decode_key("bucket/dir/file.txt"), None);
        assert_eq!(decode_key("bucket/dir/file.txt.abc"), None);
    }

    #[test]
    fn path_containing_dots_still_decodes_last_ordinal() {
        assert_eq!(
            decode_key("bucket/archive.tar.gz.12"),
            Some(("bucket/archive.tar.gz", 12))
        );
    }

    #[test]
    fn directory_marker_roundtrips() {
        let key = directory_marker_key("bucket/dir");
        assert_eq!(key, "bucket/dir.directory");
        assert_eq!(decode_directory_marker(&key), Some("bucket/dir"));
        assert_eq!(decode_directory_marker("bucket/dir.0"), None);
    }
}
