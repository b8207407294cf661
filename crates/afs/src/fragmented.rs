//! Fragmented file I/O (spec §4.4, C4).
//!
//! Reconstructs logical-file semantics — read, write-all, truncate, copy,
//! move, and directory listing — over the numbered-blob convention from
//! [`crate::blob`], on top of any [`crate::Connector`]. This is the layer
//! callers actually use; it is the only place that understands "a file" as
//! more than a bag of blobs.

use std::collections::BTreeSet;
use std::sync::Arc;

use nebula_core::{BackendKind, CancellationToken};
use tracing::{debug, instrument};

use crate::blob::{decode_directory_marker, decode_key, directory_marker_key, encode_key};
use crate::codec::{BlobCodec, IdentityCodec};
use crate::connector::{CachedMeta, Connector, ConnectorConfig, ConnectorError, MetadataCache};

/// Convert a cancellation check into the connector-level error type, so
/// cancellation can be threaded through `?` alongside backend errors.
fn check_cancelled(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        Err(ConnectorError::Cancelled)
    } else {
        Ok(())
    }
}

/// Result type for fragmented file operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// A directory entry yielded by [`FragmentedFileSystem::list_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntry {
    /// A logical file, named by the path segment relative to the listed
    /// directory.
    File(String),
    /// A subdirectory, named by the path segment relative to the listed
    /// directory.
    Directory(String),
}

/// Reconstructs logical file semantics over a fragmented blob backend.
pub struct FragmentedFileSystem {
    connector: Arc<dyn Connector>,
    codec: Box<dyn BlobCodec>,
    cache: Option<MetadataCache>,
    max_blob_size: u64,
}

impl FragmentedFileSystem {
    /// Build a file system over `connector`, chunking writes at
    /// `max_blob_size` bytes and passing every blob through the identity
    /// codec. The metadata cache is on by default; use
    /// [`Self::with_config`] to honor `ConnectorConfig::use_cache`.
    pub fn new(connector: Arc<dyn Connector>, max_blob_size: u64) -> Self {
        Self::with_codec(connector, max_blob_size, Box::new(IdentityCodec))
    }

    /// Build a file system with an explicit blob codec (spec §4,
    /// `encryptionScope`). The metadata cache is on by default.
    pub fn with_codec(
        connector: Arc<dyn Connector>,
        max_blob_size: u64,
        codec: Box<dyn BlobCodec>,
    ) -> Self {
        FragmentedFileSystem {
            connector,
            codec,
            cache: Some(MetadataCache::new()),
            max_blob_size: max_blob_size.max(1),
        }
    }

    /// Build a file system from `config`, gating the metadata cache on
    /// `config.use_cache` (spec §4.3: "when useCache=true").
    pub fn with_config(connector: Arc<dyn Connector>, config: &ConnectorConfig, codec: Box<dyn BlobCodec>) -> Self {
        FragmentedFileSystem {
            connector,
            codec,
            cache: config.use_cache.then(MetadataCache::new),
            max_blob_size: config.max_blob_size.max(1),
        }
    }

    fn kind(&self) -> BackendKind {
        self.connector.kind()
    }

    /// Ordinals of every blob currently backing `path`, ascending and dense
    /// (spec §3: "N is dense and starts at 0 … no gaps"). A listing whose
    /// ordinals are not exactly `0..len` is rejected with `CorruptBlob`
    /// (§7) rather than silently read as if contiguous.
    fn enumerate_ordinals(&self, path: &str) -> Result<Vec<u64>> {
        let prefix = format!("{path}.");
        let mut ordinals: Vec<u64> = self
            .connector
            .list(&prefix)?
            .iter()
            .filter_map(|key| decode_key(key))
            .filter(|(p, _)| *p == path)
            .map(|(_, n)| n)
            .collect();
        ordinals.sort_unstable();
        for (expected, &actual) in ordinals.iter().enumerate() {
            if expected as u64 != actual {
                return Err(ConnectorError::CorruptBlob { path: path.to_string(), ordinal: actual });
            }
        }
        Ok(ordinals)
    }

    /// Size, in bytes, of every blob backing `path`, in ordinal order.
    fn blob_sizes(&self, path: &str, ordinals: &[u64]) -> Result<Vec<u64>> {
        ordinals
            .iter()
            .map(|n| self.connector.size(&encode_key(path, *n)))
            .collect()
    }

    /// Total logical size of `path`. `0` if the file does not exist.
    #[instrument(skip(self))]
    pub fn size(&self, path: &str) -> Result<u64> {
        if let Some(meta) = self.cache.as_ref().and_then(|c| c.get(path)) {
            return Ok(meta.size);
        }
        let ordinals = self.enumerate_ordinals(path)?;
        let total: u64 = self.blob_sizes(path, &ordinals)?.iter().sum();
        if let Some(cache) = &self.cache {
            cache.put(path, CachedMeta { exists: !ordinals.is_empty(), size: total });
        }
        Ok(total)
    }

    /// Whether `path` has any backing blobs (a regular file) or a directory
    /// marker (a directory), per spec §4.1.
    pub fn exists(&self, path: &str) -> Result<bool> {
        if let Some(meta) = self.cache.as_ref().and_then(|c| c.get(path)) {
            return Ok(meta.exists);
        }
        if !self.enumerate_ordinals(path)?.is_empty() {
            return Ok(true);
        }
        if self.kind().needs_directory_markers() {
            return self.connector.exists(&directory_marker_key(path));
        }
        Ok(false)
    }

    /// Read up to `length` bytes of `path` starting at `offset`.
    /// `length = None` reads to the logical end of the file. Reading past
    /// the end, or reading a file that does not exist, returns an empty
    /// vector rather than an error (spec §4.4). Equivalent to
    /// [`Self::read_cancellable`] with a token that is never cancelled.
    #[instrument(skip(self))]
    pub fn read(&self, path: &str, offset: u64, length: Option<u64>) -> Result<Vec<u8>> {
        self.read_cancellable(path, offset, length, &CancellationToken::none())
    }

    /// [`Self::read`], checking `token` between intersected blobs (spec §5:
    /// cancellation is checked between blob iterations in C4).
    #[instrument(skip(self, token))]
    pub fn read_cancellable(
        &self,
        path: &str,
        offset: u64,
        length: Option<u64>,
        token: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let ordinals = self.enumerate_ordinals(path)?;
        if ordinals.is_empty() {
            return Ok(Vec::new());
        }
        let sizes = self.blob_sizes(path, &ordinals)?;
        let total: u64 = sizes.iter().sum();
        if offset >= total {
            return Ok(Vec::new());
        }
        let end = match length {
            Some(len) => (offset + len).min(total),
            None => total,
        };

        let mut out = Vec::with_capacity((end - offset) as usize);
        let mut cumulative = 0u64;
        for (ordinal, blob_size) in ordinals.iter().zip(sizes.iter().copied()) {
            check_cancelled(token)?;
            let blob_start = cumulative;
            let blob_end = cumulative + blob_size;
            cumulative = blob_end;
            if blob_end <= offset || blob_start >= end {
                continue;
            }
            let read_start = offset.max(blob_start) - blob_start;
            let read_len = end.min(blob_end) - blob_start - read_start;
            let raw = self.connector.read_range(&encode_key(path, *ordinal), read_start, Some(read_len))?;
            let decoded = self
                .codec
                .decode(&raw)
                .map_err(|e| ConnectorError::Backend(e.to_string()))?;
            out.extend(decoded);
        }
        Ok(out)
    }

    /// Replace the entire contents of `path` with `data`, chunked at
    /// `max_blob_size`. Equivalent to [`Self::write_all_cancellable`] with a
    /// token that is never cancelled.
    #[instrument(skip(self, data))]
    pub fn write_all(&self, path: &str, data: &[u8]) -> Result<()> {
        self.write_all_cancellable(path, data, &CancellationToken::none())
    }

    /// [`Self::write_all`], checking `token` between blob writes. Deletes
    /// every pre-existing blob first so a shorter rewrite never leaves
    /// stale trailing ordinals behind (spec §9, Open Question 2: no
    /// generation tagging — `CorruptBlob` is only raised on an actual
    /// ordinal gap, not a transient straddling listing). Cancelling
    /// mid-write leaves whatever prefix of ordinals had already been put —
    /// cancellation is advisory, not transactional (spec §5).
    #[instrument(skip(self, data, token))]
    pub fn write_all_cancellable(&self, path: &str, data: &[u8], token: &CancellationToken) -> Result<()> {
        self.delete_all_ordinals(path, token)?;
        self.write_directory_markers_for_ancestors(path)?;

        if data.is_empty() {
            self.connector.put(&encode_key(path, 0), &self.codec.encode(&[]))?;
        } else {
            let chunk_size = self.max_blob_size as usize;
            for (n, chunk) in data.chunks(chunk_size).enumerate() {
                check_cancelled(token)?;
                self.connector.put(&encode_key(path, n as u64), &self.codec.encode(chunk))?;
            }
        }
        if let Some(cache) = &self.cache {
            cache.invalidate_with_ancestors(path);
        }
        debug!(path, bytes = data.len(), "write_all complete");
        Ok(())
    }

    fn delete_all_ordinals(&self, path: &str, token: &CancellationToken) -> Result<()> {
        for ordinal in self.enumerate_ordinals(path)? {
            check_cancelled(token)?;
            self.connector.delete(&encode_key(path, ordinal))?;
        }
        Ok(())
    }

    fn write_directory_markers_for_ancestors(&self, path: &str) -> Result<()> {
        if !self.kind().needs_directory_markers() {
            return Ok(());
        }
        let mut current = path;
        while let Some(idx) = current.rfind('/') {
            current = &current[..idx];
            self.connector.put(&directory_marker_key(current), &[])?;
        }
        Ok(())
    }

    /// Shrink `path` to `new_size` bytes. Growing is a no-op (truncate never
    /// extends a file). Shrinking to zero deletes and rewrites a single
    /// empty blob; shrinking to a nonzero size reads the retained prefix and
    /// rewrites it via [`Self::write_all`] (spec §4.4).
    #[instrument(skip(self))]
    pub fn truncate(&self, path: &str, new_size: u64) -> Result<()> {
        self.truncate_cancellable(path, new_size, &CancellationToken::none())
    }

    /// [`Self::truncate`], propagating `token` into the read and rewrite it
    /// performs.
    #[instrument(skip(self, token))]
    pub fn truncate_cancellable(&self, path: &str, new_size: u64, token: &CancellationToken) -> Result<()> {
        let current = self.size(path)?;
        if new_size >= current {
            return Ok(());
        }
        if new_size == 0 {
            return self.write_all_cancellable(path, &[], token);
        }
        let retained = self.read_cancellable(path, 0, Some(new_size), token)?;
        self.write_all_cancellable(path, &retained, token)
    }

    /// Copy the entirety of `src` to `dst`, preferring a backend-native copy
    /// per blob and falling back to read+write when the connector has none
    /// (spec §4.4). Equivalent to [`Self::copy_range`] with `offset = 0`,
    /// `length = None`.
    #[instrument(skip(self))]
    pub fn copy(&self, src: &str, dst: &str) -> Result<()> {
        self.copy_range(src, dst, 0, None)
    }

    /// [`Self::copy`], checking `token` between per-blob copy steps.
    #[instrument(skip(self, token))]
    pub fn copy_cancellable(&self, src: &str, dst: &str, token: &CancellationToken) -> Result<()> {
        self.copy_range_cancellable(src, dst, 0, None, token)
    }

    /// Copy `length` bytes of `src` starting at `offset` into `dst` (spec
    /// §4.3/§4.4 `copy(src, dst, offset, length)`). `length = None` copies
    /// to the logical end of `src`. Equivalent to
    /// [`Self::copy_range_cancellable`] with a token that is never
    /// cancelled.
    #[instrument(skip(self))]
    pub fn copy_range(&self, src: &str, dst: &str, offset: u64, length: Option<u64>) -> Result<()> {
        self.copy_range_cancellable(src, dst, offset, length, &CancellationToken::none())
    }

    /// [`Self::copy_range`], checking `token` between per-blob steps. A
    /// full-file copy (`offset = 0` and `length` covering all of `src`)
    /// takes the backend-native per-blob copy path; any partial range falls
    /// back to read+write, since `dst`'s blob boundaries no longer align
    /// with `src`'s once a range is sliced out of the middle.
    #[instrument(skip(self, token))]
    pub fn copy_range_cancellable(
        &self,
        src: &str,
        dst: &str,
        offset: u64,
        length: Option<u64>,
        token: &CancellationToken,
    ) -> Result<()> {
        let src_size = self.size(src)?;
        let is_whole_file = offset == 0 && length.map_or(true, |len| len >= src_size);
        if !is_whole_file {
            let data = self.read_cancellable(src, offset, length, token)?;
            return self.write_all_cancellable(dst, &data, token);
        }

        self.delete_all_ordinals(dst, token)?;
        for ordinal in self.enumerate_ordinals(src)? {
            check_cancelled(token)?;
            let src_key = encode_key(src, ordinal);
            let dst_key = encode_key(dst, ordinal);
            if !self.connector.native_copy(&src_key, &dst_key)? {
                let bytes = self.connector.read_range(&src_key, 0, None)?;
                self.connector.put(&dst_key, &bytes)?;
            }
        }
        self.write_directory_markers_for_ancestors(dst)?;
        if let Some(cache) = &self.cache {
            cache.invalidate_with_ancestors(dst);
        }
        Ok(())
    }

    /// Move `src` to `dst`. Implemented as copy-then-delete, so it is not
    /// atomic: a crash between the two steps can leave both paths present
    /// (spec §4.4).
    #[instrument(skip(self))]
    pub fn move_file(&self, src: &str, dst: &str) -> Result<()> {
        self.move_file_cancellable(src, dst, &CancellationToken::none())
    }

    /// [`Self::move_file`], propagating `token` into the copy and the
    /// subsequent delete of `src`.
    #[instrument(skip(self, token))]
    pub fn move_file_cancellable(&self, src: &str, dst: &str, token: &CancellationToken) -> Result<()> {
        self.copy_cancellable(src, dst, token)?;
        self.delete_all_ordinals(src, token)?;
        if let Some(cache) = &self.cache {
            cache.invalidate_with_ancestors(src);
        }
        Ok(())
    }

    /// List the immediate children of directory `path`, reconstructed from
    /// the flat key space by grouping on the path segment following
    /// `path/` (spec §4.1).
    #[instrument(skip(self))]
    pub fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let prefix = format!("{path}/");
        let keys = self.connector.list(&prefix)?;

        let mut files = BTreeSet::new();
        let mut dirs = BTreeSet::new();

        for key in keys {
            let Some(rest) = key.strip_prefix(&prefix) else { continue };
            if let Some((logical, _ordinal)) = decode_key(rest) {
                record_child(logical, &mut files, &mut dirs);
            } else if let Some(logical) = decode_directory_marker(rest) {
                record_dir(logical, &mut dirs);
            }
        }

        let mut entries: Vec<DirEntry> = dirs
            .into_iter()
            .map(DirEntry::Directory)
            .chain(files.into_iter().map(DirEntry::File))
            .collect();
        entries.sort_by(|a, b| entry_name(a).cmp(entry_name(b)));
        Ok(entries)
    }
}

fn entry_name(entry: &DirEntry) -> &str {
    match entry {
        DirEntry::File(name) | DirEntry::Directory(name) => name,
    }
}

fn record_child(logical: &str, files: &mut BTreeSet<String>, dirs: &mut BTreeSet<String>) {
    match logical.find('/') {
        Some(idx) => {
            dirs.insert(logical[..idx].to_string());
        }
        None => {
            files.insert(logical.to_string());
        }
    }
}

fn record_dir(logical: &str, dirs: &mut BTreeSet<String>) {
    let first_segment = logical.split('/').next().unwrap_or(logical);
    dirs.insert(first_segment.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MemoryConnector;

    fn fs(max_blob_size: u64) -> FragmentedFileSystem {
        FragmentedFileSystem::new(Arc::new(MemoryConnector::default()), max_blob_size)
    }

    #[test]
    fn write_then_read_whole_file_across_multiple_blobs() {
        let fs = fs(4);
        let data: Vec<u8> = (0..17u8).collect();
        fs.write_all("dir/file.bin", &data).unwrap();
        assert_eq!(fs.size("dir/file.bin").unwrap(), 17);
        assert_eq!(fs.read("dir/file.bin", 0, None).unwrap(), data);
    }

    #[test]
    fn read_range_spans_blob_boundary() {
        let fs = fs(4);
        let data: Vec<u8> = (0..17u8).collect();
        fs.write_all("f", &data).unwrap();
        assert_eq!(fs.read("f", 3, Some(5)).unwrap(), data[3..8]);
    }

    #[test]
    fn read_past_end_is_empty() {
        let fs = fs(4);
        fs.write_all("f", b"hello").unwrap();
        assert!(fs.read("f", 100, None).unwrap().is_empty());
    }

    #[test]
    fn read_missing_file_is_empty() {
        let fs = fs(4);
        assert!(fs.read("nope", 0, None).unwrap().is_empty());
        assert!(!fs.exists("nope").unwrap());
    }

    #[test]
    fn rewrite_drops_stale_trailing_ordinals() {
        let fs = fs(4);
        fs.write_all("f", &(0..20u8).collect::<Vec<_>>()).unwrap();
        fs.write_all("f", b"short").unwrap();
        assert_eq!(fs.read("f", 0, None).unwrap(), b"short");
        assert_eq!(fs.enumerate_ordinals("f").unwrap(), vec![0]);
    }

    #[test]
    fn truncate_shrinks_and_grows_is_noop() {
        let fs = fs(1024);
        fs.write_all("f", b"hello world").unwrap();
        fs.truncate("f", 5).unwrap();
        assert_eq!(fs.read("f", 0, None).unwrap(), b"hello");
        fs.truncate("f", 1000).unwrap();
        assert_eq!(fs.size("f").unwrap(), 5);
    }

    #[test]
    fn truncate_to_zero_keeps_file_existing_but_empty() {
        let fs = fs(1024);
        fs.write_all("f", b"hello").unwrap();
        fs.truncate("f", 0).unwrap();
        assert!(fs.exists("f").unwrap());
        assert_eq!(fs.size("f").unwrap(), 0);
    }

    #[test]
    fn copy_then_move_relocates_contents() {
        let fs = fs(4);
        fs.write_all("src", b"payload!!").unwrap();
        fs.copy("src", "dst").unwrap();
        assert_eq!(fs.read("dst", 0, None).unwrap(), b"payload!!");
        assert!(fs.exists("src").unwrap());

        fs.move_file("dst", "dst2").unwrap();
        assert!(!fs.exists("dst").unwrap());
        assert_eq!(fs.read("dst2", 0, None).unwrap(), b"payload!!");
    }

    #[test]
    fn copy_range_copies_only_the_requested_slice() {
        let fs = fs(4);
        fs.write_all("src", &(0..20u8).collect::<Vec<_>>()).unwrap();
        fs.copy_range("src", "dst", 5, Some(6)).unwrap();
        assert_eq!(fs.read("dst", 0, None).unwrap(), (5..11u8).collect::<Vec<_>>());
        assert_eq!(fs.read("src", 0, None).unwrap(), (0..20u8).collect::<Vec<_>>());
    }

    #[test]
    fn copy_range_covering_whole_file_matches_copy() {
        let fs = fs(4);
        fs.write_all("src", b"payload!!").unwrap();
        fs.copy_range("src", "dst", 0, Some(9)).unwrap();
        assert_eq!(fs.read("dst", 0, None).unwrap(), b"payload!!");
    }

    #[test]
    fn disabled_cache_still_reports_correct_size() {
        let cfg = ConnectorConfig::new(nebula_core::BackendKind::Memory).with_cache(false);
        let fs = FragmentedFileSystem::with_config(
            Arc::new(MemoryConnector::default()),
            &cfg,
            Box::new(IdentityCodec),
        );
        assert!(fs.cache.is_none());
        fs.write_all("f", b"hello").unwrap();
        assert_eq!(fs.size("f").unwrap(), 5);
        fs.write_all("f", b"hi").unwrap();
        assert_eq!(fs.size("f").unwrap(), 2);
    }

    #[test]
    fn list_directory_mixes_files_and_subdirectories() {
        let fs = fs(1024);
        fs.write_all("dir/a.txt", b"1").unwrap();
        fs.write_all("dir/sub/b.txt", b"2").unwrap();
        let entries = fs.list_directory("dir").unwrap();
        assert_eq!(
            entries,
            vec![DirEntry::Directory("sub".to_string()), DirEntry::File("a.txt".to_string())]
        );
    }

    #[test]
    fn write_all_cancellable_stops_between_blobs() {
        let fs = fs(4);
        let token = nebula_core::CancellationToken::new();
        token.cancel();
        let data: Vec<u8> = (0..20u8).collect();
        let err = fs.write_all_cancellable("f", &data, &token).unwrap_err();
        assert!(matches!(err, ConnectorError::Cancelled));
    }

    #[test]
    fn read_cancellable_stops_between_intersected_blobs() {
        let fs = fs(4);
        fs.write_all("f", &(0..20u8).collect::<Vec<_>>()).unwrap();
        let token = nebula_core::CancellationToken::new();
        token.cancel();
        let err = fs.read_cancellable("f", 0, None, &token).unwrap_err();
        assert!(matches!(err, ConnectorError::Cancelled));
    }

    #[test]
    fn gap_in_ordinal_sequence_is_corrupt_blob() {
        let fs = fs(4);
        fs.connector.put(&encode_key("f", 0), b"a").unwrap();
        fs.connector.put(&encode_key("f", 2), b"c").unwrap();
        let err = fs.enumerate_ordinals("f").unwrap_err();
        assert!(matches!(err, ConnectorError::CorruptBlob { ref path, ordinal: 1 } if path == "f"));
        assert!(matches!(fs.size("f").unwrap_err(), ConnectorError::CorruptBlob { .. }));
        assert!(matches!(fs.read("f", 0, None).unwrap_err(), ConnectorError::CorruptBlob { .. }));
    }

    #[test]
    fn uncancelled_token_behaves_like_the_non_cancellable_api() {
        let fs = fs(4);
        let token = nebula_core::CancellationToken::new();
        fs.write_all_cancellable("f", b"hello world", &token).unwrap();
        assert_eq!(fs.read_cancellable("f", 0, None, &token).unwrap(), b"hello world");
    }
}
