//! Abstract File System (AFS): reconstructs logical file semantics over
//! fragmented numbered blobs on pluggable backends (spec §4).
//!
//! A logical file is never written as a single backend object. It is split
//! into a sequence of numbered blobs (`path.0`, `path.1`, ...) so that no
//! single write ever exceeds a backend's native object-size limit, and so
//! that partial writes are always visible as a well-formed prefix of
//! blobs rather than a half-written object. [`blob`] owns the key
//! convention, [`connector`] owns the per-backend primitive operations, and
//! [`fragmented::FragmentedFileSystem`] is the layer that ties the two
//! together into read/write/truncate/copy/move/list.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blob;
pub mod codec;
pub mod connector;
pub mod fragmented;

pub use codec::{BlobCodec, CodecError, IdentityCodec};
pub use connector::{
    CachedMeta, Connector, ConnectorConfig, ConnectorError, Credentials, LocalConnector,
    MemoryConnector, MetadataCache, ObjectStoreConnector,
};
pub use fragmented::{DirEntry, FragmentedFileSystem};
