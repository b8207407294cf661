//! Root object envelope and id-addressed object pages (spec §6).
//!
//! A NebulaStore database has exactly one root object, persisted at the
//! logical path `root.msgpack`. The filename is kept for on-wire
//! compatibility even though the payload is the binary `NEBS` format from
//! [`nebula_core::serialize`], not actual MessagePack. Every other
//! reachable object is paged in under `objects/<id>`, addressed by the id
//! it was assigned when first reached from the root.

use std::sync::Arc;

use nebula_afs::FragmentedFileSystem;
use nebula_core::serialize::{read_varint, write_varint, Header};
use nebula_core::{Error, Result};

/// Logical path the root object is persisted at.
pub const ROOT_PATH: &str = "root.msgpack";

/// Directory logical objects are paged into, addressed by id.
pub const OBJECTS_DIR: &str = "objects";

/// The root object envelope: a type name plus its serialized payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootObject {
    /// Name of the root type, so a reader can dispatch deserialization
    /// without guessing.
    pub type_name: String,
    /// Serialized payload, in whatever format `type_name` uses internally.
    pub data: Vec<u8>,
}

/// Reads and writes the root object and id-addressed object pages over a
/// [`FragmentedFileSystem`].
pub struct ObjectStorer {
    fs: Arc<FragmentedFileSystem>,
}

impl ObjectStorer {
    /// Build a storer over `fs`.
    pub fn new(fs: Arc<FragmentedFileSystem>) -> Self {
        ObjectStorer { fs }
    }

    /// Logical path for the object page of `id`.
    pub fn object_path(id: u64) -> String {
        format!("{OBJECTS_DIR}/{id}")
    }

    /// Persist the root object, replacing whatever was there before.
    pub fn save_root(&self, root: &RootObject) -> Result<()> {
        let envelope = encode_root(root)?;
        self.fs.write_all(ROOT_PATH, &envelope).map_err(Error::from)
    }

    /// Load the root object, or `None` if the database has never had one
    /// written.
    pub fn load_root(&self) -> Result<Option<RootObject>> {
        if !self.fs.exists(ROOT_PATH).map_err(Error::from)? {
            return Ok(None);
        }
        let bytes = self.fs.read(ROOT_PATH, 0, None).map_err(Error::from)?;
        decode_root(&bytes).map(Some)
    }

    /// Persist `data` as the object page for `id`.
    pub fn save_object(&self, id: u64, data: &[u8]) -> Result<()> {
        self.fs.write_all(&Self::object_path(id), data).map_err(Error::from)
    }

    /// Load the object page for `id`.
    pub fn load_object(&self, id: u64) -> Result<Vec<u8>> {
        self.fs.read(&Self::object_path(id), 0, None).map_err(Error::from)
    }

    /// Whether an object page exists for `id`.
    pub fn has_object(&self, id: u64) -> Result<bool> {
        self.fs.exists(&Self::object_path(id)).map_err(Error::from)
    }
}

fn encode_root(root: &RootObject) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    Header::current().write(&mut buf)?;
    write_varint(&mut buf, root.type_name.len() as u64)?;
    buf.extend_from_slice(root.type_name.as_bytes());
    write_varint(&mut buf, root.data.len() as u64)?;
    buf.extend_from_slice(&root.data);
    Ok(buf)
}

fn decode_root(bytes: &[u8]) -> Result<RootObject> {
    let mut cursor = bytes;
    Header::read(&mut cursor)?;
    let name_len = read_varint(&mut cursor)? as usize;
    if cursor.len() < name_len {
        return Err(Error::CorruptBlob { path: ROOT_PATH.to_string(), ordinal: 0 });
    }
    let (name_bytes, rest) = cursor.split_at(name_len);
    let type_name = String::from_utf8(name_bytes.to_vec())
        .map_err(|_| Error::CorruptBlob { path: ROOT_PATH.to_string(), ordinal: 0 })?;
    cursor = rest;
    let data_len = read_varint(&mut cursor)? as usize;
    if cursor.len() < data_len {
        return Err(Error::CorruptBlob { path: ROOT_PATH.to_string(), ordinal: 0 });
    }
    let data = cursor[..data_len].to_vec();
    Ok(RootObject { type_name, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_afs::MemoryConnector;

    fn storer() -> ObjectStorer {
        ObjectStorer::new(Arc::new(FragmentedFileSystem::new(Arc::new(MemoryConnector::default()), 4096)))
    }

    #[test]
    fn missing_root_is_none() {
        assert_eq!(storer().load_root().unwrap(), None);
    }

    #[test]
    fn save_then_load_root_round_trips() {
        let storer = storer();
        let root = RootObject { type_name: "nebulastore.Catalog".to_string(), data: vec![1, 2, 3, 4] };
        storer.save_root(&root).unwrap();
        assert_eq!(storer.load_root().unwrap(), Some(root));
    }

    #[test]
    fn object_pages_are_addressed_by_id() {
        let storer = storer();
        storer.save_object(7, b"payload").unwrap();
        assert!(storer.has_object(7).unwrap());
        assert!(!storer.has_object(8).unwrap());
        assert_eq!(storer.load_object(7).unwrap(), b"payload");
    }
}
