//! In-memory connector (spec §4.3).
//!
//! Used for tests and as the backing implementation for the document-store
//! and append-log-broker `BackendKind`s, for which no production SDK was
//! available in the dependency corpus (see `DESIGN.md`).

use std::collections::HashMap;

use nebula_core::BackendKind;
use parking_lot::RwLock;

use super::{Connector, ConnectorError, Result};

/// A pure in-process key/value backend.
pub struct MemoryConnector {
    kind: BackendKind,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryConnector {
    /// Create an empty in-memory connector reporting as `kind`.
    pub fn new(kind: BackendKind) -> Self {
        MemoryConnector {
            kind,
            objects: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new(BackendKind::Memory)
    }
}

impl Connector for MemoryConnector {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn size(&self, key: &str) -> Result<u64> {
        Ok(self.objects.read().get(key).map(|v| v.len() as u64).unwrap_or(0))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.read().contains_key(key))
    }

    fn read_range(&self, key: &str, offset: u64, length: Option<u64>) -> Result<Vec<u8>> {
        let objects = self.objects.read();
        let Some(data) = objects.get(key) else {
            return Ok(Vec::new());
        };
        let offset = offset as usize;
        if offset >= data.len() {
            return Ok(Vec::new());
        }
        let end = match length {
            Some(len) => (offset + len as usize).min(data.len()),
            None => data.len(),
        };
        Ok(data[offset..end].to_vec())
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        self.objects.write().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn native_copy(&self, src_key: &str, dst_key: &str) -> Result<bool> {
        let mut objects = self.objects.write();
        match objects.get(src_key).cloned() {
            Some(data) => {
                objects.insert(dst_key.to_string(), data);
                Ok(true)
            }
            None => Err(ConnectorError::Backend(format!("no such key: {src_key}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_read_range() {
        let c = MemoryConnector::default();
        c.put("a/b.txt.0", b"hello world").unwrap();
        assert_eq!(c.read_range("a/b.txt.0", 0, None).unwrap(), b"hello world");
        assert_eq!(c.read_range("a/b.txt.0", 6, Some(5)).unwrap(), b"world");
    }

    #[test]
    fn missing_key_is_soft_not_found() {
        let c = MemoryConnector::default();
        assert_eq!(c.size("nope").unwrap(), 0);
        assert!(!c.exists("nope").unwrap());
        assert_eq!(c.read_range("nope", 0, None).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn list_filters_by_prefix() {
        let c = MemoryConnector::default();
        c.put("d1/a.txt.0", b"x").unwrap();
        c.put("d1/b.txt.0", b"y").unwrap();
        c.put("d2/c.txt.0", b"z").unwrap();
        let mut keys = c.list("d1/").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["d1/a.txt.0".to_string(), "d1/b.txt.0".to_string()]);
    }
}
