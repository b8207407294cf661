//! Local filesystem connector (spec §4.3).
//!
//! Blob keys map directly onto filesystem paths rooted at a configured base
//! directory. The local filesystem has native directories, so this is the
//! only connector that never needs `.directory` marker blobs.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path as FsPath, PathBuf};

use nebula_core::BackendKind;

use super::{Connector, ConnectorError, Result};

/// Connector backed by a real directory tree on local disk.
pub struct LocalConnector {
    base_dir: PathBuf,
}

impl LocalConnector {
    /// Create a connector rooted at `base_dir`, creating it if necessary.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(LocalConnector { base_dir })
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }
}

impl Connector for LocalConnector {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn size(&self, key: &str) -> Result<u64> {
        match fs::metadata(self.resolve(key)) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(ConnectorError::Io(e)),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.resolve(key).is_file())
    }

    fn read_range(&self, key: &str, offset: u64, length: Option<u64>) -> Result<Vec<u8>> {
        let path = self.resolve(key);
        let mut file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ConnectorError::Io(e)),
        };
        let total_len = file.metadata()?.len();
        if offset >= total_len {
            return Ok(Vec::new());
        }
        file.seek(SeekFrom::Start(offset))?;
        let want = length.unwrap_or(total_len - offset).min(total_len - offset);
        let mut buf = vec![0u8; want as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&path)?;
        file.write_all(data)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.resolve(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConnectorError::Io(e)),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut results = Vec::new();
        walk(&self.base_dir, &self.base_dir, &mut results)?;
        Ok(results.into_iter().filter(|k| k.starts_with(prefix)).collect())
    }
}

fn walk(base: &FsPath, dir: &FsPath, out: &mut Vec<String>) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ConnectorError::Io(e)),
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(base, &path, out)?;
        } else {
            let relative = path
                .strip_prefix(base)
                .expect("walked path is under base")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            out.push(relative);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_read_delete_roundtrip() {
        let dir = tempdir().unwrap();
        let c = LocalConnector::new(dir.path()).unwrap();
        c.put("bkt/f.txt.0", b"hello").unwrap();
        assert!(c.exists("bkt/f.txt.0").unwrap());
        assert_eq!(c.size("bkt/f.txt.0").unwrap(), 5);
        assert_eq!(c.read_range("bkt/f.txt.0", 1, Some(3)).unwrap(), b"ell");
        c.delete("bkt/f.txt.0").unwrap();
        assert!(!c.exists("bkt/f.txt.0").unwrap());
    }

    #[test]
    fn missing_key_is_soft_not_found() {
        let dir = tempdir().unwrap();
        let c = LocalConnector::new(dir.path()).unwrap();
        assert_eq!(c.size("nope").unwrap(), 0);
        assert!(!c.exists("nope").unwrap());
        assert!(c.read_range("nope", 0, None).unwrap().is_empty());
    }

    #[test]
    fn list_returns_keys_under_prefix() {
        let dir = tempdir().unwrap();
        let c = LocalConnector::new(dir.path()).unwrap();
        c.put("d1/a.txt.0", b"1").unwrap();
        c.put("d1/b.txt.0", b"2").unwrap();
        c.put("d2/c.txt.0", b"3").unwrap();
        let mut keys = c.list("d1/").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["d1/a.txt.0".to_string(), "d1/b.txt.0".to_string()]);
    }
}
