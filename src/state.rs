//! State store: durable key-value persistence for checkpoints and
//! schema snapshots. Two implementations are anticipated upstream —
//! a file-per-name directory and a redis-like KV store; this crate
//! specifies the trait and ships the file-backed one (see DESIGN.md for
//! why the KV variant is left unimplemented).

use crate::error::Result;
use std::path::PathBuf;

pub trait StateStore: Send + Sync {
    fn list(&self) -> Result<Vec<String>>;
    fn read(&self, name: &str, max_size: usize) -> Result<Option<Vec<u8>>>;
    fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;
    fn drop_entry(&self, name: &str) -> Result<()>;
}

/// One file per named entry under a root directory.
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl StateStore for FileStateStore {
    fn list(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                out.push(name.to_string());
            }
        }
        out.sort();
        Ok(out)
    }

    fn read(&self, name: &str, max_size: usize) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        if bytes.len() > max_size {
            return Err(crate::error::OlrError::BadData(format!(
                "state entry {name} is {} bytes, exceeds max {max_size}",
                bytes.len()
            )));
        }
        Ok(Some(bytes))
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(name);
        let tmp_path = self.root.join(format!("{name}.tmp"));
        std::fs::write(&tmp_path, bytes)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn drop_entry(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path()).unwrap();
        store.write("orcl-chkpt", b"hello").unwrap();
        let back = store.read("orcl-chkpt", 1024).unwrap().unwrap();
        assert_eq!(back, b"hello");
    }

    #[test]
    fn read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path()).unwrap();
        assert!(store.read("absent", 1024).unwrap().is_none());
    }

    #[test]
    fn drop_then_read_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path()).unwrap();
        store.write("x", b"y").unwrap();
        store.drop_entry("x").unwrap();
        assert!(store.read("x", 1024).unwrap().is_none());
    }

    #[test]
    fn list_reflects_writes() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path()).unwrap();
        store.write("a", b"1").unwrap();
        store.write("b", b"2").unwrap();
        assert_eq!(store.list().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn oversized_read_errors() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path()).unwrap();
        store.write("big", &vec![0u8; 100]).unwrap();
        assert!(store.read("big", 10).is_err());
    }
}
