//! String key-value stores.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use memeforge_common::error::{MemeError, MemeResult};

/// A durable string-to-string map.
pub trait KeyValueStore: Send {
    /// Store name for logging.
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> MemeResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> MemeResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> MemeResult<()>;
}

fn check_key(key: &str) -> MemeResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(MemeError::storage(format!("Invalid storage key {key:?}")))
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> MemeResult<PathBuf> {
        check_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> MemeResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MemeError::storage(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> MemeResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            MemeError::storage(format!("Failed to create {}: {e}", self.dir.display()))
        })?;

        // Readers never observe a half-written value.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value)
            .map_err(|e| MemeError::storage(format!("Failed to write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            MemeError::storage(format!("Failed to replace {}: {e}", path.display()))
        })?;

        tracing::debug!(key, path = %path.display(), bytes = value.len(), "Stored value");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> MemeResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MemeError::storage(format!(
                "Failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

/// In-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> MemeResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> MemeResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> MemeResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
