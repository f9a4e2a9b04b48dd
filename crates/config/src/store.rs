//! Local key-value persistence surface.
//!
//! Values are JSON text. Keys are module scoped (`<module>:recent-commands`,
//! `<module>:nav-state`) so two modules never share state. Everything here is
//! single-threaded: implementations use interior mutability behind `&self`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

pub fn recent_commands_key(module: &str) -> String {
    format!("{module}:recent-commands")
}

pub fn nav_state_key(module: &str) -> String {
    format!("{module}:nav-state")
}

pub trait KeyValueStore {
    /// `Ok(None)` when nothing was ever stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Make every accepted write durable.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

// ============================================================================
// One JSON file per key
// ============================================================================

/// Stores each key as `<dir>/<key>.json`, written atomically.
///
/// Writes go to disk immediately (temp file then rename), so `flush` has
/// nothing left to do and a crash never leaves a half-written value.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `audit:nav-state` → `<dir>/audit.nav-state.json`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| match c {
                ':' => '.',
                c if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') => c,
                _ => '_',
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    fn io_err(key: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_err(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_err(key, e))?;

        let path = self.path_for(key);
        let temp = path.with_extension("json.tmp");

        // Write to temp file
        fs::write(&temp, value).map_err(|e| Self::io_err(key, e))?;

        // Atomic rename
        fs::rename(&temp, &path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            Self::io_err(key, e)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(key, e)),
        }
    }
}
