use crate::config::StorageMode;
use crate::constants::{FILE_STORE_DIR, FILE_STORE_NAME, SERVICE_NAME_FOR_KEYRING};
use crate::error::{AppError, AppResult};
use keyring::{Entry, Error as KeyringError};
use log::{debug, error, info};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use super::storage_trait::KeyValueStore;

/// Open the backend selected by `mode`.
pub fn open_storage(mode: StorageMode) -> AppResult<Arc<dyn KeyValueStore>> {
    let storage: Arc<dyn KeyValueStore> = match mode {
        StorageMode::Keyring => {
            info!("Using OS keyring for credential storage");
            Arc::new(KeyringStorage::new(SERVICE_NAME_FOR_KEYRING))
        }
        StorageMode::File => {
            let path = default_file_store_path()?;
            info!("Using file credential storage at {}", path.display());
            Arc::new(FileStorage::new(path))
        }
        StorageMode::Memory => {
            info!("Using in-memory credential storage (cleared on exit)");
            Arc::new(MemoryStorage::default())
        }
    };
    Ok(storage)
}

pub fn default_file_store_path() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(FILE_STORE_DIR).join(FILE_STORE_NAME))
        .ok_or_else(|| {
            AppError::ConfigError("Could not determine the user config directory".to_string())
        })
}

/// Session-only storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStorage {
    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        let mut items = self.items.write().map_err(|e| {
            error!("Failed to acquire write lock on session storage: {e}");
            AppError::StorageError(format!("Failed to write session storage: {e}"))
        })?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        let items = self.items.read().map_err(|e| {
            error!("Failed to acquire read lock on session storage: {e}");
            AppError::StorageError(format!("Failed to read session storage: {e}"))
        })?;
        Ok(items.get(key).cloned())
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        let mut items = self.items.write().map_err(|e| {
            error!("Failed to acquire write lock on session storage: {e}");
            AppError::StorageError(format!("Failed to write session storage: {e}"))
        })?;
        items.remove(key);
        Ok(())
    }
}

/// OS credential vault, one entry per key under a shared service name.
#[derive(Debug, Clone)]
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> AppResult<Entry> {
        Entry::new(&self.service, key).map_err(|e| {
            error!(
                "Failed to create keyring entry - OS: {:?}, Error: {}",
                std::env::consts::OS,
                e
            );
            AppError::KeyringError(format!("Failed to create keyring entry: {e}"))
        })
    }
}

impl KeyValueStore for KeyringStorage {
    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.entry(key)?.set_password(value).map_err(|e| {
            error!(
                "Failed to store '{key}' in keyring - OS: {:?}, Error: {}",
                std::env::consts::OS,
                e
            );
            AppError::KeyringError(format!("Failed to store '{key}': {e}"))
        })?;
        debug!("Saved '{key}' to keyring");
        Ok(())
    }

    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(KeyringError::NoEntry) => {
                debug!("No '{key}' entry in keyring");
                Ok(None)
            }
            Err(e) => {
                error!(
                    "Keyring error - OS: {:?}, Error type: {:?}, Details: {}",
                    std::env::consts::OS,
                    e,
                    e
                );
                Err(AppError::KeyringError(format!(
                    "Failed to retrieve '{key}' from keyring: {e}"
                )))
            }
        }
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => {
                debug!("Removed '{key}' from keyring");
                Ok(())
            }
            Err(KeyringError::NoEntry) => {
                debug!("No '{key}' entry to remove in keyring (already empty)");
                Ok(())
            }
            Err(e) => Err(AppError::KeyringError(format!(
                "Failed to remove '{key}' from keyring: {e}"
            ))),
        }
    }
}

/// JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> AppResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            AppError::StorageError(format!(
                "Corrupt session file {}: {e}",
                self.path.display()
            ))
        })
    }

    fn write_items(&self, items: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(items)?)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> AppResult<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| AppError::StorageError(format!("Session file lock poisoned: {e}")))?;
        let mut items = self.read_items()?;
        apply(&mut items);
        self.write_items(&items)
    }
}

impl KeyValueStore for FileStorage {
    fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| AppError::StorageError(format!("Session file lock poisoned: {e}")))?;
        Ok(self.read_items()?.remove(key))
    }

    fn remove_item(&self, key: &str) -> AppResult<()> {
        self.update(|items| {
            items.remove(key);
        })
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> AppResult<()> {
    Ok(())
}
