//! JSON-file backed settings table.

use crate::error::SettingsError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

/// Settings table with an explicit lifecycle: loaded once, mutated in
/// memory, written back with [`SettingsStore::save`].
///
/// Clones share the same table.
#[derive(Clone)]
pub struct SettingsStore {
    path: Option<Arc<PathBuf>>,
    values: Arc<RwLock<Map<String, Value>>>,
    /// Serialises writers of the backing file.
    write_lock: Arc<Mutex<()>>,
}

impl SettingsStore {
    /// Load settings from `path`, creating the file and its directory if
    /// missing. An empty file is an empty table.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let values = read_file(&path).await?;

        info!(
            "Settings loaded from {} ({} keys)",
            path.display(),
            values.len()
        );

        Ok(Self {
            path: Some(Arc::new(path)),
            values: Arc::new(RwLock::new(values)),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Store with no backing file; `save` and `reload` are no-ops.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Arc::new(RwLock::new(Map::new())),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(|p| p.as_path())
    }

    /// Get a setting. Returns `None` when the key is absent or null.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SettingsError> {
        let values = self.values.read().await;
        match values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    /// Add or replace a setting.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SettingsError> {
        let value = serde_json::to_value(value)?;
        self.values.write().await.insert(key.to_string(), value);
        debug!("Setting {} updated", key);
        Ok(())
    }

    /// Remove a setting. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> bool {
        self.values.write().await.remove(key).is_some()
    }

    /// Read-modify-write a setting under one lock, starting from the
    /// default when absent.
    pub async fn update<T, F, R>(&self, key: &str, f: F) -> Result<R, SettingsError>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> R,
    {
        let mut values = self.values.write().await;
        let mut current: T = match values.get(key) {
            None | Some(Value::Null) => T::default(),
            Some(value) => serde_json::from_value(value.clone())?,
        };

        let out = f(&mut current);
        values.insert(key.to_string(), serde_json::to_value(&current)?);
        Ok(out)
    }

    /// Write the table to disk (temp file, then rename). Concurrent saves
    /// run one at a time, each writing the table as it is when its turn
    /// comes.
    #[instrument(skip(self))]
    pub async fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let _writing = self.write_lock.lock().await;
        let contents = {
            let values = self.values.read().await;
            serde_json::to_string_pretty(&*values)?
        };

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, path.as_path())
            .await
            .map_err(|e| io_error(path, e))?;

        debug!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Replace the in-memory table with the file contents, discarding
    /// unsaved changes.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let fresh = read_file(path).await?;
        let count = fresh.len();
        *self.values.write().await = fresh;

        info!("Settings reloaded from {} ({} keys)", path.display(), count);
        Ok(())
    }

    /// All keys currently present.
    pub async fn keys(&self) -> Vec<String> {
        self.values.read().await.keys().cloned().collect()
    }
}

async fn read_file(path: &Path) -> Result<Map<String, Value>, SettingsError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
    }

    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::write(path, "")
                .await
                .map_err(|e| io_error(path, e))?;
            String::new()
        }
        Err(e) => return Err(io_error(path, e)),
    };

    if contents.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str(&contents)? {
        Value::Object(map) => Ok(map),
        _ => Err(SettingsError::NotAnObject(path.display().to_string())),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SettingsError {
    SettingsError::Io {
        path: path.display().to_string(),
        source,
    }
}
