use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tauri::AppHandle;
use tauri::Manager;

use crate::error::{ShellError, ShellResult};

const STORE_FILE: &str = "config.json";

/// Key-value settings persisted as one JSON object under the app's data directory.
///
/// The directory is derived from the bundle identifier, which gives each
/// application its own namespace on disk.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Map<String, Value>>,
}

impl SettingsStore {
    pub fn get_path(app: &AppHandle) -> ShellResult<PathBuf> {
        let dir = app.path().app_data_dir()?;
        Ok(dir.join(STORE_FILE))
    }

    pub fn load(app: &AppHandle) -> ShellResult<Self> {
        Ok(Self::open(Self::get_path(app)?))
    }

    /// Opens the store at `path`. A missing or unreadable file yields an empty store.
    pub fn open(path: PathBuf) -> Self {
        let data = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str::<Map<String, Value>>(&content).unwrap_or_else(|e| {
                    log::warn!("[Store] Failed to parse {:?}: {}, starting empty", path, e);
                    Map::new()
                }),
                Err(e) => {
                    log::warn!("[Store] Failed to read {:?}: {}, starting empty", path, e);
                    Map::new()
                }
            }
        } else {
            Map::new()
        };

        Self {
            path,
            data: RwLock::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored value for `key`, or `default` when the key is absent.
    pub fn get(&self, key: &str, default: Value) -> Value {
        let data = match self.data.read() {
            Ok(d) => d,
            Err(poisoned) => poisoned.into_inner(),
        };
        data.get(key).cloned().unwrap_or(default)
    }

    /// Writers are serialized: the lock is held until the file is in place, so
    /// the file on disk always matches the latest write.
    pub fn set(&self, key: &str, value: Value) -> ShellResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| ShellError::Other("settings lock poisoned".to_string()))?;
        data.insert(key.to_string(), value);
        self.persist(&data)
    }

    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) -> ShellResult<()> {
        self.set(key, serde_json::to_value(value)?)
    }

    fn persist(&self, data: &Map<String, Value>) -> ShellResult<()> {
        let tmp_path = self.path.with_extension("tmp");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(data)?;

        // Write to tmp, then rename, so a crash never leaves a half-written file.
        fs::write(&tmp_path, json)?;
        fs::rename(tmp_path, &self.path)?;

        Ok(())
    }
}
