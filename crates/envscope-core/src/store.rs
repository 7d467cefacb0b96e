//! 按项目隔离的键值存储：每个 key 一个文件。
//!
//! key 中的 `:` 映射为子目录，例如 `tmux:last` → `<dir>/kv_data/tmux/last`。
//! 仅支持单进程使用，多个进程同时写同一目录时不做协调。

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

const DATA_DIR: &str = "kv_data";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage dir {0} is not an absolute path")]
    RelativeDir(PathBuf),

    #[error("invalid store key '{0}'")]
    InvalidKey(String),

    #[error("store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store value for '{key}' is not valid json: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    storage_dir: PathBuf,
}

impl Store {
    /// Open (creating if needed) a store rooted at an absolute directory.
    pub fn open(storage_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.into();
        if !storage_dir.is_absolute() {
            return Err(StoreError::RelativeDir(storage_dir));
        }
        tracing::debug!("opening data store at {}", storage_dir.display());
        let store = Self { storage_dir };
        store.setup()?;
        Ok(store)
    }

    fn setup(&self) -> Result<(), StoreError> {
        let data_dir = self.data_dir();
        fs::create_dir_all(&data_dir).map_err(io_err(&data_dir))
    }

    fn data_dir(&self) -> PathBuf {
        self.storage_dir.join(DATA_DIR)
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let mut path = self.data_dir();
        for part in key.split(':') {
            if part.is_empty() || part == "." || part == ".." || part.contains('/') {
                return Err(StoreError::InvalidKey(key.to_string()));
            }
            path.push(part);
        }
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Join path segments under the storage directory.
    pub fn path<I, S>(&self, parts: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let mut path = self.storage_dir.clone();
        for part in parts {
            path.push(part);
        }
        path
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(&path)(e)),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        fs::write(&path, value).map_err(io_err(&path))
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Json {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Json {
            key: key.to_string(),
            source,
        })?;
        self.set(key, &raw)
    }

    /// Wipe every key and the whole storage directory, then start empty.
    pub fn erase_all(&self) -> Result<(), StoreError> {
        match fs::remove_dir_all(&self.storage_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(&self.storage_dir)(e)),
        }
        self.setup()
    }

    /// Point the store at a new root (used for `--temp` sessions). Nothing is copied.
    pub fn relocate(&mut self, new_dir: impl Into<PathBuf>) -> Result<(), StoreError> {
        let new_dir = new_dir.into();
        if !new_dir.is_absolute() {
            return Err(StoreError::RelativeDir(new_dir));
        }
        self.storage_dir = new_dir;
        self.setup()
    }
}
