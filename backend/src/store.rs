//! Scoped key/value persistence for typed records.
//!
//! Keys are namespaced as `<scope>_<key>` so several applications can share
//! one backing store without colliding.

use std::{
    collections::HashMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, RwLock},
};

use serde::{Serialize, de::DeserializeOwned};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid store key {0:?}")]
    InvalidKey(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stored {key} is corrupt: {source}")]
    Corrupt {
        key: &'static str,
        source: serde_json::Error,
    },
    #[error("failed to encode {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per entry inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)?) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// A value persisted under a fixed key.
pub trait Record: Serialize + DeserializeOwned + Default {
    const KEY: &'static str;

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

pub struct Scoped<S> {
    inner: S,
    scope: String,
    // Serializes read-modify-write cycles in `update`.
    write_lock: RwLock<()>,
}

impl<S: KeyValueStore> Scoped<S> {
    pub fn new(inner: S, scope: impl Into<String>) -> Self {
        Self {
            inner,
            scope: scope.into(),
            write_lock: RwLock::new(()),
        }
    }

    pub fn scoped_key(&self, key: &str) -> String {
        format!("{}_{key}", self.scope)
    }

    /// The stored record, or its default when nothing is stored yet.
    pub fn load<R: Record>(&self) -> Result<R, RecordError> {
        let _guard = self
            .write_lock
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.load_unlocked()
    }

    pub fn save<R: Record>(&self, record: &R) -> Result<(), RecordError> {
        let _guard = self
            .write_lock
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.save_unlocked(record)
    }

    pub fn clear<R: Record>(&self) -> Result<(), RecordError> {
        let _guard = self
            .write_lock
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.inner.remove(&self.scoped_key(R::KEY))?;
        Ok(())
    }

    /// Loads, mutates and saves a record as one step. Nothing is written
    /// when `f` fails.
    pub fn update<R, T, E>(&self, f: impl FnOnce(&mut R) -> Result<T, E>) -> Result<(R, T), E>
    where
        R: Record + Clone,
        E: From<RecordError>,
    {
        let _guard = self
            .write_lock
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut record: R = self.load_unlocked()?;
        let value = f(&mut record)?;
        self.save_unlocked(&record)?;
        Ok((record, value))
    }

    fn load_unlocked<R: Record>(&self) -> Result<R, RecordError> {
        let Some(raw) = self.inner.get(&self.scoped_key(R::KEY))? else {
            return Ok(R::default());
        };
        let record: R = serde_json::from_str(&raw)
            .map_err(|source| RecordError::Corrupt { key: R::KEY, source })?;
        record
            .validate()
            .map_err(|reason| RecordError::Invalid { key: R::KEY, reason })?;
        Ok(record)
    }

    fn save_unlocked<R: Record>(&self, record: &R) -> Result<(), RecordError> {
        record
            .validate()
            .map_err(|reason| RecordError::Invalid { key: R::KEY, reason })?;
        let raw = serde_json::to_string(record).map_err(RecordError::Encode)?;
        self.inner.set(&self.scoped_key(R::KEY), &raw)?;
        tracing::debug!("saved {}", self.scoped_key(R::KEY));
        Ok(())
    }
}
