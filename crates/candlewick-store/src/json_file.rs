//! String-keyed map persisted as a single JSON object.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::StoreError;

/// JSON object file holding `key -> V`.
///
/// Reads always go to disk. Writes are serialized by an in-process lock and
/// land through a temp file plus rename, so a concurrent reader sees either
/// the old or the new file, never a partial one. Coordination between
/// processes is out of scope.
#[derive(Debug)]
pub struct JsonFileMap<V> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _value: PhantomData<fn() -> V>,
}

impl<V> JsonFileMap<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Open the map, creating parent directories and an empty `{}` file
    /// when nothing exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let map = Self {
            path,
            write_lock: Mutex::new(()),
            _value: PhantomData,
        };

        if !map.path.exists() {
            map.save(&BTreeMap::new())?;
            tracing::info!(path = %map.path.display(), "created store file");
        }

        Ok(map)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents. A missing or blank file reads as empty.
    pub fn load(&self) -> Result<BTreeMap<String, V>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(error) => return Err(error.into()),
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).map_err(|error| StoreError::Corrupt {
            path: self.path.clone(),
            reason: error.to_string(),
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    /// Read-modify-write under the write lock. Nothing is written when `f`
    /// returns an error.
    pub fn update<R, F>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, V>) -> Result<R, StoreError>,
    {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut entries = self.load()?;
        let result = f(&mut entries)?;
        self.save(&entries)?;
        Ok(result)
    }

    fn save(&self, entries: &BTreeMap<String, V>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, entries)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        temp.persist(&self.path).map_err(|error| StoreError::Io(error.error))?;

        tracing::debug!(path = %self.path.display(), entries = entries.len(), "store file written");
        Ok(())
    }
}
