//! Storage backends for persisted state.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::Mutex;

use super::error::PersistError;

/// Key/value storage for encoded state.
pub trait StateStorage: Send + Sync {
    /// Read the entry for `key`. `Ok(None)` when nothing was saved yet.
    fn read(&self, key: &str, extension: &str) -> Result<Option<Vec<u8>>, PersistError>;

    /// Replace the entry for `key`. Readers see either the old or the new
    /// payload, never a mix.
    fn write(&self, key: &str, extension: &str, bytes: &[u8]) -> Result<(), PersistError>;

    /// Delete the entry for `key`. Missing entries are not an error.
    fn remove(&self, key: &str, extension: &str) -> Result<(), PersistError>;
}

/// In-process storage. Clones share the same entries, so two stores built
/// from clones of one `MemoryStorage` see each other's saves.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }

    /// Overwrite an entry directly, bypassing any codec.
    pub fn insert_raw(&self, key: &str, bytes: impl Into<Vec<u8>>) {
        self.entries.lock().insert(key.to_string(), bytes.into());
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StateStorage for MemoryStorage {
    fn read(&self, key: &str, _extension: &str) -> Result<Option<Vec<u8>>, PersistError> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, _extension: &str, bytes: &[u8]) -> Result<(), PersistError> {
        self.insert_raw(key, bytes);
        Ok(())
    }

    fn remove(&self, key: &str, _extension: &str) -> Result<(), PersistError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
///
/// Writes go to a temp file that is renamed over the target while an
/// exclusive lock is held on `<key>.lock`, so concurrent writers from other
/// processes never produce a torn file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `dirs::data_dir()/flowstore/state`.
    pub fn default_location() -> Result<Self, PersistError> {
        let base = dirs::data_dir().ok_or(PersistError::NoDataDir)?;
        Ok(Self::new(base.join("flowstore").join("state")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `key`.
    pub fn entry_path(&self, key: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", sanitize_key(key), extension))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", sanitize_key(key)))
    }

    fn ensure_dir(&self) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    fn lock(&self, key: &str) -> Result<File, PersistError> {
        let path = self.lock_path(key);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| PersistError::Io {
                path: path.clone(),
                source,
            })?;
        file.lock_exclusive()
            .map_err(|source| PersistError::Lock { path, source })?;
        Ok(file)
    }
}

impl StateStorage for FileStorage {
    fn read(&self, key: &str, extension: &str) -> Result<Option<Vec<u8>>, PersistError> {
        let path = self.entry_path(key, extension);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistError::Io { path, source }),
        }
    }

    fn write(&self, key: &str, extension: &str, bytes: &[u8]) -> Result<(), PersistError> {
        self.ensure_dir()?;
        let lock = self.lock(key)?;
        let _unlock = scopeguard::guard(lock, |file| {
            let _ = FileExt::unlock(&file);
        });

        let target = self.entry_path(key, extension);
        let tmp = target.with_extension(format!("{}.tmp.{}", extension, std::process::id()));
        let mut file = File::create(&tmp).map_err(|source| PersistError::Io {
            path: tmp.clone(),
            source,
        })?;
        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|source| PersistError::Io {
                path: tmp.clone(),
                source,
            })?;
        drop(file);

        if let Err(source) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(PersistError::Io {
                path: target,
                source,
            });
        }
        Ok(())
    }

    fn remove(&self, key: &str, extension: &str) -> Result<(), PersistError> {
        let path = self.entry_path(key, extension);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistError::Io { path, source }),
        }
    }
}

/// Keep keys usable as file names on every platform.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
