//! State persistence: save after every publication, restore on construction.
//!
//! The store itself only knows about [`PersistHook`]. [`Persistence`] is the
//! hook implementation that combines a storage key, a [`StateStorage`] and a
//! [`StateCodec`].

mod codec;
mod error;
mod storage;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::PersistenceConfig;
use crate::mvi::AppState;

pub use codec::{CodecKind, JsonCodec, StateCodec, TomlCodec};
pub use error::PersistError;
pub use storage::{FileStorage, MemoryStorage, StateStorage};

/// Fixed suffix appended to the type name to form the storage key.
pub const STORAGE_KEY_SUFFIX: &str = ".store";

/// State that can be saved and restored.
pub trait Persistable: AppState + Serialize + DeserializeOwned {
    /// Storage entry identifier. Defaults to the short type name plus
    /// [`STORAGE_KEY_SUFFIX`], e.g. `CounterState.store`.
    fn storage_key() -> String {
        format!("{}{}", short_type_name::<Self>(), STORAGE_KEY_SUFFIX)
    }
}

/// Called by the store after each state publication, before the step's
/// effect is interpreted.
pub trait PersistHook<S>: Send + Sync {
    fn persist(&self, state: &S);
}

/// Saves and restores one state type under one key.
pub struct Persistence<S> {
    key: String,
    storage: Arc<dyn StateStorage>,
    codec: Arc<dyn StateCodec<S>>,
}

impl<S> Clone for Persistence<S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            storage: Arc::clone(&self.storage),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<S: Persistable> Persistence<S> {
    /// JSON-encoded persistence under [`Persistable::storage_key`].
    pub fn new(storage: impl StateStorage + 'static) -> Self {
        Self::with_codec(storage, JsonCodec::new())
    }

    pub fn with_codec(
        storage: impl StateStorage + 'static,
        codec: impl StateCodec<S> + 'static,
    ) -> Self {
        Self {
            key: S::storage_key(),
            storage: Arc::new(storage),
            codec: Arc::new(codec),
        }
    }

    /// Build file-backed persistence from the `[persistence]` config section.
    pub fn from_config(config: &PersistenceConfig) -> Result<Self, PersistError> {
        let storage = match &config.directory {
            Some(dir) => FileStorage::new(dir),
            None => FileStorage::default_location()?,
        };
        Ok(match config.codec {
            CodecKind::Json => Self::with_codec(storage, JsonCodec::pretty()),
            CodecKind::Toml => Self::with_codec(storage, TomlCodec),
        })
    }

    /// Override the storage key, e.g. to keep several stores of one type apart.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

impl<S> Persistence<S> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Restore the saved state. Errors are returned as-is.
    pub fn try_load(&self) -> Result<Option<S>, PersistError> {
        let extension = self.codec.extension();
        match self.storage.read(&self.key, extension)? {
            Some(bytes) => self.codec.decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Restore the saved state. Any failure counts as "nothing saved".
    pub fn load(&self) -> Option<S> {
        match self.try_load() {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Ignoring unreadable persisted state");
                None
            }
        }
    }

    pub fn save(&self, state: &S) -> Result<(), PersistError> {
        let bytes = self.codec.encode(state)?;
        self.storage.write(&self.key, self.codec.extension(), &bytes)
    }

    /// Delete the saved entry.
    pub fn clear(&self) -> Result<(), PersistError> {
        self.storage.remove(&self.key, self.codec.extension())
    }
}

impl<S: Send + Sync> PersistHook<S> for Persistence<S> {
    fn persist(&self, state: &S) {
        match self.save(state) {
            Ok(()) => tracing::trace!(key = %self.key, "State persisted"),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Failed to persist state")
            }
        }
    }
}

/// `type_name` without module path or generic arguments.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
