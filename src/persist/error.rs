//! Error types for state persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while saving or restoring state.
///
/// None of these are fatal to a store: load failures fall back to the
/// default state, save failures leave the in-memory state authoritative.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to access state file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock state file '{path}': {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("TOML decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("State payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("No data directory available for persisted state")]
    NoDataDir,
}
