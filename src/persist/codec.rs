//! Injectable encoders for persisted state.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::PersistError;

/// Converts a state value to and from its stored bytes.
pub trait StateCodec<S>: Send + Sync {
    /// File extension used by storages that care about it.
    fn extension(&self) -> &'static str;

    fn encode(&self, state: &S) -> Result<Vec<u8>, PersistError>;

    fn decode(&self, bytes: &[u8]) -> Result<S, PersistError>;
}

/// JSON encoding via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Human-readable output, useful for state files people inspect.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl<S: Serialize + DeserializeOwned> StateCodec<S> for JsonCodec {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn encode(&self, state: &S) -> Result<Vec<u8>, PersistError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(state)?
        } else {
            serde_json::to_vec(state)?
        };
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<S, PersistError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// TOML encoding. The state must serialize to a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl<S: Serialize + DeserializeOwned> StateCodec<S> for TomlCodec {
    fn extension(&self) -> &'static str {
        "toml"
    }

    fn encode(&self, state: &S) -> Result<Vec<u8>, PersistError> {
        Ok(toml::to_string(state)?.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<S, PersistError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(toml::from_str(text)?)
    }
}

/// Codec selection as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Json,
    Toml,
}
