use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::persist::CodecKind;

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub store: DispatchConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dispatch loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum reduce steps in one synchronous `Send` cascade (default: 10000).
    /// `0` disables the limit.
    #[serde(default = "default_max_cascade_depth")]
    pub max_cascade_depth: usize,
}

/// Where and how persisted stores save their state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Directory for state files. Defaults to `<data_dir>/flowstore/state`.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Payload encoding: "json" or "toml" (default: json).
    #[serde(default)]
    pub codec: CodecKind,
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Log file path. Logs go to stderr when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 10_000;

fn default_max_cascade_depth() -> usize {
    DEFAULT_MAX_CASCADE_DEPTH
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_cascade_depth: default_max_cascade_depth(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: None,
        }
    }
}
