mod loader;
mod types;

pub use loader::{ConfigError, CONFIG_ENV_VAR};
pub use types::{
    DispatchConfig, LoggingConfig, PersistenceConfig, StoreConfig, DEFAULT_MAX_CASCADE_DEPTH,
};
