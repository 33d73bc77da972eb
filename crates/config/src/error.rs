//! Configuration errors.

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Semantically invalid configuration
    #[error("invalid config: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn validation(msg: impl Into<String>) -> ConfigError {
        ConfigError::Validation(msg.into())
    }
}
