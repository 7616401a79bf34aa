//! Error types for the extension glue

use std::path::PathBuf;
use thiserror::Error;

/// URL and request preparation errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("invalid URL '{url}': {source}")]
    Invalid {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Color scheme errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemeError {
    #[error("invalid clock time '{0}' (expected HH:MM)")]
    InvalidClockTime(String),

    #[error("unknown scheme mode '{0}'")]
    UnknownMode(String),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
