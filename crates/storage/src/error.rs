//! Storage error types

use thiserror::Error;

/// Errors from storage areas and the preference store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unknown preference: {0}")]
    UnknownPref(String),

    #[error("preference {key} expects {expected}, got {actual}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt stored value: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
