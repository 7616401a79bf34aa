//! Storage abstraction for Stylus
//!
//! This crate provides:
//! - An async key/value storage area trait with an in-memory implementation
//! - Single-value and packed (compressed) value helpers
//! - A preference store with defaults and change subscriptions

pub mod area;
pub mod error;
pub mod prefs;

// Re-exports
pub use area::{pack_value, unpack_value, MemoryArea, PackedKey, StorageArea, StorageExt};
pub use error::StorageError;
pub use prefs::{PrefListener, Prefs, SubscriptionId, PREFS_STORAGE_KEY};

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
