//! Shared value and text utilities for Stylus
//!
//! This crate provides:
//! - Tree values (`serde_json::Value`) with deep copy, merge and equality
//! - Object helpers (`is_empty_obj`, `map_obj`)
//! - Small string/parse helpers used across the extension pages

pub mod text;
pub mod value;

// Re-exports
pub use value::{
    deep_copy, deep_equal, deep_merge, deep_merge_into, is_empty_obj, is_falsy, map_obj, MapFn,
    Object,
};
