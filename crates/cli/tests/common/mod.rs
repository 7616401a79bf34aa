//! Common utilities for integration tests

pub mod cli;

use std::path::{Path, PathBuf};

/// Write a JSON fixture into `dir` and return its path
pub fn write_json(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}
