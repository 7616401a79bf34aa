//! Utility functions for CLI commands

use anyhow::{Context, Result};
use extension::Config;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read a JSON file, or stdin when `path` is "-"
pub fn read_json(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    debug!(path = %path.display(), bytes = text.len(), "read JSON input");
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Pretty-print a JSON value to stdout
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Config file location: the explicit path or ./stylus.toml
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Config::path_in(Path::new(".")))
}

/// Load the config; only an explicit path is required to exist
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = config_path(explicit);
    debug!(path = %path.display(), explicit = explicit.is_some(), "loading config");
    let config = if explicit.is_some() {
        Config::load(&path)
    } else {
        Config::load_or_default(&path)
    };
    config.with_context(|| format!("Failed to load config {}", path.display()))
}
