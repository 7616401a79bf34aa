//! Configuration file loading
//!
//! Loads `stylus.toml`. Every section and key is optional; missing values
//! take their defaults.

use crate::color_scheme::{ClockTime, SchemeMode, PREF_MODE, PREF_NIGHT_END, PREF_NIGHT_START};
use crate::error::ConfigError;
use crate::new_ui;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use storage::PackedKey;
use stylus_core::Object;
use tracing::debug;

/// Default config file name
pub const CONFIG_FILE: &str = "stylus.toml";

/// Upper bound for debounce delays
const MAX_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub scheme: SchemeConfig,
    pub manage: ManageConfig,
    pub storage: StorageConfig,
}

/// Debounce delays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Hover delay before an entry tooltip renders
    pub tooltip_delay_ms: u64,
    /// Delay before missing favicons load
    pub favicon_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tooltip_delay_ms: 50,
            favicon_delay_ms: 0,
        }
    }
}

impl SchedulerConfig {
    pub fn tooltip_delay(&self) -> Duration {
        Duration::from_millis(self.tooltip_delay_ms)
    }

    pub fn favicon_delay(&self) -> Duration {
        Duration::from_millis(self.favicon_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeConfig {
    pub mode: SchemeMode,
    pub night_start: String,
    pub night_end: String,
}

impl Default for SchemeConfig {
    fn default() -> Self {
        Self {
            mode: SchemeMode::Never,
            night_start: "18:00".to_string(),
            night_end: "06:00".to_string(),
        }
    }
}

/// Manager page options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManageConfig {
    pub new_ui: bool,
    pub favicons: bool,
    pub favicons_gray: bool,
    pub targets: u32,
}

impl Default for ManageConfig {
    fn default() -> Self {
        Self {
            new_ui: true,
            favicons: false,
            favicons_gray: true,
            targets: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Keys stored compressed
    pub packed_keys: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            packed_keys: PackedKey::ALL
                .iter()
                .map(|key| key.as_str().to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `path` if it exists, else the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Config file in `dir`
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("scheme.night_start", &self.scheme.night_start),
            ("scheme.night_end", &self.scheme.night_end),
        ] {
            ClockTime::parse(value).map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            })?;
        }

        for (key, value) in [
            ("scheduler.tooltip_delay_ms", self.scheduler.tooltip_delay_ms),
            ("scheduler.favicon_delay_ms", self.scheduler.favicon_delay_ms),
        ] {
            if value > MAX_DELAY_MS {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("{value} exceeds {MAX_DELAY_MS}"),
                });
            }
        }

        if let Some(unknown) = self
            .storage
            .packed_keys
            .iter()
            .find(|name| !PackedKey::ALL.iter().any(|key| key.as_str() == name.as_str()))
        {
            return Err(ConfigError::Invalid {
                key: "storage.packed_keys",
                reason: format!("unknown key '{unknown}'"),
            });
        }
        Ok(())
    }

    /// Default preference values derived from this config
    pub fn default_prefs(&self) -> Object {
        let mut prefs = Object::new();
        let mut put = |key: String, value: Value| {
            prefs.insert(key, value);
        };
        put(PREF_MODE.to_string(), json!(self.scheme.mode.as_str()));
        put(PREF_NIGHT_START.to_string(), json!(self.scheme.night_start));
        put(PREF_NIGHT_END.to_string(), json!(self.scheme.night_end));
        put(new_ui::pref_key("enabled"), json!(self.manage.new_ui));
        put(new_ui::pref_key("favicons"), json!(self.manage.favicons));
        put(new_ui::pref_key("faviconsGray"), json!(self.manage.favicons_gray));
        put(new_ui::pref_key("targets"), json!(self.manage.targets));
        prefs
    }
}
