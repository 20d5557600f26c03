//! Flex Creek configuration.
//!
//! Loaded from `~/.flexcreek/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Flex Creek configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Path to the database file.
    /// Defaults to `~/.flexcreek/flexcreek.sqlite`.
    pub database: Option<PathBuf>,

    /// Default log filter, used when `RUST_LOG` is unset (e.g. `"debug"`).
    pub log_level: Option<String>,
}

impl Config {
    /// Load config from `~/.flexcreek/config.toml`.
    /// Returns an error if the file exists but is invalid.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.flexcreek/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".flexcreek").join("config.toml"))
    }
}
