//! Configuration for the daemon and CLI.
//!
//! Loads settings from /etc/bizventure/config.toml, the user config dir,
//! or falls back to defaults. Every field has a serde default so partial
//! files stay valid across upgrades.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::economy::EconomyParams;

/// System-wide config file path
pub const CONFIG_PATH: &str = "/etc/bizventure/config.toml";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the JSON API
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8640".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Database location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    data_dir()
        .join("bizventure.db")
        .to_string_lossy()
        .into_owned()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Session token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minutes a bearer token stays valid after issue
    #[serde(default = "default_session_ttl")]
    pub ttl_minutes: u64,
}

fn default_session_ttl() -> u64 {
    1440 // one day
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_session_ttl(),
        }
    }
}

/// Full configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub economy: EconomyParams,
}

impl Config {
    /// Load config from the system path, then the user config dir, then
    /// defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(&user_config_path().to_string_lossy()))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            })
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path);
        Ok(config)
    }

    /// Write the default config to a path (for init)
    pub fn save_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)?;
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved default config to {}", path);
        Ok(())
    }
}

/// Per-user config file location
pub fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/etc"))
        .join("bizventure")
        .join("config.toml")
}

/// Data directory for the database
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("bizventure")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8640");
        assert_eq!(config.session.ttl_minutes, 1440);
        assert_eq!(config.economy.event_chance, 0.30);
        assert_eq!(config.economy.daily_expense_min_cents, 1000);
        assert!(config.database.path.ends_with("bizventure.db"));
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let toml_str = r#"
[server]
bind_addr = "0.0.0.0:9000"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        // Untouched sections fall back
        assert_eq!(config.session.ttl_minutes, 1440);
        assert_eq!(config.economy.event_chance, 0.30);
    }

    #[test]
    fn test_parse_economy_overrides() {
        let toml_str = r#"
[economy]
event_chance = 0.5
daily_expense_min_cents = 500
rng_seed = 12345
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.economy.event_chance, 0.5);
        assert_eq!(config.economy.daily_expense_min_cents, 500);
        // Missing fields keep their defaults
        assert_eq!(config.economy.daily_expense_max_cents, 5000);
        assert_eq!(config.economy.rng_seed, Some(12345));
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_string_lossy();

        Config::save_default(&path_str).unwrap();
        let loaded = Config::load_from_path(&path_str).unwrap();
        assert_eq!(loaded.server.bind_addr, Config::default().server.bind_addr);
        assert_eq!(loaded.economy.demand_draw_min, 0.6);
    }
}
