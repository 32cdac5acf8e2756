//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/lightbucket/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/lightbucket/` (~/.config/lightbucket/)
//! - Data: `$XDG_DATA_HOME/lightbucket/` (~/.local/share/lightbucket/)
//! - State/Logs: `$XDG_STATE_HOME/lightbucket/` (~/.local/state/lightbucket/)
//!
//! The API key is stored encrypted; see [`crate::credentials`]. The decrypted,
//! in-memory view lives in [`crate::settings::SessionConfig`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Lightbucket reporting configuration
    #[serde(default)]
    pub lightbucket: LightbucketConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Lightbucket reporting configuration, as persisted.
///
/// `api_key` holds the encrypted form. Use [`crate::settings::ConfigStore`]
/// to get a decrypted [`crate::settings::SessionConfig`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LightbucketConfig {
    /// Enable/disable reporting
    #[serde(default)]
    pub enabled: bool,

    /// Lightbucket account username
    #[serde(default)]
    pub username: String,

    /// Encrypted API key (base64 of nonce + ciphertext)
    #[serde(default)]
    pub api_key: String,

    /// Lightbucket server URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for LightbucketConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: String::new(),
            api_key: String::new(),
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://app.lightbucket.co".to_string()
}

impl LightbucketConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "lightbucket.base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.username.is_empty() {
            return Err(Error::Config(
                "lightbucket.username is required when reporting is enabled".to_string(),
            ));
        }
        if self.api_key.is_empty() {
            return Err(Error::Config(
                "lightbucket.api_key is required when reporting is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Page where users generate API credentials
    pub fn api_credentials_url(&self) -> String {
        format!("{}/api_credentials", self.base_url.trim_end_matches('/'))
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Write configuration to a specific path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/lightbucket/config.toml` (~/.config/lightbucket/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("lightbucket").join("config.toml")
    }

    /// Returns the data directory path (for the credential key)
    ///
    /// `$XDG_DATA_HOME/lightbucket/` (~/.local/share/lightbucket/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("lightbucket")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/lightbucket/` (~/.local/state/lightbucket/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("lightbucket")
    }

    /// Returns the credential key file path
    ///
    /// `$XDG_DATA_HOME/lightbucket/credential.key`
    pub fn key_path() -> PathBuf {
        Self::data_dir().join("credential.key")
    }

    /// Ensure XDG base directory environment variables are set.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
