//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/eventstream/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/eventstream/` (~/.config/eventstream/)
//! - State/Logs: `$XDG_STATE_HOME/eventstream/` (~/.local/state/eventstream/)

use crate::context::{ConfigReader, ScopeType, StaticStore};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Flag path gating the whole forwarder
pub const XML_PATH_ENABLED: &str = "webscale_eventstream/general/enabled";

/// Flag path gating informational (developer) log entries
pub const XML_PATH_LOGGING: &str = "webscale_eventstream/developer/logging";

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

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Feature flags
    #[serde(default)]
    pub eventstream: EventStreamConfig,

    /// Payload options
    #[serde(default)]
    pub payload: PayloadConfig,

    /// Store context used when no host application supplies one
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Feature flags, with optional website-scope overrides
///
/// ```toml
/// [eventstream]
/// enabled = true
/// logging = false
///
/// [eventstream.website]
/// logging = true
/// ```
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EventStreamConfig {
    /// Send login events at all
    #[serde(default)]
    pub enabled: bool,

    /// Log successful sends and skipped logins
    #[serde(default)]
    pub logging: bool,

    /// Website-scope overrides
    #[serde(default)]
    pub website: FlagOverrides,
}

/// Per-scope overrides; unset fields fall back to the default scope
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FlagOverrides {
    pub enabled: Option<bool>,
    pub logging: Option<bool>,
}

impl ConfigReader for EventStreamConfig {
    fn is_set_flag(&self, path: &str, scope: ScopeType) -> bool {
        let (default, website) = match path {
            XML_PATH_ENABLED => (self.enabled, self.website.enabled),
            XML_PATH_LOGGING => (self.logging, self.website.logging),
            _ => return false,
        };

        match scope {
            ScopeType::Default => default,
            // Store scope inherits from its website
            ScopeType::Website | ScopeType::Store => website.unwrap_or(default),
        }
    }
}

/// Options affecting the event payload
#[derive(Debug, Deserialize, Clone)]
pub struct PayloadConfig {
    /// Cookie whose value is forwarded as the session identifier
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
        }
    }
}

fn default_cookie_name() -> String {
    "wbs_uid".to_string()
}

/// Fixed store context
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Base web URL of the store (e.g., `https://shop.example.com/`)
    pub base_url: Option<String>,

    /// Store view code
    #[serde(default = "default_store_code")]
    pub store_code: String,

    /// Website code
    #[serde(default = "default_website_code")]
    pub website_code: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            store_code: default_store_code(),
            website_code: default_website_code(),
        }
    }
}

fn default_store_code() -> String {
    "default".to_string()
}

fn default_website_code() -> String {
    "base".to_string()
}

impl StoreConfig {
    /// Build a store context, optionally overriding the base URL
    pub fn to_store(&self, base_url: Option<&str>) -> StaticStore {
        StaticStore {
            base_url: base_url
                .map(str::to_string)
                .or_else(|| self.base_url.clone()),
            store_code: Some(self.store_code.clone()),
            website_code: Some(self.website_code.clone()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
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

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/eventstream/config.toml` (~/.config/eventstream/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("eventstream").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/eventstream/` (~/.local/state/eventstream/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("eventstream")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/eventstream/eventstream.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("eventstream.log")
    }
}
