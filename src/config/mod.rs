//! Framework configuration
//!
//! The configuration covers the protocol version stamped on generated
//! telegrams, the synchronisation policy of the registry and logging.
//!
//! # Files
//!
//! Configuration files are JSON or TOML, chosen by extension. The default
//! location is platform dependent:
//! - **Linux**: `~/.config/dev.plugin-channels/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.plugin-channels/config.toml`
//! - **Windows**: `%APPDATA%\dev.plugin-channels\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use plugin_channels::{channels::PluginChannels, config::FrameworkConfig};
//!
//! let config = FrameworkConfig::load_or_default("plugin.toml");
//! let registry = PluginChannels::from_config(&config)?;
//! ```

use crate::error::{PluginError, Result};
use crate::markup::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.plugin-channels";

/// Config filename inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "info,plugin_channels=debug";

/// Default prefix of rolling log files
pub const DEFAULT_LOG_FILE_PREFIX: &str = "plugin-channels.log";

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

// ==================== Sections ====================

/// Telegram protocol settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// `major.minor` version written on outgoing telegrams and assumed
    /// for incoming ones that carry none
    #[serde(default = "default_protocol_version")]
    pub version: String,
}

fn default_protocol_version() -> String {
    Version::CURRENT.to_string()
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            version: default_protocol_version(),
        }
    }
}

/// Registry synchronisation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Push pending changes to the host after every handled telegram
    #[serde(default = "default_true")]
    pub auto_synchronize: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_synchronize: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Directory for daily rolling log files; console only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_log_file_prefix() -> String {
    DEFAULT_LOG_FILE_PREFIX.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            log_dir: None,
            file_prefix: default_log_file_prefix(),
        }
    }
}

// ==================== Framework Config ====================

/// Complete framework configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameworkConfig {
    #[serde(default)]
    pub protocol: ProtocolConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FrameworkConfig {
    /// Configured protocol version
    pub fn protocol_version(&self) -> Result<Version> {
        Version::parse(&self.protocol.version).ok_or_else(|| {
            PluginError::Config(format!(
                "Invalid protocol version '{}'",
                self.protocol.version
            ))
        })
    }

    /// Load a config file; `.toml` files are TOML, everything else JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PluginError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = if is_toml(path) {
            toml::from_str(&content).map_err(|e| {
                PluginError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                PluginError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        config.protocol_version()?;
        Ok(config)
    }

    /// Load a config file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save in the format matching the file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PluginError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = if is_toml(path) {
            toml::to_string_pretty(self)
                .map_err(|e| PluginError::Config(format!("Failed to serialize config: {}", e)))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| PluginError::Config(format!("Failed to serialize config: {}", e)))?
        };

        std::fs::write(path, content).map_err(|e| {
            PluginError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = FrameworkConfig::default();
        assert_eq!(config.protocol.version, "1.1");
        assert_eq!(config.protocol_version().unwrap(), Version::CURRENT);
        assert!(config.sync.auto_synchronize);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: FrameworkConfig = toml::from_str(
            r#"
            [sync]
            auto_synchronize = false
            "#,
        )
        .unwrap();
        assert!(!config.sync.auto_synchronize);
        assert_eq!(config.protocol.version, "1.1");
        assert_eq!(config.logging.file_prefix, DEFAULT_LOG_FILE_PREFIX);
    }

    #[test]
    fn test_save_and_load_both_formats() {
        let dir = tempdir().unwrap();
        let mut config = FrameworkConfig::default();
        config.protocol.version = "1.0".to_string();
        config.logging.log_dir = Some(dir.path().join("logs"));

        for name in ["config.toml", "config.json"] {
            let path = dir.path().join("nested").join(name);
            config.save(&path).unwrap();
            let loaded = FrameworkConfig::load(&path).unwrap();
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_invalid_version_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"protocol": {"version": "one"}}"#).unwrap();
        assert!(matches!(
            FrameworkConfig::load(&path),
            Err(PluginError::Config(_))
        ));
        assert_eq!(FrameworkConfig::load_or_default(&path), FrameworkConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = FrameworkConfig::load_or_default("/nonexistent/plugin.toml");
        assert_eq!(config, FrameworkConfig::default());
    }
}
