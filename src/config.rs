//! Configuration file handling.
//!
//! This module provides loading and saving of deprecation-scanner
//! configuration from a TOML file. Command-line flags take precedence over
//! every value here.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/deprecation-scanner/config.toml`
//! - macOS: `~/Library/Application Support/deprecation-scanner/config.toml`
//! - Windows: `%APPDATA%\deprecation-scanner\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! default_format = "human"
//! colorize = true
//! from_packages = ["lodash", "@types/node"]
//!
//! [message_filter]
//! case_sensitive = false
//! regex = false
//!
//! [engine]
//! command = "deprecation-engine"
//! args = ["--stdio"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::filter::MessageFilterOptions;

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use deprecation_scanner::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Format: {}", config.default_format);
/// println!("Engine: {}", config.engine.command);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "human", "structured", "tabular", "rich-text" and
    /// their aliases. Default: "human"
    pub default_format: String,

    /// Whether human output is colored when written to a terminal.
    ///
    /// Default: true
    pub colorize: bool,

    /// Origin packages to keep when no `--from-package` flag is provided.
    ///
    /// Default: empty (keep everything)
    pub from_packages: Vec<String>,

    #[serde(default)]
    pub message_filter: MessageFilterConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

/// Defaults for `--msg-grep` matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageFilterConfig {
    pub case_sensitive: bool,
    pub regex: bool,
}

impl From<&MessageFilterConfig> for MessageFilterOptions {
    fn from(config: &MessageFilterConfig) -> Self {
        MessageFilterOptions {
            case_sensitive: config.case_sensitive,
            regex: config.regex,
        }
    }
}

/// The analysis engine process to start for each scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default: "deprecation-engine"
    pub command: String,
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: "deprecation-engine".to_string(),
            args: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: "human".to_string(),
            colorize: true,
            from_packages: Vec::new(),
            message_filter: MessageFilterConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use deprecation_scanner::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("deprecation-scanner/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deprecation-scanner")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
