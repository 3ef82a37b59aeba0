//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. The path passed with `--config`
//! 2. `$UPSTEP_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/upstep/config.toml`
//! 4. `~/.upstep/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use upstep::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//! println!("cache minutes: {}", config.cache_minutes());
//! println!("secrets: {}", config.secrets_provider());
//! ```

pub mod schema;

pub use schema::{CacheSettings, ChangelogSettings, GlobalConfig, HostRuleConfig, SecretsConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::changelog::DEFAULT_CACHE_MINUTES;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file '{0}' does not exist")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Loaded configuration with defaulting accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed configuration file contents
    pub global: GlobalConfig,
    /// Path the configuration was loaded from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Wrap an already-parsed configuration.
    pub fn from_global(global: GlobalConfig) -> Self {
        Self { global, path: None }
    }

    /// Load configuration.
    ///
    /// An explicit path must exist; the default locations may be absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated, or if `explicit` does not exist.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let path = match explicit {
            Some(p) if p.exists() => Some(p.to_path_buf()),
            Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
            None => Self::default_locations().into_iter().find(|p| p.exists()),
        };

        match path {
            Some(p) => Self::load_from(&p),
            None => Ok(ConfigLoadResult {
                config: Config::default(),
                warnings: Vec::new(),
            }),
        }
    }

    /// Load and validate a specific config file.
    pub fn load_from(path: &Path) -> Result<ConfigLoadResult, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let global: GlobalConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        global.validate()?;

        let warnings = global
            .host_rules
            .iter()
            .filter(|rule| rule.token.is_some())
            .map(|rule| ConfigWarning {
                message: format!(
                    "host rule for '{}' stores a token in plain text; prefer 'upstep auth --host {}'",
                    rule.match_host, rule.match_host
                ),
                path: path.to_path_buf(),
            })
            .collect();

        Ok(ConfigLoadResult {
            config: Config {
                global,
                path: Some(path.to_path_buf()),
            },
            warnings,
        })
    }

    /// Candidate config paths, in search order.
    fn default_locations() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var("UPSTEP_CONFIG") {
            paths.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("upstep/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".upstep/config.toml"));
        }
        paths
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Minutes a computed release pair stays cached.
    ///
    /// Defaults to 55 if not configured.
    pub fn cache_minutes(&self) -> u32 {
        self.global
            .changelog
            .as_ref()
            .and_then(|c| c.cache_minutes)
            .unwrap_or(DEFAULT_CACHE_MINUTES)
    }

    /// Extra denylisted source URLs.
    pub fn denylist(&self) -> &[String] {
        self.global
            .changelog
            .as_ref()
            .and_then(|c| c.denylist.as_deref())
            .unwrap_or(&[])
    }

    /// Cache provider, defaults to "file".
    pub fn cache_provider(&self) -> &str {
        self.global
            .cache
            .as_ref()
            .and_then(|c| c.provider.as_deref())
            .unwrap_or(crate::cache::DEFAULT_PROVIDER)
    }

    /// Cache directory override.
    pub fn cache_dir(&self) -> Option<&Path> {
        self.global.cache.as_ref().and_then(|c| c.dir.as_deref())
    }

    /// Secrets provider, defaults to "file".
    pub fn secrets_provider(&self) -> &str {
        self.global
            .secrets
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or(crate::secrets::DEFAULT_PROVIDER)
    }

    /// Configured host rules.
    pub fn host_rules(&self) -> &[HostRuleConfig] {
        &self.global.host_rules
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
