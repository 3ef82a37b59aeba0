//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! [changelog]
//! cache_minutes = 55
//! denylist = ["https://github.com/DefinitelyTyped/DefinitelyTyped"]
//!
//! [cache]
//! provider = "file"
//!
//! [secrets]
//! provider = "file"
//!
//! [[host_rules]]
//! host_type = "github"
//! match_host = "ghe.example.com"
//! endpoint = "https://ghe.example.com/api/v3/"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing; unknown keys are rejected at parse
//! time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::hosts::HostType;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Changelog computation settings
    pub changelog: Option<ChangelogSettings>,

    /// Release-pair cache settings
    pub cache: Option<CacheSettings>,

    /// Secret storage settings
    pub secrets: Option<SecretsConfig>,

    /// Per-host credentials and endpoints
    pub host_rules: Vec<HostRuleConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(changelog) = &self.changelog {
            changelog.validate()?;
        }
        if let Some(cache) = &self.cache {
            cache.validate()?;
        }
        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }
        for rule in &self.host_rules {
            rule.validate()?;
        }
        Ok(())
    }
}

/// Changelog computation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ChangelogSettings {
    /// Minutes a computed release pair stays cached (default: 55)
    pub cache_minutes: Option<u32>,

    /// Source URLs that never get a changelog, in addition to the built-ins
    pub denylist: Option<Vec<String>>,
}

impl ChangelogSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_minutes == Some(0) {
            return Err(ConfigError::InvalidValue(
                "changelog.cache_minutes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Release-pair cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Provider to use ("file" or "memory")
    pub provider: Option<String>,

    /// Directory for the file provider (default: `~/.upstep/cache`)
    pub dir: Option<PathBuf>,
}

impl CacheSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            let valid = crate::cache::valid_provider_names();
            if !valid.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid cache provider '{}', must be one of: {}",
                    provider,
                    valid.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Provider to use ("file" or "memory")
    pub provider: Option<String>,
}

impl SecretsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            let valid = crate::secrets::valid_provider_names();
            if !valid.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid secrets provider '{}', must be one of: {}",
                    provider,
                    valid.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// A host rule: credentials and API endpoint for one host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HostRuleConfig {
    /// Platform the rule applies to
    #[serde(default)]
    pub host_type: HostType,

    /// Host name the rule matches, e.g. `ghe.example.com`
    pub match_host: String,

    /// API root for the host
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Inline token (prefer `upstep auth`, which uses the secret store)
    #[serde(default)]
    pub token: Option<String>,
}

impl HostRuleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.match_host.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "host_rules.match_host cannot be empty".to_string(),
            ));
        }
        if self.match_host.contains("://") || self.match_host.contains('/') {
            return Err(ConfigError::InvalidValue(format!(
                "host_rules.match_host '{}' must be a bare host name",
                self.match_host
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config, GlobalConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn full_document_parses() {
        let config: GlobalConfig = toml::from_str(
            r#"
            [changelog]
            cache_minutes = 30
            denylist = ["https://github.com/acme/monorepo"]

            [cache]
            provider = "memory"

            [secrets]
            provider = "file"

            [[host_rules]]
            match_host = "ghe.example.com"
            endpoint = "https://ghe.example.com/api/v3/"
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        let changelog = config.changelog.unwrap();
        assert_eq!(changelog.cache_minutes, Some(30));
        assert_eq!(config.host_rules.len(), 1);
        assert_eq!(config.host_rules[0].host_type, HostType::GitHub);
        assert!(config.host_rules[0].token.is_none());
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<GlobalConfig, _> = toml::from_str("colour = \"blue\"");
        assert!(result.is_err());
    }

    #[test]
    fn zero_cache_minutes_rejected() {
        let config = GlobalConfig {
            changelog: Some(ChangelogSettings {
                cache_minutes: Some(0),
                denylist: None,
            }),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn unknown_providers_rejected() {
        let config = GlobalConfig {
            cache: Some(CacheSettings {
                provider: Some("redis".into()),
                dir: None,
            }),
            ..Default::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("redis"));

        let config = GlobalConfig {
            secrets: Some(SecretsConfig {
                provider: Some("keychain".into()),
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn host_rule_needs_bare_host() {
        for bad in ["", "  ", "https://ghe.example.com", "ghe.example.com/api"] {
            let config = GlobalConfig {
                host_rules: vec![HostRuleConfig {
                    host_type: HostType::GitHub,
                    match_host: bad.to_string(),
                    endpoint: None,
                    token: None,
                }],
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", bad);
        }
    }
}
