//! hosts
//!
//! Host rules: credential and endpoint resolution per host.
//!
//! # Resolution order
//!
//! For a URL, the host is extracted and normalized (`api.github.com` is
//! treated as `github.com`). The token is then taken from the first source
//! that has one:
//!
//! 1. A configured `[[host_rules]]` entry whose `match_host` equals the host
//! 2. The environment: `GITHUB_TOKEN` for github.com, otherwise
//!    `UPSTEP_TOKEN_<HOST>` with non-alphanumerics replaced by `_`
//! 3. The secret store key `<host>.token`
//!
//! A failing secret store is logged and treated as "no token"; credential
//! lookup never aborts a run.
//!
//! # Example
//!
//! ```
//! use upstep::hosts::{HostRules, HostType};
//!
//! let rules = HostRules::new(Vec::new()).with_env([("GITHUB_TOKEN", "ghp_x")]);
//! let rule = rules.find(HostType::GitHub, "https://api.github.com/");
//! assert!(rule.token.is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::config::HostRuleConfig;
use crate::secrets::{token_key, SecretStore};

/// Hosting platform a rule applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    /// GitHub and GitHub Enterprise
    #[default]
    GitHub,
}

impl std::fmt::Display for HostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostType::GitHub => write!(f, "github"),
        }
    }
}

/// Resolved settings for one host.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HostRule {
    /// Configured API root, if any
    pub endpoint: Option<String>,
    /// Token, if one was found
    pub token: Option<String>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for HostRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRule")
            .field("endpoint", &self.endpoint)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

/// Credential resolver over configured rules, environment and secret store.
#[derive(Clone, Default)]
pub struct HostRules {
    rules: Vec<HostRuleConfig>,
    env: HashMap<String, String>,
    store: Option<Arc<dyn SecretStore>>,
}

impl std::fmt::Debug for HostRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRules")
            .field("rules", &self.rules.len())
            .field("env_tokens", &self.env.len())
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

impl HostRules {
    /// Create a resolver from configured rules only.
    pub fn new(rules: Vec<HostRuleConfig>) -> Self {
        Self {
            rules,
            env: HashMap::new(),
            store: None,
        }
    }

    /// Capture token variables from the process environment.
    pub fn with_process_env(self) -> Self {
        let vars = std::env::vars()
            .filter(|(k, _)| k == "GITHUB_TOKEN" || k.starts_with("UPSTEP_TOKEN_"));
        self.with_env(vars)
    }

    /// Use the given variables as the environment.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        self
    }

    /// Fall back to a secret store.
    pub fn with_secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Resolve the rule for `url`.
    ///
    /// Unparseable URLs resolve to an empty rule.
    pub fn find(&self, host_type: HostType, url: &str) -> HostRule {
        let Some(host) = host_of(url) else {
            debug!(url, "cannot determine host for credential lookup");
            return HostRule::default();
        };

        let configured = self
            .rules
            .iter()
            .find(|r| r.host_type == host_type && normalize_host(&r.match_host) == host);

        let token = configured
            .and_then(|r| r.token.clone())
            .or_else(|| self.env_token(&host))
            .or_else(|| self.stored_token(&host));

        debug!(
            host = %host,
            %host_type,
            configured = configured.is_some(),
            has_token = token.is_some(),
            "resolved host rule"
        );

        HostRule {
            endpoint: configured.and_then(|r| r.endpoint.clone()),
            token,
        }
    }

    fn env_token(&self, host: &str) -> Option<String> {
        if host == "github.com" {
            if let Some(token) = self.env.get("GITHUB_TOKEN") {
                return Some(token.clone());
            }
        }
        self.env.get(&env_var_for(host)).cloned()
    }

    fn stored_token(&self, host: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.get(&token_key(host)) {
            Ok(token) => token,
            Err(e) => {
                warn!(host, error = %e, "secret store unavailable; continuing without token");
                None
            }
        }
    }
}

/// Extract and normalize the host of a URL.
fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(normalize_host)
}

/// Lowercase a host and fold the public GitHub API host into `github.com`.
fn normalize_host(host: &str) -> String {
    let host = host.trim().to_lowercase();
    if host == "api.github.com" {
        "github.com".to_string()
    } else {
        host
    }
}

/// Environment variable holding the token for `host`.
fn env_var_for(host: &str) -> String {
    let suffix: String = host
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("UPSTEP_TOKEN_{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{MemorySecretStore, SecretError};

    fn rule(host: &str, token: Option<&str>) -> HostRuleConfig {
        HostRuleConfig {
            host_type: HostType::GitHub,
            match_host: host.to_string(),
            endpoint: Some(format!("https://{}/api/v3/", host)),
            token: token.map(String::from),
        }
    }

    struct BrokenStore;

    impl SecretStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, SecretError> {
            Err(SecretError::ReadError("disk on fire".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), SecretError> {
            Ok(())
        }
        fn delete(&self, _key: &str) -> Result<(), SecretError> {
            Ok(())
        }
    }

    #[test]
    fn no_sources_means_no_token() {
        let rules = HostRules::new(vec![]);
        let found = rules.find(HostType::GitHub, "https://api.github.com/");
        assert_eq!(found, HostRule::default());
    }

    #[test]
    fn github_token_env_applies_to_api_and_web_hosts() {
        let rules = HostRules::new(vec![]).with_env([("GITHUB_TOKEN", "ghp_env")]);
        for url in ["https://api.github.com/", "https://github.com/a/b"] {
            assert_eq!(
                rules.find(HostType::GitHub, url).token.as_deref(),
                Some("ghp_env"),
                "{}",
                url
            );
        }
        assert!(rules
            .find(HostType::GitHub, "https://ghe.example.com/a/b")
            .token
            .is_none());
    }

    #[test]
    fn per_host_env_var() {
        let rules =
            HostRules::new(vec![]).with_env([("UPSTEP_TOKEN_GHE_EXAMPLE_COM", "ghe_env")]);
        let found = rules.find(HostType::GitHub, "https://GHE.example.com/org/lib");
        assert_eq!(found.token.as_deref(), Some("ghe_env"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let rules = HostRules::new(vec![]).with_env([("GITHUB_TOKEN", "  ")]);
        assert!(rules
            .find(HostType::GitHub, "https://api.github.com/")
            .token
            .is_none());
    }

    #[test]
    fn configured_rule_wins_and_supplies_endpoint() {
        let store = Arc::new(MemorySecretStore::with_secrets([(
            "ghe.example.com.token",
            "from_store",
        )]));
        let rules = HostRules::new(vec![rule("ghe.example.com", Some("from_config"))])
            .with_env([("UPSTEP_TOKEN_GHE_EXAMPLE_COM", "from_env")])
            .with_secret_store(store);

        let found = rules.find(HostType::GitHub, "https://ghe.example.com/org/lib");
        assert_eq!(found.token.as_deref(), Some("from_config"));
        assert_eq!(
            found.endpoint.as_deref(),
            Some("https://ghe.example.com/api/v3/")
        );
    }

    #[test]
    fn env_beats_store() {
        let store = Arc::new(MemorySecretStore::with_secrets([(
            "github.com.token",
            "from_store",
        )]));
        let rules = HostRules::new(vec![])
            .with_env([("GITHUB_TOKEN", "from_env")])
            .with_secret_store(store);
        assert_eq!(
            rules
                .find(HostType::GitHub, "https://api.github.com/")
                .token
                .as_deref(),
            Some("from_env")
        );
    }

    #[test]
    fn store_used_for_rule_without_token() {
        let store = Arc::new(MemorySecretStore::with_secrets([(
            "ghe.example.com.token",
            "from_store",
        )]));
        let rules =
            HostRules::new(vec![rule("ghe.example.com", None)]).with_secret_store(store);
        let found = rules.find(HostType::GitHub, "https://ghe.example.com/org/lib");
        assert_eq!(found.token.as_deref(), Some("from_store"));
        assert!(found.endpoint.is_some());
    }

    #[test]
    fn broken_store_degrades_to_no_token() {
        let rules = HostRules::new(vec![]).with_secret_store(Arc::new(BrokenStore));
        assert!(rules
            .find(HostType::GitHub, "https://api.github.com/")
            .token
            .is_none());
    }

    #[test]
    fn unparseable_url_resolves_empty() {
        let rules = HostRules::new(vec![]).with_env([("GITHUB_TOKEN", "x")]);
        assert_eq!(
            rules.find(HostType::GitHub, "not a url"),
            HostRule::default()
        );
    }

    #[test]
    fn debug_redacts_token() {
        let found = HostRule {
            endpoint: None,
            token: Some("ghp_secret".into()),
        };
        let out = format!("{:?}", found);
        assert!(!out.contains("ghp_secret"));
        assert!(out.contains("has_token: true"));
    }

    #[test]
    fn env_var_names() {
        assert_eq!(env_var_for("ghe.example.com"), "UPSTEP_TOKEN_GHE_EXAMPLE_COM");
        assert_eq!(env_var_for("git-hub.io"), "UPSTEP_TOKEN_GIT_HUB_IO");
    }
}
