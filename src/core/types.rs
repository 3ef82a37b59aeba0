//! core::types
//!
//! Domain types for changelog computation.
//!
//! # Wire format
//!
//! All types serialize with camelCase keys so manifests can be consumed by
//! tooling that expects the `releaseTimestamp` / `gitRef` / `compare.url`
//! shapes. A `ChangeLogRelease` is also the value stored in the release-pair
//! cache, so its serialized form must stay stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A released version of a dependency, as reported by its datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Version string in the dependency's versioning scheme
    pub version: String,
    /// When the version was published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_timestamp: Option<DateTime<Utc>>,
    /// Explicit commit or tag for this version, if the datasource knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
}

impl Release {
    /// A release with only a version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            release_timestamp: None,
            git_ref: None,
        }
    }

    /// Set the publish timestamp.
    pub fn released_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.release_timestamp = Some(timestamp);
        self
    }

    /// Set the explicit git ref.
    pub fn with_git_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }
}

/// Input for one changelog computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogConfig {
    /// API root for self-hosted sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Versioning scheme name, e.g. `semver`
    #[serde(default = "default_versioning")]
    pub versioning: String,
    /// Currently installed version (exclusive lower bound)
    pub from_version: String,
    /// Target version (inclusive upper bound)
    pub to_version: String,
    /// Repository URL of the dependency
    pub source_url: String,
    /// Every known release of the dependency, in any order
    #[serde(default)]
    pub releases: Vec<Release>,
    /// Dependency name, also used as a tag prefix
    pub dep_name: String,
    /// Package manager that owns the dependency
    pub manager: String,
}

fn default_versioning() -> String {
    crate::versioning::DEFAULT_VERSIONING.to_string()
}

/// A single commit in a changelog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    /// Commit hash
    pub sha: String,
    /// Commit message
    pub message: String,
    /// Commit date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// Compare link between two refs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compare {
    /// Web URL of the comparison, absent when a ref could not be resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Compare {
    /// Whether no link is available.
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
    }
}

/// One upgrade step: the transition into `version` from its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogRelease {
    /// The version this step upgrades to
    pub version: String,
    /// Release date of `version`
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Commits in this step; always empty when first computed
    #[serde(default)]
    pub changes: Vec<Change>,
    /// Compare link from the previous version
    #[serde(default)]
    pub compare: Compare,
}

/// Metadata about the repository a changelog was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogProject {
    /// API root with trailing slash
    pub api_base_url: String,
    /// Web root with trailing slash
    pub base_url: String,
    /// `owner/repo`
    pub repository: String,
    /// Source URL as configured
    pub source_url: String,
    /// Dependency name
    pub dep_name: String,
}

/// Final changelog manifest, newest version first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogResult {
    /// Repository metadata
    pub project: ChangeLogProject,
    /// Upgrade steps, newest first
    pub versions: Vec<ChangeLogRelease>,
}

/// User-actionable reasons a changelog could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeLogError {
    /// The source is on github.com but no token is configured for it
    MissingGithubToken,
}

impl std::fmt::Display for ChangeLogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeLogError::MissingGithubToken => write!(
                f,
                "no github.com token configured; run 'upstep auth' or set GITHUB_TOKEN"
            ),
        }
    }
}

/// Outcome of a changelog computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeLogOutcome {
    /// A manifest was produced
    Found(ChangeLogResult),
    /// The user must fix something before a manifest can be produced
    Error(ChangeLogError),
    /// No changelog applies (denylisted, unsupported host, too few releases)
    Skipped,
}

impl ChangeLogOutcome {
    /// The manifest, if one was produced.
    pub fn result(&self) -> Option<&ChangeLogResult> {
        match self {
            ChangeLogOutcome::Found(r) => Some(r),
            _ => None,
        }
    }

    /// Whether nothing applied.
    pub fn is_skipped(&self) -> bool {
        matches!(self, ChangeLogOutcome::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn release_wire_format_is_camel_case() {
        let release = Release::new("1.0.0")
            .released_at(Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap())
            .with_git_ref("abc123");
        let json = serde_json::to_value(&release).unwrap();
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["releaseTimestamp"], "2020-01-02T03:04:05Z");
        assert_eq!(json["gitRef"], "abc123");
    }

    #[test]
    fn config_defaults_versioning_and_releases() {
        let config: ChangeLogConfig = serde_json::from_value(serde_json::json!({
            "fromVersion": "1.0.0",
            "toVersion": "2.0.0",
            "sourceUrl": "https://github.com/a/b",
            "depName": "b",
            "manager": "npm"
        }))
        .unwrap();
        assert_eq!(config.versioning, "semver");
        assert!(config.releases.is_empty());
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn empty_compare_serializes_as_empty_object() {
        let entry = ChangeLogRelease {
            version: "1.1.0".into(),
            date: None,
            changes: vec![],
            compare: Compare::default(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["compare"], serde_json::json!({}));
        assert_eq!(json["changes"], serde_json::json!([]));
        assert!(entry.compare.is_empty());
    }

    #[test]
    fn outcome_accessors() {
        assert!(ChangeLogOutcome::Skipped.is_skipped());
        assert!(ChangeLogOutcome::Skipped.result().is_none());
        let err = ChangeLogOutcome::Error(ChangeLogError::MissingGithubToken);
        assert!(!err.is_skipped());
        assert!(err.result().is_none());
    }

    #[test]
    fn missing_token_message_is_actionable() {
        let msg = ChangeLogError::MissingGithubToken.to_string();
        assert!(msg.contains("upstep auth"));
    }
}
