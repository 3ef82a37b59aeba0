//! changelog
//!
//! Changelog manifest assembly.
//!
//! # Design
//!
//! [`compute_changelog`] turns a dependency's release list into a list of
//! upgrade steps between `from_version` (exclusive) and `to_version`
//! (inclusive), newest first, each with a compare link between the refs of
//! the two adjacent releases.
//!
//! Before any network access the input passes a chain of gates; each one
//! that fails ends the run with [`ChangeLogOutcome::Skipped`], except a
//! github.com source without a token, which yields
//! [`ChangeLogError::MissingGithubToken`] so the user can be told how to fix
//! it.
//!
//! Every step is cached under `manager:depName:prev:next`. A cached step is
//! reused as-is and the tag listing is only fetched on a miss, so a repeated
//! run inside the TTL makes no remote calls.
//!
//! The cache is advisory: read and write failures are logged and the run
//! continues as if the entry were absent.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use upstep::cache::MemoryCache;
//! use upstep::changelog::{compute_changelog, Collaborators};
//! use upstep::core::types::{ChangeLogConfig, Release};
//! use upstep::forge::mock::MockForge;
//! use upstep::hosts::HostRules;
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::with_tags(["v1.0.0", "v1.1.0"]);
//! let collaborators = Collaborators::new(
//!     HostRules::new(vec![]).with_env([("GITHUB_TOKEN", "t")]),
//!     Arc::new(MemoryCache::new()),
//! )
//! .with_forge_provider(Arc::new(forge));
//!
//! let config = ChangeLogConfig {
//!     endpoint: None,
//!     versioning: "semver".into(),
//!     from_version: "1.0.0".into(),
//!     to_version: "1.1.0".into(),
//!     source_url: "https://github.com/acme/lib".into(),
//!     releases: vec![Release::new("1.0.0"), Release::new("1.1.0")],
//!     dep_name: "lib".into(),
//!     manager: "npm".into(),
//! };
//!
//! let outcome = compute_changelog(&config, &collaborators).await.unwrap();
//! let result = outcome.result().unwrap();
//! assert_eq!(
//!     result.versions[0].compare.url.as_deref(),
//!     Some("https://github.com/acme/lib/compare/v1.0.0...v1.1.0")
//! );
//! # });
//! ```

pub mod notes;
pub mod tags;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::ReleaseCache;
use crate::core::config::Config;
use crate::core::types::{
    ChangeLogConfig, ChangeLogError, ChangeLogOutcome, ChangeLogProject, ChangeLogRelease,
    ChangeLogResult, Compare, Release,
};
use crate::forge::{ForgeError, ForgeProvider, HttpForgeProvider, RepoLocation};
use crate::hosts::{HostRules, HostType};
use crate::versioning::{self, Versioning};

pub use notes::{PassthroughNotes, ReleaseNotes};
pub use tags::{scoped_version, TagResolver};

/// Minutes a computed step stays cached.
pub const DEFAULT_CACHE_MINUTES: u32 = 55;

/// Cache namespace for computed steps.
pub const CACHE_NAMESPACE: &str = "changelog-github-release";

/// Sources that never get a changelog.
pub const DEFAULT_DENYLIST: &[&str] = &["https://github.com/DefinitelyTyped/DefinitelyTyped"];

/// Fatal errors from changelog computation.
#[derive(Debug, Error)]
pub enum ChangelogError {
    #[error("unknown versioning scheme '{0}'")]
    UnknownVersioning(String),

    #[error("tag lookup failed: {0}")]
    Forge(#[from] ForgeError),
}

/// Services the assembler depends on.
#[derive(Clone)]
pub struct Collaborators {
    host_rules: HostRules,
    cache: Arc<dyn ReleaseCache>,
    forges: Arc<dyn ForgeProvider>,
    notes: Arc<dyn ReleaseNotes>,
    denylist: Vec<String>,
    cache_minutes: u32,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("host_rules", &self.host_rules)
            .field("denylist", &self.denylist)
            .field("cache_minutes", &self.cache_minutes)
            .finish_non_exhaustive()
    }
}

impl Collaborators {
    /// Collaborators with HTTP forges, passthrough notes, the built-in
    /// denylist and the default TTL.
    pub fn new(host_rules: HostRules, cache: Arc<dyn ReleaseCache>) -> Self {
        Self {
            host_rules,
            cache,
            forges: Arc::new(HttpForgeProvider),
            notes: Arc::new(PassthroughNotes),
            denylist: Vec::new(),
            cache_minutes: DEFAULT_CACHE_MINUTES,
        }
    }

    /// Collaborators using the denylist and TTL from `config`.
    pub fn from_config(config: &Config, host_rules: HostRules, cache: Arc<dyn ReleaseCache>) -> Self {
        Self::new(host_rules, cache)
            .with_denylist(config.denylist().iter().cloned())
            .with_cache_minutes(config.cache_minutes())
    }

    /// Use a different forge provider.
    pub fn with_forge_provider(mut self, forges: Arc<dyn ForgeProvider>) -> Self {
        self.forges = forges;
        self
    }

    /// Use a different release-notes enricher.
    pub fn with_notes(mut self, notes: Arc<dyn ReleaseNotes>) -> Self {
        self.notes = notes;
        self
    }

    /// Denylist these sources in addition to [`DEFAULT_DENYLIST`].
    pub fn with_denylist<I: IntoIterator<Item = String>>(mut self, extra: I) -> Self {
        self.denylist.extend(extra);
        self
    }

    /// Cache TTL for newly computed steps.
    pub fn with_cache_minutes(mut self, minutes: u32) -> Self {
        self.cache_minutes = minutes;
        self
    }

    fn is_denylisted(&self, source_url: &str) -> bool {
        let source = normalize_source(source_url);
        DEFAULT_DENYLIST
            .iter()
            .copied()
            .chain(self.denylist.iter().map(String::as_str))
            .any(|entry| normalize_source(entry) == source)
    }
}

fn normalize_source(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

/// Cache key of the step from `prev` to `next`.
pub fn cache_key(manager: &str, dep_name: &str, prev: &str, next: &str) -> String {
    format!("{}:{}:{}:{}", manager, dep_name, prev, next)
}

/// Compute the changelog manifest for one dependency upgrade.
///
/// # Errors
///
/// - [`ChangelogError::UnknownVersioning`] if `config.versioning` names no scheme
/// - [`ChangelogError::Forge`] if the tag listing is refused for bad credentials
pub async fn compute_changelog(
    config: &ChangeLogConfig,
    collaborators: &Collaborators,
) -> Result<ChangeLogOutcome, ChangelogError> {
    let scheme = versioning::get(&config.versioning)
        .map_err(|_| ChangelogError::UnknownVersioning(config.versioning.clone()))?;

    let manager = config.manager.as_str();
    let dep_name = config.dep_name.as_str();
    let source_url = config.source_url.as_str();

    if collaborators.is_denylisted(source_url) {
        debug!(manager, dep_name, source_url, "source is denylisted, no changelog");
        return Ok(ChangeLogOutcome::Skipped);
    }

    let Some(mut location) = RepoLocation::parse(source_url, config.endpoint.as_deref()) else {
        debug!(manager, dep_name, source_url, "cannot parse source URL");
        return Ok(ChangeLogOutcome::Skipped);
    };

    let rule = collaborators
        .host_rules
        .find(HostType::GitHub, location.credential_url());

    if rule.token.is_none() {
        if location.is_github_host() {
            warn!(
                manager,
                dep_name, source_url, "no github.com token configured, skipping changelog"
            );
            return Ok(ChangeLogOutcome::Error(ChangeLogError::MissingGithubToken));
        }
        debug!(
            manager,
            dep_name, source_url, "source URL matches no known host, skipping changelog"
        );
        return Ok(ChangeLogOutcome::Skipped);
    }

    // A host rule's endpoint applies when the input carries none.
    if config.endpoint.is_none() {
        if let Some(endpoint) = rule.endpoint.as_deref() {
            if let Some(relocated) = RepoLocation::parse(source_url, Some(endpoint)) {
                location = relocated;
            }
        }
    }

    let Some(repository) = location.repository().map(str::to_string) else {
        debug!(source_url, "source URL is not an owner/repo path");
        return Ok(ChangeLogOutcome::Skipped);
    };

    if config.releases.is_empty() {
        debug!(manager, dep_name, "no releases");
        return Ok(ChangeLogOutcome::Skipped);
    }

    let releases = valid_releases_ascending(&config.releases, scheme.as_ref());
    if releases.len() < 2 {
        debug!(manager, dep_name, valid = releases.len(), "not enough valid releases");
        return Ok(ChangeLogOutcome::Skipped);
    }

    let Some(forge) = collaborators.forges.forge_for(&location, rule.token.clone()) else {
        debug!(source_url, "no forge serves this source");
        return Ok(ChangeLogOutcome::Skipped);
    };
    let resolver = TagResolver::new(forge.as_ref(), dep_name, scheme.as_ref());

    let mut versions = Vec::new();
    for pair in releases.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if !in_window(scheme.as_ref(), &next.version, &config.from_version, &config.to_version) {
            continue;
        }

        let key = cache_key(manager, dep_name, &prev.version, &next.version);
        if let Some(cached) = cached_step(collaborators.cache.as_ref(), &key).await {
            versions.push(cached);
            continue;
        }

        let mut step = ChangeLogRelease {
            version: next.version.clone(),
            date: next.release_timestamp,
            changes: Vec::new(),
            compare: Compare::default(),
        };

        let prev_ref = resolver.get_ref(prev).await?;
        let next_ref = resolver.get_ref(next).await?;
        if let (Some(prev_ref), Some(next_ref)) = (prev_ref, next_ref) {
            step.compare.url = Some(format!(
                "{}{}/compare/{}...{}",
                location.base_url(),
                repository,
                prev_ref,
                next_ref
            ));
        }

        store_step(collaborators, &key, &step).await;
        versions.push(step);
    }
    versions.reverse();

    debug!(
        manager,
        dep_name,
        repository = %repository,
        steps = versions.len(),
        "computed changelog"
    );

    let result = ChangeLogResult {
        project: ChangeLogProject {
            api_base_url: location.api_base_url().to_string(),
            base_url: location.base_url().to_string(),
            repository,
            source_url: config.source_url.clone(),
            dep_name: config.dep_name.clone(),
        },
        versions,
    };

    Ok(ChangeLogOutcome::Found(
        collaborators.notes.add_release_notes(result).await,
    ))
}

/// Releases that are valid under `scheme`, in ascending order.
///
/// The sort is stable, so equal versions keep their input order.
fn valid_releases_ascending<'r>(releases: &'r [Release], scheme: &dyn Versioning) -> Vec<&'r Release> {
    let mut valid: Vec<&Release> = releases
        .iter()
        .filter(|r| scheme.is_version(&r.version))
        .collect();
    valid.sort_by(|a, b| scheme.sort_versions(&a.version, &b.version));
    valid
}

/// Whether `version` lies in `(from, to]`.
fn in_window(scheme: &dyn Versioning, version: &str, from: &str, to: &str) -> bool {
    scheme.is_greater_than(version, from) && !scheme.is_greater_than(version, to)
}

async fn cached_step(cache: &dyn ReleaseCache, key: &str) -> Option<ChangeLogRelease> {
    let value = match cache.get(CACHE_NAMESPACE, key).await {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "cache read failed, recomputing");
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(step) => Some(step),
        Err(e) => {
            warn!(key, error = %e, "ignoring malformed cache entry");
            None
        }
    }
}

async fn store_step(collaborators: &Collaborators, key: &str, step: &ChangeLogRelease) {
    let value = match serde_json::to_value(step) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "cannot serialize changelog step");
            return;
        }
    };
    if let Err(e) = collaborators
        .cache
        .set(CACHE_NAMESPACE, key, value, collaborators.cache_minutes)
        .await
    {
        warn!(key, error = %e, "cache write failed");
    }
}
