//! forge::factory
//!
//! Repository location parsing and forge creation.
//!
//! # Design
//!
//! Callers hand the factory a dependency's source URL and get back a
//! [`RepoLocation`] that knows the web base, the API base and the
//! `owner/repo` slug. `create_forge` then builds the forge for that
//! location, so changelog and automerge code never import a specific
//! forge implementation.
//!
//! # API base detection
//!
//! - `https://github.com/...` → `https://api.github.com/`
//! - anything else → the configured endpoint, or `{scheme}://{host}/api/v3/`
//!   (the GitHub Enterprise convention) when no endpoint is configured
//!
//! # Example
//!
//! ```
//! use upstep::forge::RepoLocation;
//!
//! let loc = RepoLocation::parse("https://github.com/octocat/hello-world", None).unwrap();
//! assert_eq!(loc.base_url(), "https://github.com/");
//! assert_eq!(loc.api_base_url(), "https://api.github.com/");
//! assert_eq!(loc.repository(), Some("octocat/hello-world"));
//! ```

use reqwest::Url;

use super::github::{GitHubForge, DEFAULT_API_BASE};
use super::traits::Forge;

/// Prefix identifying sources hosted on public GitHub.
const PUBLIC_GITHUB_PREFIX: &str = "https://github.com/";

/// A parsed repository source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    /// The source URL exactly as given
    source_url: String,
    /// Host name without port
    host: String,
    /// Web base, `{scheme}://{host[:port]}/`
    base_url: String,
    /// API root with trailing slash
    api_base_url: String,
    /// Path with leading/trailing slashes and `.git` removed
    path: String,
}

impl RepoLocation {
    /// Parse a source URL.
    ///
    /// Returns `None` unless the URL is absolute with a host. The path may be
    /// empty; whether it names a repository is decided by [`repository`](Self::repository).
    ///
    /// `endpoint` is the API root used for hosts other than public GitHub.
    pub fn parse(source_url: &str, endpoint: Option<&str>) -> Option<Self> {
        let url = Url::parse(source_url).ok()?;
        let host = url.host_str()?.to_string();

        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.clone(),
        };
        let base_url = format!("{}://{}/", url.scheme(), authority);

        let path = url.path().trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path).to_string();

        let api_base_url = if source_url.starts_with(PUBLIC_GITHUB_PREFIX) {
            DEFAULT_API_BASE.to_string()
        } else {
            match endpoint {
                Some(e) if !e.trim().is_empty() => format!("{}/", e.trim().trim_end_matches('/')),
                _ => format!("{}api/v3/", base_url),
            }
        };

        Some(Self {
            source_url: source_url.to_string(),
            host,
            base_url,
            api_base_url,
            path,
        })
    }

    /// The source URL as given.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Host name without port.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Web base URL with trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// API root with trailing slash.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Whether the source lives on public github.com.
    pub fn is_public_github(&self) -> bool {
        self.source_url.starts_with(PUBLIC_GITHUB_PREFIX)
    }

    /// Whether the host is github.com or one of its subdomains.
    pub fn is_github_host(&self) -> bool {
        self.host == "github.com" || self.host.ends_with(".github.com")
    }

    /// URL used to look up credentials for this location.
    ///
    /// Public GitHub credentials are keyed by the API root; everything else
    /// by the source URL itself.
    pub fn credential_url(&self) -> &str {
        if self.is_public_github() {
            DEFAULT_API_BASE
        } else {
            &self.source_url
        }
    }

    /// The `owner/repo` slug, if the path is exactly two non-empty segments.
    pub fn repository(&self) -> Option<&str> {
        self.owner_and_repo().map(|_| self.path.as_str())
    }

    /// Split slug into owner and repo.
    pub fn owner_and_repo(&self) -> Option<(&str, &str)> {
        let mut parts = self.path.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
                Some((owner, repo))
            }
            _ => None,
        }
    }
}

/// Create the forge serving a repository location.
///
/// Returns `None` when the location does not name an `owner/repo` pair.
pub fn create_forge(location: &RepoLocation, token: Option<String>) -> Option<Box<dyn Forge>> {
    let (owner, repo) = location.owner_and_repo()?;
    Some(Box::new(
        GitHubForge::new(location.api_base_url(), owner, repo).with_token(token),
    ))
}

/// Builds forges for repository locations.
///
/// Changelog assembly goes through this trait so a test can hand it a
/// [`MockForge`](super::mock::MockForge) instead of a network client.
pub trait ForgeProvider: Send + Sync {
    /// The forge for `location`, or `None` if the location is unsupported.
    fn forge_for(&self, location: &RepoLocation, token: Option<String>) -> Option<Box<dyn Forge>>;
}

/// [`ForgeProvider`] backed by [`create_forge`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpForgeProvider;

impl ForgeProvider for HttpForgeProvider {
    fn forge_for(&self, location: &RepoLocation, token: Option<String>) -> Option<Box<dyn Forge>> {
        create_forge(location, token)
    }
}
