//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Design
//!
//! This module implements the `Forge` trait for GitHub and GitHub Enterprise.
//! Tags are read from `GET /repos/{owner}/{repo}/tags`, paginated 100 at a
//! time until a short page is returned. Branch status uses the combined
//! commit status endpoint, and branch merges use the merges endpoint.
//!
//! # Authentication
//!
//! A token is optional. When present it is sent as a bearer token; it is
//! never included in `Debug` output or error messages.
//!
//! # Rate Limiting
//!
//! GitHub reports exhausted rate limits as 403 or 429 responses. Both map to
//! `ForgeError::RateLimited` (a 403 only when `x-ratelimit-remaining` is `0`),
//! so a rate limit is never mistaken for a credential failure.
//!
//! # Example
//!
//! ```ignore
//! use upstep::forge::github::GitHubForge;
//! use upstep::forge::Forge;
//!
//! let forge = GitHubForge::new("https://api.github.com/", "octocat", "hello-world")
//!     .with_token(Some("ghp_xxx".to_string()));
//! let tags = forge.list_tags().await?;
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{BranchStatus, Forge, ForgeError, PullRequest, Tag};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com/";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "upstep";

/// Page size for list endpoints (GitHub's maximum).
const PER_PAGE: usize = 100;

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Bearer token, if one was configured for the host
    token: Option<String>,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL without trailing slash (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("has_token", &self.token.is_some())
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a GitHub forge for `owner/repo` against the given API root.
    ///
    /// A trailing slash on `api_base` is accepted and ignored.
    pub fn new(
        api_base: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        let api_base = api_base.into();
        Self {
            client: Client::new(),
            token: None,
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Attach a bearer token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Check if a token is configured.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let mut headers = HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ForgeError::AuthFailed("token contains invalid header characters".into())
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Issue a GET and decode the JSON body.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ForgeError> {
        let response = self
            .client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(Self::error_from_response(response, status).await)
        }
    }

    /// Map an error response from the API to a `ForgeError`.
    async fn error_from_response(response: Response, status: StatusCode) -> ForgeError {
        let rate_limit_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim() == "0")
            .unwrap_or(false);

        // Try to get error message from body
        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed(message),
            StatusCode::FORBIDDEN if rate_limit_exhausted => ForgeError::RateLimited,
            StatusCode::FORBIDDEN => ForgeError::AuthFailed(format!("Permission denied: {}", message)),
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, ForgeError> {
        let mut tags: Vec<Tag> = Vec::new();
        let mut page: u32 = 1;

        loop {
            let url = self.repo_url(&format!("tags?per_page={}&page={}", PER_PAGE, page));
            let page_tags: Vec<GitHubTag> = self.get_json(&url).await?;
            let page_count = page_tags.len();

            tags.extend(
                page_tags
                    .into_iter()
                    .filter(|t| !t.name.is_empty())
                    .map(|t| Tag::new(t.name)),
            );

            if page_count < PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!(
            repository = %format!("{}/{}", self.owner, self.repo),
            count = tags.len(),
            pages = page,
            "fetched tags"
        );
        Ok(tags)
    }

    async fn find_pr_by_head(&self, branch: &str) -> Result<Option<PullRequest>, ForgeError> {
        // GitHub API requires owner:branch format for cross-fork PRs
        let head_param = if branch.contains(':') {
            branch.to_string()
        } else {
            format!("{}:{}", self.owner, branch)
        };

        let url = self.repo_url(&format!("pulls?head={}&state=open", head_param));
        let prs: Vec<GitHubPullRequest> = self.get_json(&url).await?;

        Ok(prs.into_iter().next().map(Into::into))
    }

    async fn get_branch_status(
        &self,
        branch: &str,
        required_checks: Option<&[String]>,
    ) -> Result<BranchStatus, ForgeError> {
        match required_checks {
            None => {
                debug!(branch, "status checks ignored");
                return Ok(BranchStatus::Success);
            }
            Some(checks) if !checks.is_empty() => {
                debug!(branch, ?checks, "named required status checks are unsupported");
                return Ok(BranchStatus::Failure);
            }
            Some(_) => {}
        }

        let url = self.repo_url(&format!("commits/{}/status", branch));
        let combined: GitHubCombinedStatus = self.get_json(&url).await?;

        Ok(BranchStatus::parse(&combined.state).unwrap_or(BranchStatus::Pending))
    }

    async fn merge_branch(&self, branch: &str, base: &str) -> Result<(), ForgeError> {
        let url = self.repo_url("merges");
        let body = MergeBody { base, head: branch };

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let status = response.status();
        match status {
            // 204: nothing to merge, base already contains head
            StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::CONFLICT => Err(ForgeError::NotReady("merge conflict".into())),
            StatusCode::METHOD_NOT_ALLOWED => {
                Err(ForgeError::NotReady("branch protection prevents merge".into()))
            }
            _ => Err(Self::error_from_response(response, status).await),
        }
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for merging a branch.
#[derive(Serialize)]
struct MergeBody<'a> {
    base: &'a str,
    head: &'a str,
}

/// Tag list item.
#[derive(Deserialize)]
struct GitHubTag {
    name: String,
}

/// Combined commit status.
#[derive(Deserialize)]
struct GitHubCombinedStatus {
    state: String,
}

/// GitHub PR response format (subset).
#[derive(Deserialize)]
struct GitHubPullRequest {
    number: u64,
    html_url: String,
    head: GitHubRef,
    base: GitHubRef,
    title: String,
}

/// GitHub ref (head/base) format.
#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

impl From<GitHubPullRequest> for PullRequest {
    fn from(pr: GitHubPullRequest) -> Self {
        PullRequest {
            number: pr.number,
            url: pr.html_url,
            head: pr.head.ref_name,
            base: pr.base.ref_name,
            title: pr.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod github_forge {
        use super::*;

        #[test]
        fn new_trims_trailing_slash() {
            let forge = GitHubForge::new("https://api.github.com/", "owner", "repo");
            assert_eq!(forge.name(), "github");
            assert_eq!(forge.owner(), "owner");
            assert_eq!(forge.repo(), "repo");
            assert_eq!(forge.api_base, "https://api.github.com");
            assert!(!forge.has_token());
        }

        #[test]
        fn repo_url_format() {
            let forge = GitHubForge::new(DEFAULT_API_BASE, "octocat", "hello-world");
            assert_eq!(
                forge.repo_url("tags?per_page=100&page=1"),
                "https://api.github.com/repos/octocat/hello-world/tags?per_page=100&page=1"
            );
        }

        #[test]
        fn enterprise_repo_url_format() {
            let forge = GitHubForge::new("https://ghe.example.com/api/v3", "org", "lib");
            assert_eq!(
                forge.repo_url("merges"),
                "https://ghe.example.com/api/v3/repos/org/lib/merges"
            );
        }

        #[test]
        fn debug_redacts_token() {
            let forge = GitHubForge::new(DEFAULT_API_BASE, "owner", "repo")
                .with_token(Some("secret_token_abc123".to_string()));
            let debug_output = format!("{:?}", forge);
            assert!(!debug_output.contains("secret_token_abc123"));
            assert!(debug_output.contains("has_token: true"));
        }

        #[test]
        fn headers_include_bearer_only_with_token() {
            let anonymous = GitHubForge::new(DEFAULT_API_BASE, "o", "r");
            assert!(anonymous.headers().unwrap().get(AUTHORIZATION).is_none());

            let authed = anonymous.with_token(Some("abc".into()));
            let headers = authed.headers().unwrap();
            assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
            assert_eq!(headers.get(USER_AGENT).unwrap(), USER_AGENT_VALUE);
        }

        #[test]
        fn headers_reject_invalid_token() {
            let forge = GitHubForge::new(DEFAULT_API_BASE, "o", "r")
                .with_token(Some("bad\ntoken".into()));
            let err = forge.headers().unwrap_err();
            assert!(err.is_auth_failure());
            assert!(!err.to_string().contains("bad\ntoken"));
        }
    }

    mod http {
        use super::*;
        use wiremock::matchers::{header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn forge_for(server: &MockServer) -> GitHubForge {
            GitHubForge::new(server.uri(), "octo", "lib").with_token(Some("t0k3n".into()))
        }

        fn tag_page(start: usize, count: usize) -> serde_json::Value {
            serde_json::Value::Array(
                (start..start + count)
                    .map(|i| serde_json::json!({ "name": format!("v1.0.{}", i) }))
                    .collect(),
            )
        }

        #[tokio::test]
        async fn list_tags_paginates_until_short_page() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/lib/tags"))
                .and(query_param("page", "1"))
                .and(header("authorization", "Bearer t0k3n"))
                .respond_with(ResponseTemplate::new(200).set_body_json(tag_page(0, 100)))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/lib/tags"))
                .and(query_param("page", "2"))
                .respond_with(ResponseTemplate::new(200).set_body_json(tag_page(100, 3)))
                .expect(1)
                .mount(&server)
                .await;

            let tags = forge_for(&server).list_tags().await.unwrap();
            assert_eq!(tags.len(), 103);
            assert_eq!(tags[0].name, "v1.0.0");
            assert_eq!(tags[102].name, "v1.0.102");
        }

        #[tokio::test]
        async fn list_tags_skips_empty_names() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/lib/tags"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                    { "name": "v1.0.0" },
                    { "name": "" }
                ])))
                .mount(&server)
                .await;

            let tags = forge_for(&server).list_tags().await.unwrap();
            assert_eq!(tags, vec![Tag::new("v1.0.0")]);
        }

        #[tokio::test]
        async fn unauthorized_is_auth_failure() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/lib/tags"))
                .respond_with(
                    ResponseTemplate::new(401)
                        .set_body_json(serde_json::json!({ "message": "Bad credentials" })),
                )
                .mount(&server)
                .await;

            let err = forge_for(&server).list_tags().await.unwrap_err();
            assert_eq!(err, ForgeError::AuthFailed("Bad credentials".into()));
        }

        #[tokio::test]
        async fn exhausted_rate_limit_is_not_auth_failure() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/lib/tags"))
                .respond_with(
                    ResponseTemplate::new(403)
                        .insert_header("x-ratelimit-remaining", "0")
                        .set_body_json(serde_json::json!({ "message": "API rate limit exceeded" })),
                )
                .mount(&server)
                .await;

            let err = forge_for(&server).list_tags().await.unwrap_err();
            assert_eq!(err, ForgeError::RateLimited);
        }

        #[tokio::test]
        async fn server_error_maps_to_api_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/lib/tags"))
                .respond_with(ResponseTemplate::new(502))
                .mount(&server)
                .await;

            let err = forge_for(&server).list_tags().await.unwrap_err();
            assert!(matches!(err, ForgeError::ApiError { status: 502, .. }));
            assert!(!err.is_auth_failure());
        }

        #[tokio::test]
        async fn find_pr_by_head_uses_owner_prefix() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/lib/pulls"))
                .and(query_param("head", "octo:renovate/foo"))
                .and(query_param("state", "open"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                    "number": 7,
                    "html_url": "https://github.com/octo/lib/pull/7",
                    "head": { "ref": "renovate/foo" },
                    "base": { "ref": "main" },
                    "title": "Update foo"
                }])))
                .mount(&server)
                .await;

            let pr = forge_for(&server)
                .find_pr_by_head("renovate/foo")
                .await
                .unwrap()
                .unwrap();
            assert_eq!(pr.number, 7);
            assert_eq!(pr.base, "main");
        }

        #[tokio::test]
        async fn branch_status_ignores_checks_without_request() {
            let server = MockServer::start().await;
            let forge = forge_for(&server);

            assert_eq!(
                forge.get_branch_status("b", None).await.unwrap(),
                BranchStatus::Success
            );
            assert_eq!(
                forge
                    .get_branch_status("b", Some(&["ci".to_string()][..]))
                    .await
                    .unwrap(),
                BranchStatus::Failure
            );
            assert!(server.received_requests().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn branch_status_reads_combined_state() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/repos/octo/lib/commits/renovate/foo/status"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(serde_json::json!({ "state": "failure" })),
                )
                .mount(&server)
                .await;

            let status = forge_for(&server)
                .get_branch_status("renovate/foo", Some(&[][..]))
                .await
                .unwrap();
            assert_eq!(status, BranchStatus::Failure);
        }

        #[tokio::test]
        async fn merge_conflict_is_not_ready() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/repos/octo/lib/merges"))
                .respond_with(ResponseTemplate::new(409))
                .mount(&server)
                .await;

            let err = forge_for(&server)
                .merge_branch("renovate/foo", "main")
                .await
                .unwrap_err();
            assert!(matches!(err, ForgeError::NotReady(_)));
        }

        #[tokio::test]
        async fn merge_created_is_ok() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/repos/octo/lib/merges"))
                .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
                .expect(1)
                .mount(&server)
                .await;

            forge_for(&server)
                .merge_branch("renovate/foo", "main")
                .await
                .unwrap();
        }
    }
}
