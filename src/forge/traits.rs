//! forge::traits
//!
//! Forge trait definition for interacting with remote hosting services.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! All methods return `Result` so callers can decide which failures are fatal.
//! The changelog assembler only needs [`Forge::list_tags`]; the branch
//! operations back the automerge decision.
//!
//! # Example
//!
//! ```ignore
//! use upstep::forge::{Forge, ForgeError};
//!
//! async fn tag_names(forge: &dyn Forge) -> Result<Vec<String>, ForgeError> {
//!     let tags = forge.list_tags().await?;
//!     Ok(tags.into_iter().map(|t| t.name).collect())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

/// Errors from forge operations.
///
/// These error types map to common failure modes when interacting
/// with remote hosting services like GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// The branch cannot be merged yet.
    #[error("not ready: {0}")]
    NotReady(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The operation is not supported by this forge.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl ForgeError {
    /// Whether this failure is a credential problem.
    ///
    /// Credential failures are fatal for callers; every other failure may be
    /// degraded to an empty result.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ForgeError::AuthRequired | ForgeError::AuthFailed(_))
    }
}

/// A tag from the host's tag listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name, e.g. `v1.2.3` or `mylib@1.2.3`
    pub name: String,
}

impl Tag {
    /// Create a tag from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Pull request information returned from the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR URL (web URL for viewing)
    pub url: String,
    /// Head branch name
    pub head: String,
    /// Base branch name
    pub base: String,
    /// PR title
    pub title: String,
}

/// Aggregated commit status of a branch head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    /// All checks passed, or checks are ignored
    Success,
    /// Checks are still running or absent
    Pending,
    /// At least one check failed
    Failure,
    /// At least one check errored
    Error,
}

impl BranchStatus {
    /// Parse a status state string as returned by commit status APIs.
    pub fn parse(state: &str) -> Option<Self> {
        match state.to_lowercase().as_str() {
            "success" => Some(BranchStatus::Success),
            "pending" => Some(BranchStatus::Pending),
            "failure" => Some(BranchStatus::Failure),
            "error" => Some(BranchStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchStatus::Success => write!(f, "success"),
            BranchStatus::Pending => write!(f, "pending"),
            BranchStatus::Failure => write!(f, "failure"),
            BranchStatus::Error => write!(f, "error"),
        }
    }
}

/// The Forge trait for interacting with remote hosting services.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Callers should handle:
/// - `AuthRequired` / `AuthFailed`: credential problem, surface to the user
/// - `NotFound`: Resource doesn't exist
/// - `RateLimited`: Back off
/// - `ApiError` / `NetworkError`: usually safe to degrade
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// List every tag of the repository.
    ///
    /// Implementations paginate internally and return the complete list in
    /// the order the host reports it.
    async fn list_tags(&self) -> Result<Vec<Tag>, ForgeError>;

    /// Find an open PR whose head is `branch`.
    ///
    /// Returns `Ok(None)` if no open PR exists for the branch.
    async fn find_pr_by_head(&self, branch: &str) -> Result<Option<PullRequest>, ForgeError>;

    /// Get the aggregated status of a branch.
    ///
    /// `required_checks` follows these rules:
    /// - `None`: checks are ignored and the status is `Success`
    /// - `Some(empty)`: the combined status of the branch head is used
    /// - `Some(non-empty)`: named checks are unsupported and the status is `Failure`
    async fn get_branch_status(
        &self,
        branch: &str,
        required_checks: Option<&[String]>,
    ) -> Result<BranchStatus, ForgeError>;

    /// Merge `branch` into `base`.
    ///
    /// # Errors
    ///
    /// Returns `ForgeError::NotReady` when the host refuses the merge because
    /// the branch is not mergeable yet.
    async fn merge_branch(&self, branch: &str, base: &str) -> Result<(), ForgeError>;
}
