//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge provides a deterministic implementation of the `Forge` trait
//! for use in tests. It stores tags, open PRs and branch statuses in memory,
//! records every call, and allows configuring failure scenarios.
//!
//! # Example
//!
//! ```
//! use upstep::forge::mock::MockForge;
//! use upstep::forge::Forge;
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::with_tags(["v1.0.0", "v1.1.0"]);
//!
//! let tags = forge.list_tags().await.unwrap();
//! assert_eq!(tags.len(), 2);
//! assert_eq!(forge.list_tags_calls(), 1);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::factory::{ForgeProvider, RepoLocation};
use super::traits::{BranchStatus, Forge, ForgeError, PullRequest, Tag};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockForgeInner {
    /// Tags returned by `list_tags`.
    tags: Vec<Tag>,
    /// Open PRs keyed by head branch.
    prs: HashMap<String, PullRequest>,
    /// Branch statuses; unknown branches report `Pending`.
    statuses: HashMap<String, BranchStatus>,
    /// Branches merged so far, as `(branch, base)`.
    merged: Vec<(String, String)>,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail list_tags with the given error.
    ListTags(ForgeError),
    /// Fail find_pr_by_head with the given error.
    FindPrByHead(ForgeError),
    /// Fail get_branch_status with the given error.
    GetBranchStatus(ForgeError),
    /// Fail merge_branch with the given error.
    MergeBranch(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    ListTags,
    FindPrByHead {
        branch: String,
    },
    GetBranchStatus {
        branch: String,
        required_checks: Option<Vec<String>>,
    },
    MergeBranch {
        branch: String,
        base: String,
    },
}

impl MockForge {
    /// Create a new empty mock forge.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner::default())),
        }
    }

    /// Create a mock forge that lists the given tags.
    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let forge = Self::new();
        forge.lock().tags = tags.into_iter().map(Tag::new).collect();
        forge
    }

    /// Register an open PR for its head branch.
    pub fn with_pr(self, pr: PullRequest) -> Self {
        self.lock().prs.insert(pr.head.clone(), pr);
        self
    }

    /// Set the status reported for a branch.
    pub fn with_status(self, branch: impl Into<String>, status: BranchStatus) -> Self {
        self.lock().statuses.insert(branch.into(), status);
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use upstep::forge::mock::{MockForge, FailOn};
    /// use upstep::forge::ForgeError;
    ///
    /// let forge = MockForge::new()
    ///     .fail_on(FailOn::ListTags(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Number of `list_tags` calls so far.
    pub fn list_tags_calls(&self) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::ListTags))
            .count()
    }

    /// Branches merged so far, as `(branch, base)`.
    pub fn merged(&self) -> Vec<(String, String)> {
        self.lock().merged.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockForgeInner> {
        // a poisoned lock only means another test thread panicked
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }

    /// Check if we should fail and return the error if so.
    fn check_fail(&self, expected: &str) -> Option<ForgeError> {
        match &self.lock().fail_on {
            Some(FailOn::ListTags(e)) if expected == "list_tags" => Some(e.clone()),
            Some(FailOn::FindPrByHead(e)) if expected == "find_pr_by_head" => Some(e.clone()),
            Some(FailOn::GetBranchStatus(e)) if expected == "get_branch_status" => {
                Some(e.clone())
            }
            Some(FailOn::MergeBranch(e)) if expected == "merge_branch" => Some(e.clone()),
            _ => None,
        }
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, ForgeError> {
        self.record(MockOperation::ListTags);

        if let Some(e) = self.check_fail("list_tags") {
            return Err(e);
        }

        Ok(self.lock().tags.clone())
    }

    async fn find_pr_by_head(&self, branch: &str) -> Result<Option<PullRequest>, ForgeError> {
        self.record(MockOperation::FindPrByHead {
            branch: branch.to_string(),
        });

        if let Some(e) = self.check_fail("find_pr_by_head") {
            return Err(e);
        }

        Ok(self.lock().prs.get(branch).cloned())
    }

    async fn get_branch_status(
        &self,
        branch: &str,
        required_checks: Option<&[String]>,
    ) -> Result<BranchStatus, ForgeError> {
        self.record(MockOperation::GetBranchStatus {
            branch: branch.to_string(),
            required_checks: required_checks.map(|c| c.to_vec()),
        });

        if let Some(e) = self.check_fail("get_branch_status") {
            return Err(e);
        }

        Ok(self
            .lock()
            .statuses
            .get(branch)
            .copied()
            .unwrap_or(BranchStatus::Pending))
    }

    async fn merge_branch(&self, branch: &str, base: &str) -> Result<(), ForgeError> {
        self.record(MockOperation::MergeBranch {
            branch: branch.to_string(),
            base: base.to_string(),
        });

        if let Some(e) = self.check_fail("merge_branch") {
            return Err(e);
        }

        self.lock()
            .merged
            .push((branch.to_string(), base.to_string()));
        Ok(())
    }
}

/// Every location resolves to this mock; clones share recorded state.
impl ForgeProvider for MockForge {
    fn forge_for(&self, _location: &RepoLocation, _token: Option<String>) -> Option<Box<dyn Forge>> {
        Some(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pr(head: &str) -> PullRequest {
        PullRequest {
            number: 3,
            url: "https://github.com/mock/repo/pull/3".to_string(),
            head: head.to_string(),
            base: "main".to_string(),
            title: "Update dependency".to_string(),
        }
    }

    #[tokio::test]
    async fn list_tags_returns_configured_tags() {
        let forge = MockForge::with_tags(["a", "b"]);
        let names: Vec<String> = forge
            .list_tags()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(forge.operations(), vec![MockOperation::ListTags]);
    }

    #[tokio::test]
    async fn fail_on_list_tags() {
        let forge = MockForge::new().fail_on(FailOn::ListTags(ForgeError::RateLimited));
        assert_eq!(forge.list_tags().await, Err(ForgeError::RateLimited));
        assert_eq!(forge.list_tags_calls(), 1);

        forge.clear_fail_on();
        assert!(forge.list_tags().await.is_ok());
    }

    #[tokio::test]
    async fn find_pr_by_head() {
        let forge = MockForge::new().with_pr(sample_pr("renovate/foo"));
        assert!(forge.find_pr_by_head("renovate/foo").await.unwrap().is_some());
        assert!(forge.find_pr_by_head("renovate/bar").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_branch_status_is_pending() {
        let forge = MockForge::new().with_status("a", BranchStatus::Success);
        assert_eq!(
            forge.get_branch_status("a", None).await.unwrap(),
            BranchStatus::Success
        );
        assert_eq!(
            forge.get_branch_status("b", None).await.unwrap(),
            BranchStatus::Pending
        );
    }

    #[tokio::test]
    async fn merge_branch_is_recorded() {
        let forge = MockForge::new();
        forge.merge_branch("renovate/foo", "main").await.unwrap();
        assert_eq!(
            forge.merged(),
            vec![("renovate/foo".to_string(), "main".to_string())]
        );
    }

    #[tokio::test]
    async fn clones_share_state() {
        let forge = MockForge::with_tags(["v1"]);
        let clone = forge.clone();
        clone.list_tags().await.unwrap();
        assert_eq!(forge.list_tags_calls(), 1);
    }
}
