//! automerge
//!
//! Branch automerge decisions.
//!
//! # Design
//!
//! A dependency branch configured for branch-level automerge is merged
//! straight into its base without opening a pull request, once its status
//! checks pass. [`try_branch_automerge`] makes that decision against a
//! [`Forge`] and reports what happened as an [`AutomergeResult`].
//!
//! An open PR for the branch aborts the merge: someone chose the PR path and
//! merging underneath it would close their PR. Failing checks are reported
//! separately from pending ones so callers can tell "broken" from "wait".
//!
//! # Example
//!
//! ```
//! use upstep::automerge::{try_branch_automerge, AutomergeConfig, AutomergeResult, AutomergeType};
//! use upstep::forge::mock::MockForge;
//! use upstep::forge::BranchStatus;
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new().with_status("deps/lib-2.x", BranchStatus::Success);
//! let config = AutomergeConfig::new("deps/lib-2.x", "main").automerge(AutomergeType::Branch);
//!
//! let result = try_branch_automerge(&config, &forge).await.unwrap();
//! assert_eq!(result, AutomergeResult::Automerged);
//! # });
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::forge::{BranchStatus, Forge, ForgeError};

/// How an upgrade is merged automatically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomergeType {
    /// Merge the branch directly, no PR
    Branch,
    /// Merge through a pull request
    #[default]
    Pr,
}

/// Automerge settings for one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomergeConfig {
    /// Whether automerge is enabled at all
    #[serde(default)]
    pub automerge: bool,
    /// Merge strategy
    #[serde(default)]
    pub automerge_type: AutomergeType,
    /// Branch holding the upgrade
    pub branch_name: String,
    /// Branch to merge into
    pub base_branch: String,
    /// Checks that must pass; `None` means checks are ignored
    #[serde(default)]
    pub required_status_checks: Option<Vec<String>>,
    /// Log instead of merging
    #[serde(default)]
    pub dry_run: bool,
}

impl AutomergeConfig {
    /// Automerge disabled, all checks considered, not a dry run.
    pub fn new(branch_name: impl Into<String>, base_branch: impl Into<String>) -> Self {
        Self {
            automerge: false,
            automerge_type: AutomergeType::default(),
            branch_name: branch_name.into(),
            base_branch: base_branch.into(),
            required_status_checks: Some(Vec::new()),
            dry_run: false,
        }
    }

    /// Enable automerge with the given strategy.
    pub fn automerge(mut self, automerge_type: AutomergeType) -> Self {
        self.automerge = true;
        self.automerge_type = automerge_type;
        self
    }

    /// Set the required checks.
    pub fn required_checks(mut self, checks: Option<Vec<String>>) -> Self {
        self.required_status_checks = checks;
        self
    }

    /// Toggle dry-run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Outcome of an automerge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomergeResult {
    /// The branch was merged (or would have been, in a dry run)
    Automerged,
    /// A PR is open for the branch
    AbortedPrExists,
    /// Checks failed or errored
    BranchStatusError,
    /// The merge was attempted and refused
    Failed,
    /// Automerge is off, or checks are still pending
    NoAutomerge,
    /// The host refused the merge for now
    NotReady,
}

impl std::fmt::Display for AutomergeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            AutomergeResult::Automerged => "automerged",
            AutomergeResult::AbortedPrExists => "automerge aborted - PR exists",
            AutomergeResult::BranchStatusError => "branch status error",
            AutomergeResult::Failed => "failed",
            AutomergeResult::NoAutomerge => "no automerge",
            AutomergeResult::NotReady => "not ready",
        };
        f.write_str(text)
    }
}

/// Merge `config.branch_name` into its base if everything allows it.
///
/// # Errors
///
/// Failures while looking up the branch's PR or status. Merge failures are
/// reported as [`AutomergeResult::Failed`] or [`AutomergeResult::NotReady`].
pub async fn try_branch_automerge(
    config: &AutomergeConfig,
    forge: &dyn Forge,
) -> Result<AutomergeResult, ForgeError> {
    let branch = config.branch_name.as_str();
    debug!(branch, "checking whether branch can be automerged");

    if !config.automerge || config.automerge_type != AutomergeType::Branch {
        return Ok(AutomergeResult::NoAutomerge);
    }

    if let Some(pr) = forge.find_pr_by_head(branch).await? {
        debug!(branch, pr = pr.number, "branch has an open PR");
        return Ok(AutomergeResult::AbortedPrExists);
    }

    let status = forge
        .get_branch_status(branch, config.required_status_checks.as_deref())
        .await?;

    match status {
        BranchStatus::Success => {
            if config.dry_run {
                info!(branch, "dry run: would automerge branch");
                return Ok(AutomergeResult::Automerged);
            }
            match forge.merge_branch(branch, &config.base_branch).await {
                Ok(()) => {
                    info!(branch, base = %config.base_branch, "branch automerged");
                    Ok(AutomergeResult::Automerged)
                }
                Err(ForgeError::NotReady(reason)) => {
                    debug!(branch, reason = %reason, "branch is not ready for automerge");
                    Ok(AutomergeResult::NotReady)
                }
                Err(e) => {
                    info!(branch, error = %e, "failed to automerge branch");
                    Ok(AutomergeResult::Failed)
                }
            }
        }
        BranchStatus::Failure | BranchStatus::Error => Ok(AutomergeResult::BranchStatusError),
        BranchStatus::Pending => {
            debug!(branch, %status, "branch status is not success, skipping automerge");
            Ok(AutomergeResult::NoAutomerge)
        }
    }
}
