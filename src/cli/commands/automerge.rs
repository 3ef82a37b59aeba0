//! automerge command - Merge a dependency branch when its checks pass

use anyhow::{anyhow, bail, Context as _, Result};

use super::{host_rules, load_config};
use crate::automerge::{try_branch_automerge, AutomergeConfig, AutomergeType};
use crate::cli::Context;
use crate::forge::{create_forge, RepoLocation};
use crate::hosts::HostType;
use crate::ui::output;

/// Arguments for the automerge command.
#[derive(Debug, Clone)]
pub struct AutomergeArgs {
    pub repo: String,
    pub branch: String,
    pub base: String,
    /// `None` ignores checks entirely
    pub required_checks: Option<Vec<String>>,
    pub dry_run: bool,
    pub endpoint: Option<String>,
}

/// Run the automerge decision and print its result.
pub fn automerge(ctx: &Context, args: AutomergeArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(automerge_async(ctx, args))
}

async fn automerge_async(ctx: &Context, args: AutomergeArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let rules = host_rules(&config)?;

    let location = RepoLocation::parse(&args.repo, args.endpoint.as_deref())
        .ok_or_else(|| anyhow!("'{}' is not a repository URL", args.repo))?;
    let rule = rules.find(HostType::GitHub, location.credential_url());
    let Some(token) = rule.token else {
        bail!(
            "No token configured for {}. Run 'upstep auth --host {}' first.",
            location.host(),
            location.host()
        );
    };

    let location = match (args.endpoint.as_deref(), rule.endpoint.as_deref()) {
        (None, Some(configured)) => {
            RepoLocation::parse(&args.repo, Some(configured)).unwrap_or(location)
        }
        _ => location,
    };
    let forge = create_forge(&location, Some(token))
        .ok_or_else(|| anyhow!("'{}' does not name an owner/repo", args.repo))?;

    let merge_config = AutomergeConfig::new(args.branch, args.base)
        .automerge(AutomergeType::Branch)
        .required_checks(args.required_checks)
        .dry_run(args.dry_run);

    let result = try_branch_automerge(&merge_config, forge.as_ref())
        .await
        .with_context(|| format!("Failed to check branch '{}'", merge_config.branch_name))?;

    if ctx.quiet {
        println!("{}", result);
    } else {
        output::print(
            format!("{}: {}", merge_config.branch_name, result),
            ctx.verbosity(),
        );
    }
    Ok(())
}
