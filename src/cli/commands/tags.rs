//! tags command - List a repository's tags

use anyhow::{anyhow, Context as _, Result};

use super::{host_rules, load_config};
use crate::changelog::scoped_version;
use crate::cli::Context;
use crate::forge::{create_forge, RepoLocation};
use crate::hosts::HostType;
use crate::ui::output;

/// Print the tags of `source_url`, one per line.
///
/// With `dep_name`, only tags of the form `{dep}@…` or `{dep}-…` are shown.
pub fn tags(
    ctx: &Context,
    source_url: &str,
    dep_name: Option<&str>,
    endpoint: Option<&str>,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(tags_async(ctx, source_url, dep_name, endpoint))
}

async fn tags_async(
    ctx: &Context,
    source_url: &str,
    dep_name: Option<&str>,
    endpoint: Option<&str>,
) -> Result<()> {
    let config = load_config(ctx)?;
    let rules = host_rules(&config)?;

    let location = RepoLocation::parse(source_url, endpoint)
        .ok_or_else(|| anyhow!("'{}' is not a repository URL", source_url))?;
    let rule = rules.find(HostType::GitHub, location.credential_url());

    let location = match (endpoint, rule.endpoint.as_deref()) {
        (None, Some(configured)) => RepoLocation::parse(source_url, Some(configured)).unwrap_or(location),
        _ => location,
    };

    let forge = create_forge(&location, rule.token)
        .ok_or_else(|| anyhow!("'{}' does not name an owner/repo", source_url))?;

    let tags = forge
        .list_tags()
        .await
        .with_context(|| format!("Failed to list tags of '{}'", source_url))?;

    let names: Vec<&str> = tags
        .iter()
        .map(|t| t.name.as_str())
        .filter(|name| dep_name.map_or(true, |dep| scoped_version(dep, name).is_some()))
        .collect();

    if names.is_empty() {
        output::print("No tags found.", ctx.verbosity());
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
