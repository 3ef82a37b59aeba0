//! changelog command - Compute a changelog manifest from a JSON request

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context as _, Result};

use super::{host_rules, load_config};
use crate::cache;
use crate::changelog::{compute_changelog, Collaborators};
use crate::cli::Context;
use crate::core::types::{ChangeLogConfig, ChangeLogOutcome};
use crate::ui::output;

/// Compute and print a changelog manifest.
///
/// `input` is a JSON [`ChangeLogConfig`], or `-` for stdin. The manifest is
/// printed as JSON on stdout; a skipped request prints a note and succeeds.
pub fn changelog(ctx: &Context, input: &Path, compact: bool) -> Result<()> {
    let request = read_request(input)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(changelog_async(ctx, &request, compact))
}

async fn changelog_async(ctx: &Context, request: &ChangeLogConfig, compact: bool) -> Result<()> {
    let config = load_config(ctx)?;
    let cache = cache::create_cache(
        config.cache_provider(),
        config.cache_dir().map(Path::to_path_buf),
    )
    .context("Failed to initialize cache")?;
    let collaborators = Collaborators::from_config(&config, host_rules(&config)?, cache);

    let outcome = compute_changelog(request, &collaborators)
        .await
        .with_context(|| format!("Failed to compute changelog for '{}'", request.dep_name))?;

    match outcome {
        ChangeLogOutcome::Found(result) => {
            let json = if compact {
                serde_json::to_string(&result)?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{}", json);
        }
        ChangeLogOutcome::Skipped => {
            output::print(
                format!("No changelog available for {}.", request.dep_name),
                ctx.verbosity(),
            );
        }
        ChangeLogOutcome::Error(e) => bail!("{}", e),
    }
    Ok(())
}

fn read_request(input: &Path) -> Result<ChangeLogConfig> {
    let content = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("Failed to read request file '{}'", input.display()))?
    };

    serde_json::from_str(&content).context("Invalid changelog request")
}
