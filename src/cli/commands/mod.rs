//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and builds the services it needs
//! 2. Calls into the library
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that touch the network (changelog, tags, automerge) are async
//! internally. Each handler creates a tokio runtime and blocks on its async
//! body, so dispatch itself stays synchronous.

mod auth;
mod automerge;
mod changelog;
mod completion;
mod tags;

// Re-export command functions for testing and direct invocation
pub use auth::auth;
pub use automerge::automerge;
pub use changelog::changelog;
pub use completion::completion;
pub use tags::tags;

use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::cli::Context;
use crate::core::config::Config;
use crate::hosts::HostRules;
use crate::secrets::{self, SecretStore};
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Changelog { input, compact } => changelog(ctx, &input, compact),
        Command::Tags {
            source_url,
            dep_name,
            endpoint,
        } => tags(ctx, &source_url, dep_name.as_deref(), endpoint.as_deref()),
        Command::Automerge {
            repo,
            branch,
            base,
            required_checks,
            ignore_checks,
            dry_run,
            endpoint,
        } => automerge(
            ctx,
            automerge::AutomergeArgs {
                repo,
                branch,
                base,
                required_checks: if ignore_checks {
                    None
                } else {
                    Some(required_checks)
                },
                dry_run,
                endpoint,
            },
        ),
        Command::Auth {
            host,
            token,
            status,
            logout,
        } => auth(ctx, &host, token.as_deref(), status, logout),
        Command::Completion { shell } => completion(shell),
    }
}

/// Load configuration, surfacing load warnings.
fn load_config(ctx: &Context) -> Result<Config> {
    let result = Config::load(ctx.config_path.as_deref()).context("Failed to load configuration")?;
    for warning in &result.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            ctx.verbosity(),
        );
    }
    Ok(result.config)
}

/// The configured secret store.
fn secret_store(config: &Config) -> Result<Arc<dyn SecretStore>> {
    let store = secrets::create_store(config.secrets_provider())
        .context("Failed to initialize secret store")?;
    Ok(Arc::from(store))
}

/// Host rules from config, the process environment and the secret store.
fn host_rules(config: &Config) -> Result<HostRules> {
    Ok(HostRules::new(config.host_rules().to_vec())
        .with_process_env()
        .with_secret_store(secret_store(config)?))
}
