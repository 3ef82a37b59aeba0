//! cli::commands::auth
//!
//! Authentication command for storing host tokens.
//!
//! # Design
//!
//! The auth command:
//! - Stores tokens via the configured SecretStore under `<host>.token`
//! - NEVER prints tokens to stdout/stderr
//! - Supports both interactive and non-interactive modes
//!
//! # Example
//!
//! ```bash
//! # Interactive (prompts for token)
//! upstep auth
//!
//! # Non-interactive
//! upstep auth --host ghe.example.com --token ghp_xxxx
//!
//! # Check status
//! upstep auth --status
//!
//! # Remove stored token
//! upstep auth --logout
//! ```

use super::{load_config, secret_store};
use crate::cli::Context;
use crate::secrets::{token_key, SecretStore};
use anyhow::{bail, Context as _, Result};
use std::io::{self, Write};

/// Run the auth command.
///
/// # Arguments
///
/// * `ctx` - CLI context with interactive flag
/// * `host` - Host the token is for, e.g. `github.com`
/// * `token` - Optional token provided via --token flag
/// * `status` - If true, show authentication status instead of storing
/// * `logout` - If true, remove stored authentication
///
/// # Security
///
/// This function NEVER prints the token value. It only confirms success/failure.
pub fn auth(
    ctx: &Context,
    host: &str,
    token: Option<&str>,
    status: bool,
    logout: bool,
) -> Result<()> {
    let host = normalize_host(host)?;

    let config = load_config(ctx)?;
    let store = secret_store(&config)?;
    let key = token_key(&host);

    if status {
        return show_status(store.as_ref(), &key, &host, ctx.quiet);
    }

    if logout {
        return do_logout(store.as_ref(), &key, &host, ctx.quiet);
    }

    let token_value = get_token(ctx, token)?;
    validate_token(&token_value)?;

    store
        .set(&key, &token_value)
        .context("Failed to store token")?;

    if !ctx.quiet {
        println!("Authentication configured for {}.", host);
    }

    Ok(())
}

/// Accept a bare host or a URL and return the lowercased host.
fn normalize_host(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let host = match reqwest::Url::parse(trimmed) {
        Ok(url) if url.has_host() => url.host_str().unwrap_or_default().to_string(),
        _ => trimmed.trim_end_matches('/').to_string(),
    };

    if host.is_empty() || host.contains('/') || host.contains(' ') {
        bail!("'{}' is not a host name.", input);
    }

    let host = host.to_lowercase();
    Ok(if host == "api.github.com" {
        "github.com".to_string()
    } else {
        host
    })
}

/// Show authentication status.
fn show_status(store: &dyn SecretStore, key: &str, host: &str, quiet: bool) -> Result<()> {
    let exists = store.exists(key)?;

    if quiet {
        // Machine-readable output
        if exists {
            println!("authenticated");
        } else {
            println!("not_authenticated");
        }
    } else if exists {
        println!("Token stored for {}.", host);
    } else {
        println!("No token stored for {}.", host);
        println!("Run 'upstep auth --host {}' to add one.", host);
    }

    Ok(())
}

/// Remove stored authentication.
fn do_logout(store: &dyn SecretStore, key: &str, host: &str, quiet: bool) -> Result<()> {
    store
        .delete(key)
        .context("Failed to remove stored token")?;

    if !quiet {
        println!("Removed token for {}.", host);
    }

    Ok(())
}

/// Get token from argument or interactive prompt.
fn get_token(ctx: &Context, token_arg: Option<&str>) -> Result<String> {
    if let Some(t) = token_arg {
        return Ok(t.to_string());
    }

    if ctx.quiet || !ctx.interactive {
        bail!("Token required. Use --token <TOKEN> or run interactively.");
    }

    print!("Access token: ");
    io::stdout().flush()?;

    let token = rpassword::read_password().context("Failed to read token")?;

    if token.is_empty() {
        bail!("Token cannot be empty.");
    }

    Ok(token)
}

/// Validate token format (basic checks).
///
/// No API call is made; only obvious paste mistakes are caught.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }

    if token.len() < 10 {
        bail!("Token appears to be too short.");
    }

    if token.contains(' ') {
        bail!("Token should not contain spaces.");
    }

    if token.contains('\n') || token.contains('\r') {
        bail!("Token should not contain newlines.");
    }

    Ok(())
}
