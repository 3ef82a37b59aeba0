//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of the default locations
//! - `--debug`: Enable debug logging
//! - `--interactive` / `--no-interactive`: Control prompts
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

/// upstep - changelog manifests and branch automerge for dependency upgrades
#[derive(Parser, Debug)]
#[command(name = "upstep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable interactive prompts
    #[arg(long = "interactive", global = true, conflicts_with = "no_interactive")]
    pub interactive_flag: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Determine if interactive mode is enabled.
    ///
    /// Returns true if:
    /// - `--interactive` was explicitly set, OR
    /// - Neither `--no-interactive` nor `--quiet` was set AND stdin is a TTY
    pub fn interactive(&self) -> bool {
        if self.interactive_flag {
            true
        } else if self.no_interactive || self.quiet {
            false
        } else {
            std::io::stdin().is_terminal()
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute a changelog manifest for a dependency upgrade
    #[command(
        name = "changelog",
        long_about = "Compute the upgrade steps between two versions of a dependency.\n\n\
            Reads a changelog request as JSON (release list, version bounds, source \
            repository) and prints the manifest as JSON: one entry per release in \
            the window, newest first, each with a compare link between the tags of \
            adjacent releases. Computed steps are cached, so repeated runs are cheap.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Compute from a request file
    upstep changelog --input request.json

    # Read the request from stdin
    cat request.json | upstep changelog --input -

REQUEST FORMAT:
    {
      \"sourceUrl\": \"https://github.com/acme/lib\",
      \"depName\": \"lib\",
      \"manager\": \"npm\",
      \"fromVersion\": \"1.0.0\",
      \"toVersion\": \"2.0.0\",
      \"releases\": [{\"version\": \"1.0.0\"}, {\"version\": \"2.0.0\"}]
    }"
    )]
    Changelog {
        /// Request file, or `-` for stdin
        #[arg(long, short, value_name = "FILE")]
        input: PathBuf,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// List the tags of a source repository
    #[command(
        name = "tags",
        after_help = "\
WORKFLOW EXAMPLES:
    # All tags
    upstep tags https://github.com/acme/lib

    # Only tags of one package in a monorepo (lib@1.0.0, lib-1.0.0)
    upstep tags https://github.com/acme/monorepo --dep-name lib"
    )]
    Tags {
        /// Repository URL
        source_url: String,

        /// Only show tags scoped to this dependency
        #[arg(long)]
        dep_name: Option<String>,

        /// API root for self-hosted instances
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Merge a dependency branch directly if its checks pass
    #[command(
        name = "automerge",
        long_about = "Merge a dependency branch into its base without a pull request.\n\n\
            The branch is merged only if no PR is open for it and its status checks \
            have passed. The result is printed as one of: automerged, \
            'automerge aborted - PR exists', 'branch status error', failed, \
            'no automerge', 'not ready'.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Merge if all checks passed
    upstep automerge --repo https://github.com/acme/app --branch deps/lib-2.x

    # Only require specific checks
    upstep automerge --repo https://github.com/acme/app --branch deps/lib-2.x \\
        --required-check ci --required-check lint

    # See what would happen
    upstep automerge --repo https://github.com/acme/app --branch deps/lib-2.x --dry-run"
    )]
    Automerge {
        /// Repository URL
        #[arg(long)]
        repo: String,

        /// Branch to merge
        #[arg(long)]
        branch: String,

        /// Branch to merge into
        #[arg(long, default_value = "main")]
        base: String,

        /// Status check that must pass (repeatable; default: all reported checks)
        #[arg(long = "required-check", value_name = "NAME")]
        required_checks: Vec<String>,

        /// Merge regardless of status checks
        #[arg(long, conflicts_with = "required_checks")]
        ignore_checks: bool,

        /// Report the decision without merging
        #[arg(long)]
        dry_run: bool,

        /// API root for self-hosted instances
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Store a host token
    #[command(
        name = "auth",
        long_about = "Store an access token for a host.\n\n\
            Tokens are kept in the secret store (~/.upstep/secrets.toml by default, \
            owner-readable only) and used for tag listing and merges. The token is \
            never printed.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Prompt for a github.com token
    upstep auth

    # Non-interactive, self-hosted instance
    upstep auth --host ghe.example.com --token ghp_xxxx

    # Check if a token is stored
    upstep auth --status

    # Remove a stored token
    upstep auth --logout"
    )]
    Auth {
        /// Host the token is for
        #[arg(long, default_value = "github.com")]
        host: String,

        /// Token value (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Show current authentication status
        #[arg(long, conflicts_with_all = ["token", "logout"])]
        status: bool,

        /// Remove stored authentication
        #[arg(long, conflicts_with = "token")]
        logout: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    upstep completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    upstep completion zsh >> ~/.zshrc

    # Fish
    upstep completion fish > ~/.config/fish/completions/upstep.fish

    # PowerShell
    upstep completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_changelog() {
        let cli = Cli::try_parse_from(["upstep", "changelog", "--input", "req.json"]).unwrap();
        match cli.command {
            Command::Changelog { input, compact } => {
                assert_eq!(input, PathBuf::from("req.json"));
                assert!(!compact);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_repeated_required_checks() {
        let cli = Cli::try_parse_from([
            "upstep",
            "automerge",
            "--repo",
            "https://github.com/a/b",
            "--branch",
            "deps/x",
            "--required-check",
            "ci",
            "--required-check",
            "lint",
        ])
        .unwrap();
        match cli.command {
            Command::Automerge {
                required_checks,
                base,
                ignore_checks,
                ..
            } => {
                assert_eq!(required_checks, vec!["ci", "lint"]);
                assert_eq!(base, "main");
                assert!(!ignore_checks);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn ignore_checks_conflicts_with_required_check() {
        let result = Cli::try_parse_from([
            "upstep",
            "automerge",
            "--repo",
            "r",
            "--branch",
            "b",
            "--ignore-checks",
            "--required-check",
            "ci",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["upstep", "auth", "--status", "--quiet", "--debug"]).unwrap();
        assert!(cli.quiet);
        assert!(cli.debug);
        assert!(!cli.interactive());
    }

    #[test]
    fn status_conflicts_with_token() {
        assert!(Cli::try_parse_from(["upstep", "auth", "--status", "--token", "x"]).is_err());
    }
}
