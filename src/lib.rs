//! upstep - changelog manifests and branch automerge for dependency upgrades
//!
//! Given a dependency's release list and the version range of an upgrade,
//! upstep works out the individual upgrade steps in that range and links
//! each one to a compare view of its source repository. It can also merge a
//! dependency branch directly once its checks pass.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the library)
//! - [`changelog`] - Changelog manifest assembly and tag resolution
//! - [`automerge`] - Branch automerge decisions
//! - [`versioning`] - Pluggable version schemes
//! - [`forge`] - Abstraction for remote forges (GitHub and GitHub Enterprise)
//! - [`hosts`] - Per-host credential and endpoint resolution
//! - [`cache`] - Release-pair cache with TTL
//! - [`secrets`] - Secret storage abstraction
//! - [`core`] - Domain types and configuration
//! - [`ui`] - User-facing output
//!
//! # Invariants
//!
//! 1. Versions are only ever compared through a [`versioning::Versioning`]
//! 2. Manifests list steps newest first, each inside `(from, to]`
//! 3. Tokens are never logged or printed

pub mod automerge;
pub mod cache;
pub mod changelog;
pub mod cli;
pub mod core;
pub mod forge;
pub mod hosts;
pub mod secrets;
pub mod ui;
pub mod versioning;
