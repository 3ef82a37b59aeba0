//! core
//!
//! Domain types and configuration.
//!
//! # Modules
//!
//! - [`types`]: Releases, changelog inputs and manifests
//! - [`config`]: Configuration schema and loading

pub mod config;
pub mod types;
