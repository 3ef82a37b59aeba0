//! forge
//!
//! Abstraction for remote forges (GitHub and GitHub Enterprise).
//!
//! # Architecture
//!
//! The `Forge` trait defines the interface for interacting with remote
//! hosting services. Callers use [`RepoLocation`] and [`create_forge`]
//! rather than importing specific forge implementations directly.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: Mock implementation for deterministic testing
//! - `factory`: Source URL parsing and forge creation
//!
//! # Example
//!
//! ```ignore
//! use upstep::forge::{create_forge, RepoLocation};
//!
//! let location = RepoLocation::parse("https://github.com/owner/repo", None).unwrap();
//! let forge = create_forge(&location, Some(token)).unwrap();
//! let tags = forge.list_tags().await?;
//! ```

mod factory;
pub mod github;
pub mod mock;
mod traits;

pub use factory::{create_forge, ForgeProvider, HttpForgeProvider, RepoLocation};
pub use traits::*;
