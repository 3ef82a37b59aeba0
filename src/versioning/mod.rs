//! versioning
//!
//! Pluggable version schemes.
//!
//! # Design
//!
//! The changelog assembler never compares version strings itself. Every
//! validity check, equality test and ordering decision goes through a
//! [`Versioning`] implementation selected by name, so that release lists and
//! tag names are interpreted with the same rules as the package manager that
//! produced them.
//!
//! # Schemes
//!
//! - `semver`: strict semantic versions, tolerant of a leading `v` or `=`
//! - `loose`: dotted numeric versions of any length with an optional suffix
//!
//! # Example
//!
//! ```
//! use upstep::versioning;
//!
//! let scheme = versioning::get("semver").unwrap();
//! assert!(scheme.is_version("v1.2.3"));
//! assert!(scheme.equals("v1.2.3", "1.2.3"));
//! assert!(scheme.is_greater_than("1.10.0", "1.9.0"));
//! ```

mod loose;
mod semantic;

use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;

pub use loose::LooseVersioning;
pub use semantic::SemverVersioning;

/// Name of the scheme used when a caller does not specify one.
pub const DEFAULT_VERSIONING: &str = "semver";

/// Errors from versioning scheme lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersioningError {
    /// No scheme is registered under the given name.
    #[error("unknown versioning scheme '{0}'")]
    Unknown(String),
}

/// Version equality and ordering rules for one versioning scheme.
///
/// Inputs that are not valid versions under the scheme are never equal to
/// anything and never greater than anything. Callers filter with
/// [`is_version`](Versioning::is_version) before sorting.
pub trait Versioning: Send + Sync {
    /// Scheme name as used in configuration.
    fn name(&self) -> &'static str;

    /// Whether `input` is a valid version under this scheme.
    fn is_version(&self, input: &str) -> bool;

    /// Whether `a` and `b` denote the same version.
    fn equals(&self, a: &str, b: &str) -> bool;

    /// Whether `a` is strictly greater than `b`.
    fn is_greater_than(&self, a: &str, b: &str) -> bool;

    /// Total ordering used for ascending sorts.
    ///
    /// Valid versions sort before invalid ones; two invalid inputs compare
    /// lexically so the ordering stays total.
    fn sort_versions(&self, a: &str, b: &str) -> Ordering;
}

/// Look up a versioning scheme by name.
///
/// # Errors
///
/// Returns [`VersioningError::Unknown`] for unregistered names.
pub fn get(name: &str) -> Result<Arc<dyn Versioning>, VersioningError> {
    match name.to_lowercase().as_str() {
        "semver" | "npm" | "cargo" => Ok(Arc::new(SemverVersioning)),
        "loose" => Ok(Arc::new(LooseVersioning)),
        _ => Err(VersioningError::Unknown(name.to_string())),
    }
}

/// Names accepted by [`get`].
pub fn valid_versioning_names() -> &'static [&'static str] {
    &["semver", "npm", "cargo", "loose"]
}

/// Strip a single leading `v`, `V` or `=` from a version string.
pub(crate) fn strip_version_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .or_else(|| trimmed.strip_prefix('='))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_known_schemes() {
        assert_eq!(get("semver").unwrap().name(), "semver");
        assert_eq!(get("npm").unwrap().name(), "semver");
        assert_eq!(get("LOOSE").unwrap().name(), "loose");
    }

    #[test]
    fn get_unknown_scheme() {
        let err = get("calver").err().unwrap();
        assert_eq!(err, VersioningError::Unknown("calver".to_string()));
        assert!(err.to_string().contains("calver"));
    }

    #[test]
    fn every_listed_name_resolves() {
        for name in valid_versioning_names() {
            assert!(get(name).is_ok(), "{} should resolve", name);
        }
    }

    #[test]
    fn strip_prefix_variants() {
        assert_eq!(strip_version_prefix("v1.0.0"), "1.0.0");
        assert_eq!(strip_version_prefix("V1.0.0"), "1.0.0");
        assert_eq!(strip_version_prefix("=1.0.0"), "1.0.0");
        assert_eq!(strip_version_prefix(" 1.0.0 "), "1.0.0");
        assert_eq!(strip_version_prefix("vv1"), "v1");
    }
}
