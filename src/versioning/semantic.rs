//! versioning::semantic
//!
//! Semantic versioning via the `semver` crate.
//!
//! Equality and ordering use precedence rules, so build metadata
//! (`1.0.0+build.5`) never distinguishes two versions.

use std::cmp::Ordering;

use semver::Version;

use super::{strip_version_prefix, Versioning};

/// Strict semantic versions (`MAJOR.MINOR.PATCH[-pre][+build]`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SemverVersioning;

impl SemverVersioning {
    fn parse(input: &str) -> Option<Version> {
        Version::parse(strip_version_prefix(input)).ok()
    }
}

impl Versioning for SemverVersioning {
    fn name(&self) -> &'static str {
        "semver"
    }

    fn is_version(&self, input: &str) -> bool {
        Self::parse(input).is_some()
    }

    fn equals(&self, a: &str, b: &str) -> bool {
        match (Self::parse(a), Self::parse(b)) {
            (Some(a), Some(b)) => a.cmp_precedence(&b) == Ordering::Equal,
            _ => false,
        }
    }

    fn is_greater_than(&self, a: &str, b: &str) -> bool {
        match (Self::parse(a), Self::parse(b)) {
            (Some(a), Some(b)) => a.cmp_precedence(&b) == Ordering::Greater,
            _ => false,
        }
    }

    fn sort_versions(&self, a: &str, b: &str) -> Ordering {
        match (Self::parse(a), Self::parse(b)) {
            (Some(a), Some(b)) => a.cmp_precedence(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}
