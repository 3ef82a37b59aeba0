//! versioning::loose
//!
//! Dotted numeric versions of arbitrary length (`1`, `1.2`, `1.2.3.4`),
//! optionally followed by a `-suffix` that marks a pre-release.
//!
//! Missing components compare as zero, so `1.2` equals `1.2.0`.

use std::cmp::Ordering;

use super::{strip_version_prefix, Versioning};

/// Parsed loose version.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LooseVersion {
    parts: Vec<u64>,
    suffix: Option<String>,
}

impl LooseVersion {
    fn parse(input: &str) -> Option<Self> {
        let input = strip_version_prefix(input);
        let (numbers, suffix) = match input.split_once('-') {
            Some((n, s)) if !s.is_empty() => (n, Some(s.to_string())),
            Some(_) => return None,
            None => (input, None),
        };
        if numbers.is_empty() {
            return None;
        }
        let parts = numbers
            .split('.')
            .map(|p| {
                if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    p.parse::<u64>().ok()
                }
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self { parts, suffix })
    }

    fn precedence(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        // a release outranks any of its pre-releases
        match (&self.suffix, &other.suffix) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

/// Loose dotted-numeric versioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooseVersioning;

impl Versioning for LooseVersioning {
    fn name(&self) -> &'static str {
        "loose"
    }

    fn is_version(&self, input: &str) -> bool {
        LooseVersion::parse(input).is_some()
    }

    fn equals(&self, a: &str, b: &str) -> bool {
        match (LooseVersion::parse(a), LooseVersion::parse(b)) {
            (Some(a), Some(b)) => a.precedence(&b) == Ordering::Equal,
            _ => false,
        }
    }

    fn is_greater_than(&self, a: &str, b: &str) -> bool {
        match (LooseVersion::parse(a), LooseVersion::parse(b)) {
            (Some(a), Some(b)) => a.precedence(&b) == Ordering::Greater,
            _ => false,
        }
    }

    fn sort_versions(&self, a: &str, b: &str) -> Ordering {
        match (LooseVersion::parse(a), LooseVersion::parse(b)) {
            (Some(va), Some(vb)) => va.precedence(&vb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity() {
        let l = LooseVersioning;
        assert!(l.is_version("1"));
        assert!(l.is_version("1.2"));
        assert!(l.is_version("v1.2.3.4"));
        assert!(l.is_version("2.0-rc1"));
        assert!(!l.is_version(""));
        assert!(!l.is_version("1..2"));
        assert!(!l.is_version("1.x"));
        assert!(!l.is_version("1.0-"));
        assert!(!l.is_version("release"));
    }

    #[test]
    fn missing_components_are_zero() {
        let l = LooseVersioning;
        assert!(l.equals("1.2", "1.2.0"));
        assert!(l.equals("v3", "3.0.0.0"));
        assert!(!l.equals("1.2", "1.2.1"));
    }

    #[test]
    fn suffix_sorts_before_release() {
        let l = LooseVersioning;
        assert!(l.is_greater_than("2.0", "2.0-rc1"));
        assert!(l.is_greater_than("2.0-rc2", "2.0-rc1"));
        assert!(l.is_greater_than("2.0.1-alpha", "2.0"));
    }

    #[test]
    fn sort_ascending() {
        let l = LooseVersioning;
        let mut versions = vec!["10", "9.1", "9.1-beta", "9"];
        versions.sort_by(|a, b| l.sort_versions(a, b));
        assert_eq!(versions, vec!["9", "9.1-beta", "9.1", "10"]);
    }
}
