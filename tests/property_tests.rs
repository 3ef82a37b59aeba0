//! Property-based tests for changelog ordering and windowing.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated release lists.

use std::sync::Arc;

use proptest::prelude::*;

use upstep::cache::MemoryCache;
use upstep::changelog::{compute_changelog, Collaborators};
use upstep::core::types::{ChangeLogConfig, ChangeLogOutcome, Release};
use upstep::forge::mock::MockForge;
use upstep::hosts::HostRules;
use upstep::versioning::{self, Versioning};

/// Strategy for generating semantic version strings.
fn semver_string() -> impl Strategy<Value = String> {
    (0u64..4, 0u64..6, 0u64..6).prop_map(|(major, minor, patch)| format!("{}.{}.{}", major, minor, patch))
}

/// Strategy for release lists with some junk mixed in.
fn release_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            8 => semver_string(),
            1 => Just("latest".to_string()),
            1 => Just("1.x".to_string()),
        ],
        0..20,
    )
}

fn run(releases: &[String], from: &str, to: &str, tags: &[String]) -> ChangeLogOutcome {
    let forge = MockForge::with_tags(tags.iter().map(|t| format!("v{}", t)));
    let collaborators = Collaborators::new(
        HostRules::new(vec![]).with_env([("GITHUB_TOKEN", "ghp_property")]),
        Arc::new(MemoryCache::new()),
    )
    .with_forge_provider(Arc::new(forge));

    let config = ChangeLogConfig {
        endpoint: None,
        versioning: "semver".into(),
        from_version: from.into(),
        to_version: to.into(),
        source_url: "https://github.com/acme/lib".into(),
        releases: releases.iter().map(Release::new).collect(),
        dep_name: "lib".into(),
        manager: "npm".into(),
    };

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(compute_changelog(&config, &collaborators)).unwrap()
}

proptest! {
    #[test]
    fn steps_stay_inside_window(
        releases in release_list(),
        from in semver_string(),
        to in semver_string(),
    ) {
        let scheme = versioning::get("semver").unwrap();
        if let ChangeLogOutcome::Found(result) = run(&releases, &from, &to, &releases) {
            for step in &result.versions {
                prop_assert!(scheme.is_greater_than(&step.version, &from));
                prop_assert!(!scheme.is_greater_than(&step.version, &to));
            }
        }
    }

    #[test]
    fn steps_are_newest_first(
        releases in release_list(),
        from in semver_string(),
        to in semver_string(),
    ) {
        let scheme = versioning::get("semver").unwrap();
        if let ChangeLogOutcome::Found(result) = run(&releases, &from, &to, &[]) {
            for pair in result.versions.windows(2) {
                prop_assert!(
                    !scheme.is_greater_than(&pair[1].version, &pair[0].version),
                    "{} listed before {}", pair[0].version, pair[1].version
                );
            }
        }
    }

    #[test]
    fn input_order_is_irrelevant(
        releases in release_list(),
        from in semver_string(),
        to in semver_string(),
    ) {
        let mut reversed = releases.clone();
        reversed.reverse();
        prop_assert_eq!(
            run(&releases, &from, &to, &releases),
            run(&reversed, &from, &to, &releases)
        );
    }

    #[test]
    fn fewer_than_two_valid_releases_skip(
        version in semver_string(),
        from in semver_string(),
        to in semver_string(),
    ) {
        let releases = vec![version, "latest".to_string()];
        prop_assert_eq!(run(&releases, &from, &to, &[]), ChangeLogOutcome::Skipped);
    }

    #[test]
    fn semver_sort_agrees_with_greater_than(a in semver_string(), b in semver_string()) {
        let scheme = versioning::get("semver").unwrap();
        let greater = scheme.is_greater_than(&a, &b);
        prop_assert_eq!(greater, scheme.sort_versions(&a, &b) == std::cmp::Ordering::Greater);
    }
}

#[test]
fn tagged_releases_link_between_adjacent_tags() {
    let releases: Vec<String> = ["1.0.0", "1.1.0", "2.0.0"].iter().map(|s| s.to_string()).collect();
    let outcome = run(&releases, "1.0.0", "2.0.0", &releases);
    let result = outcome.result().expect("manifest");
    let urls: Vec<_> = result
        .versions
        .iter()
        .map(|v| v.compare.url.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://github.com/acme/lib/compare/v1.1.0...v2.0.0",
            "https://github.com/acme/lib/compare/v1.0.0...v1.1.0",
        ]
    );
}
