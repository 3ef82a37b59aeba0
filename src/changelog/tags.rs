//! changelog::tags
//!
//! Maps releases to git refs using the repository's tag listing.
//!
//! # Design
//!
//! The tag list is fetched lazily on the first lookup and then reused, so
//! one assembler run issues at most one listing no matter how many releases
//! it resolves. A resolver lives for one run only.
//!
//! Listing failures are split by kind: credential failures propagate, since
//! every later lookup would fail the same way; anything else degrades to an
//! empty list and releases fall back to their explicit `git_ref`.
//!
//! # Matching
//!
//! Monorepos tag releases as `{dep}@{version}` or `{dep}-{version}`. That
//! prefix is stripped only when it starts the tag, then the remainder must be
//! a valid version equal to the release version. A tag with another
//! package's prefix never matches.

use tokio::sync::OnceCell;
use tracing::debug;

use crate::core::types::Release;
use crate::forge::{Forge, ForgeError};
use crate::versioning::Versioning;

/// Lazily-fetched tag list for one repository.
pub struct TagResolver<'a> {
    forge: &'a dyn Forge,
    dep_name: &'a str,
    versioning: &'a dyn Versioning,
    tags: OnceCell<Vec<String>>,
}

impl<'a> TagResolver<'a> {
    /// Create a resolver. Nothing is fetched until the first lookup.
    pub fn new(forge: &'a dyn Forge, dep_name: &'a str, versioning: &'a dyn Versioning) -> Self {
        Self {
            forge,
            dep_name,
            versioning,
            tags: OnceCell::new(),
        }
    }

    /// The ref for `release`: a matching tag, else its `git_ref`, else `None`.
    ///
    /// # Errors
    ///
    /// Only credential failures from the tag listing.
    pub async fn get_ref(&self, release: &Release) -> Result<Option<String>, ForgeError> {
        let tags = self.tags.get_or_try_init(|| self.fetch()).await?;

        let matched = tags.iter().map(String::as_str).find(|&tag| {
            let candidate = scoped_version(self.dep_name, tag).unwrap_or(tag);
            self.versioning.is_version(candidate)
                && self.versioning.equals(candidate, &release.version)
        });

        Ok(matched
            .map(str::to_string)
            .or_else(|| release.git_ref.clone()))
    }

    async fn fetch(&self) -> Result<Vec<String>, ForgeError> {
        match self.forge.list_tags().await {
            Ok(tags) => {
                if tags.is_empty() {
                    debug!(dep_name = self.dep_name, "repository has no tags");
                }
                Ok(tags.into_iter().map(|t| t.name).collect())
            }
            Err(e) if e.is_auth_failure() => Err(e),
            Err(e) => {
                debug!(dep_name = self.dep_name, error = %e, "failed to fetch tags");
                Ok(Vec::new())
            }
        }
    }
}

/// The part of `tag` after a leading `{dep_name}@` or `{dep_name}-`.
///
/// Returns `None` when the tag is not scoped to `dep_name`.
pub fn scoped_version<'t>(dep_name: &str, tag: &'t str) -> Option<&'t str> {
    if dep_name.is_empty() {
        return None;
    }
    tag.strip_prefix(dep_name)
        .and_then(|rest| rest.strip_prefix('@').or_else(|| rest.strip_prefix('-')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{FailOn, MockForge};
    use crate::versioning::SemverVersioning;

    fn release(version: &str) -> Release {
        Release::new(version)
    }

    mod matching {
        use super::*;

        #[tokio::test]
        async fn plain_and_v_prefixed_tags() {
            let forge = MockForge::with_tags(["v1.0.0", "1.1.0"]);
            let resolver = TagResolver::new(&forge, "lib", &SemverVersioning);

            assert_eq!(
                resolver.get_ref(&release("1.0.0")).await.unwrap().as_deref(),
                Some("v1.0.0")
            );
            assert_eq!(
                resolver.get_ref(&release("1.1.0")).await.unwrap().as_deref(),
                Some("1.1.0")
            );
        }

        #[tokio::test]
        async fn dep_scoped_tags() {
            let forge = MockForge::with_tags(["mylib@2.0.0", "mylib-2.1.0"]);
            let resolver = TagResolver::new(&forge, "mylib", &SemverVersioning);

            assert_eq!(
                resolver.get_ref(&release("2.0.0")).await.unwrap().as_deref(),
                Some("mylib@2.0.0")
            );
            assert_eq!(
                resolver.get_ref(&release("2.1.0")).await.unwrap().as_deref(),
                Some("mylib-2.1.0")
            );
        }

        #[tokio::test]
        async fn other_package_tags_never_match() {
            let forge = MockForge::with_tags(["otherlib-1.2.0", "xmylib-1.2.0"]);
            let resolver = TagResolver::new(&forge, "mylib", &SemverVersioning);
            assert_eq!(resolver.get_ref(&release("1.2.0")).await.unwrap(), None);
        }

        #[tokio::test]
        async fn first_equal_tag_wins() {
            let forge = MockForge::with_tags(["1.0.0", "v1.0.0"]);
            let resolver = TagResolver::new(&forge, "lib", &SemverVersioning);
            assert_eq!(
                resolver.get_ref(&release("1.0.0")).await.unwrap().as_deref(),
                Some("1.0.0")
            );
        }

        #[tokio::test]
        async fn falls_back_to_git_ref() {
            let forge = MockForge::with_tags(["v9.9.9"]);
            let resolver = TagResolver::new(&forge, "lib", &SemverVersioning);

            let with_ref = Release::new("1.0.0").with_git_ref("abc123");
            assert_eq!(
                resolver.get_ref(&with_ref).await.unwrap().as_deref(),
                Some("abc123")
            );
            assert_eq!(resolver.get_ref(&release("1.0.0")).await.unwrap(), None);
        }
    }

    #[test]
    fn scoped_version_is_anchored() {
        assert_eq!(scoped_version("lib", "lib@1.0.0"), Some("1.0.0"));
        assert_eq!(scoped_version("lib", "lib-1.0.0"), Some("1.0.0"));
        assert_eq!(scoped_version("lib", "mylib-1.0.0"), None);
        assert_eq!(scoped_version("lib", "library-1.0.0"), None);
        assert_eq!(scoped_version("lib", "v1.0.0"), None);
        assert_eq!(scoped_version("", "-1.0.0"), None);
    }

    mod fetching {
        use super::*;

        #[tokio::test]
        async fn fetches_once() {
            let forge = MockForge::with_tags(["v1.0.0"]);
            let resolver = TagResolver::new(&forge, "lib", &SemverVersioning);

            for v in ["1.0.0", "1.1.0", "2.0.0"] {
                resolver.get_ref(&release(v)).await.unwrap();
            }
            assert_eq!(forge.list_tags_calls(), 1);
        }

        #[tokio::test]
        async fn transient_failure_degrades_to_git_ref() {
            let forge = MockForge::with_tags(["v1.0.0"])
                .fail_on(FailOn::ListTags(ForgeError::NetworkError("reset".into())));
            let resolver = TagResolver::new(&forge, "lib", &SemverVersioning);

            assert_eq!(resolver.get_ref(&release("1.0.0")).await.unwrap(), None);
            let with_ref = Release::new("1.0.0").with_git_ref("deadbeef");
            assert_eq!(
                resolver.get_ref(&with_ref).await.unwrap().as_deref(),
                Some("deadbeef")
            );
            assert_eq!(forge.list_tags_calls(), 1, "degraded list is reused");
        }

        #[tokio::test]
        async fn not_found_degrades() {
            let forge = MockForge::new().fail_on(FailOn::ListTags(ForgeError::NotFound(
                "repos/a/b/tags".into(),
            )));
            let resolver = TagResolver::new(&forge, "lib", &SemverVersioning);
            assert_eq!(resolver.get_ref(&release("1.0.0")).await.unwrap(), None);
        }

        #[tokio::test]
        async fn auth_failure_propagates() {
            let forge = MockForge::new().fail_on(FailOn::ListTags(ForgeError::AuthFailed(
                "Bad credentials".into(),
            )));
            let resolver = TagResolver::new(&forge, "lib", &SemverVersioning);

            let err = resolver.get_ref(&release("1.0.0")).await.unwrap_err();
            assert!(err.is_auth_failure());
        }
    }
}
