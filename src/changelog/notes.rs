//! changelog::notes
//!
//! Release-notes enrichment hook.
//!
//! The assembler hands its finished manifest to a [`ReleaseNotes`] before
//! returning it. Fetching and rendering notes is outside this crate;
//! [`PassthroughNotes`] is the default and returns the manifest unchanged.

use async_trait::async_trait;

use crate::core::types::ChangeLogResult;

/// Post-processes a changelog manifest.
#[async_trait]
pub trait ReleaseNotes: Send + Sync {
    /// Return the manifest, possibly annotated.
    async fn add_release_notes(&self, result: ChangeLogResult) -> ChangeLogResult;
}

/// Returns manifests unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughNotes;

#[async_trait]
impl ReleaseNotes for PassthroughNotes {
    async fn add_release_notes(&self, result: ChangeLogResult) -> ChangeLogResult {
        result
    }
}
