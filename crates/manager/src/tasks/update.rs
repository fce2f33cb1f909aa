//! Update-check task: compare remote metadata to the local record

use crate::error::WorkflowError;
use crate::models::Mod;
use crate::registry::ModUpdateNotifier;
use crate::sources::SourceRegistry;
use crate::workflow::{TaskProgress, WorkflowTask};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Fetch the mod's latest listing and flag the local record when the source
/// has something newer
pub struct CheckUpdateTask {
    entry: Mod,
    sources: Arc<SourceRegistry>,
    notifier: Arc<ModUpdateNotifier>,
}

impl CheckUpdateTask {
    pub fn new(entry: Mod, sources: Arc<SourceRegistry>, notifier: Arc<ModUpdateNotifier>) -> Self {
        Self {
            entry,
            sources,
            notifier,
        }
    }
}

#[async_trait]
impl WorkflowTask for CheckUpdateTask {
    fn label(&self) -> &str {
        "check for update"
    }

    async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
        Ok(1)
    }

    async fn run(&mut self, _progress: &TaskProgress) -> Result<(), WorkflowError> {
        let listing = self.sources.fetch_listing(&self.entry.page_url).await?;

        let newer_timestamp = match (listing.updated_on, self.entry.updated_on) {
            (Some(remote), Some(local)) => remote > local,
            (Some(_), None) => true,
            _ => false,
        };
        let changed_file =
            self.entry.newest_file_name.as_deref() != Some(listing.newest_file_name.as_str());

        if newer_timestamp || changed_file {
            debug!(id = %self.entry.id, "update available");
            let mut entry = self.entry.clone();
            entry.update_available = true;
            self.notifier.notify(&entry, false);
        }
        Ok(())
    }
}
