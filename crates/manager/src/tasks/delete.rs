//! Tasks composing the "delete mod" workflow

use crate::config::ManagerConfig;
use crate::error::WorkflowError;
use crate::models::Mod;
use crate::registry::ModUpdateNotifier;
use crate::workflow::{TaskProgress, WorkflowTask};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::debug;

/// Remove the mod's registry entry and tell listeners it is gone
pub struct UnregisterModTask {
    entry: Mod,
    notifier: Arc<ModUpdateNotifier>,
}

impl UnregisterModTask {
    pub fn new(entry: Mod, notifier: Arc<ModUpdateNotifier>) -> Self {
        Self { entry, notifier }
    }
}

#[async_trait]
impl WorkflowTask for UnregisterModTask {
    fn label(&self) -> &str {
        "unregister mod"
    }

    async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
        Ok(1)
    }

    async fn run(&mut self, _progress: &TaskProgress) -> Result<(), WorkflowError> {
        self.notifier.notify(&self.entry, true);
        Ok(())
    }
}

/// Remove the cached archive and image; absence of either is fine
pub struct DeleteCachedFilesTask {
    entry: Mod,
    config: Arc<ManagerConfig>,
}

impl DeleteCachedFilesTask {
    pub fn new(entry: Mod, config: Arc<ManagerConfig>) -> Self {
        Self { entry, config }
    }
}

#[async_trait]
impl WorkflowTask for DeleteCachedFilesTask {
    fn label(&self) -> &str {
        "delete cached files"
    }

    async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
        Ok(1)
    }

    async fn run(&mut self, _progress: &TaskProgress) -> Result<(), WorkflowError> {
        let mut targets = Vec::new();
        if let Some(archive) = self.entry.cached_archive_path(&self.config) {
            targets.push(archive);
        }
        targets.push(self.entry.cached_image_path(&self.config));

        for path in targets {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "removed cached file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(WorkflowError::Io { path, source: e }),
            }
        }
        Ok(())
    }
}
