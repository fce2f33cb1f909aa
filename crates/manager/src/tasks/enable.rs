//! Tasks composing the enable/disable workflows

use crate::config::ManagerConfig;
use crate::conflict::{ConflictResolver, FileConflict, Resolution};
use crate::error::WorkflowError;
use crate::models::Mod;
use crate::registry::ModUpdateNotifier;
use crate::workflow::{TaskProgress, WorkflowTask};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

fn open_archive(path: &Path) -> Result<zip::ZipArchive<std::fs::File>, WorkflowError> {
    let file = std::fs::File::open(path).map_err(|e| WorkflowError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    zip::ZipArchive::new(file).map_err(|e| WorkflowError::Archive {
        path: path.to_path_buf(),
        source: e,
    })
}

fn io_error(path: &Path, source: std::io::Error) -> WorkflowError {
    WorkflowError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn archive_path(entry: &Mod, config: &ManagerConfig, task: &str) -> Result<PathBuf, WorkflowError> {
    entry
        .cached_archive_path(config)
        .ok_or_else(|| WorkflowError::InvalidContent {
            task: task.to_string(),
            reason: format!("mod '{}' has no archive file name", entry.name),
        })
}

async fn count_entries(path: PathBuf, task: &str) -> Result<u64, WorkflowError> {
    let label = task.to_string();
    tokio::task::spawn_blocking(move || open_archive(&path).map(|archive| archive.len() as u64))
        .await
        .map_err(|_| WorkflowError::Join { task: label })?
        .map(|count| count.max(1))
}

/// Extract the cached archive into the game data directory, consulting the
/// conflict resolver for every file that already exists
pub struct ExtractArchiveTask {
    entry: Mod,
    config: Arc<ManagerConfig>,
    resolver: Arc<dyn ConflictResolver>,
}

impl ExtractArchiveTask {
    pub fn new(entry: Mod, config: Arc<ManagerConfig>, resolver: Arc<dyn ConflictResolver>) -> Self {
        Self {
            entry,
            config,
            resolver,
        }
    }
}

#[async_trait]
impl WorkflowTask for ExtractArchiveTask {
    fn label(&self) -> &str {
        "extract archive"
    }

    async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
        let path = archive_path(&self.entry, &self.config, self.label())?;
        count_entries(path, self.label()).await
    }

    async fn run(&mut self, progress: &TaskProgress) -> Result<(), WorkflowError> {
        let path = archive_path(&self.entry, &self.config, self.label())?;
        let game_dir = self.config.game_data_dir.clone();
        let resolver = self.resolver.clone();
        let mod_name = self.entry.name.clone();
        let progress = progress.clone();

        let label = self.label().to_string();
        tokio::task::spawn_blocking(move || {
            let mut archive = open_archive(&path)?;
            for index in 0..archive.len() {
                let mut file = archive.by_index(index).map_err(|e| WorkflowError::Archive {
                    path: path.clone(),
                    source: e,
                })?;
                // Entries escaping the game directory are never installed
                let Some(relative) = file.enclosed_name() else {
                    progress.tick(1);
                    continue;
                };
                let dest = game_dir.join(&relative);

                if file.is_dir() {
                    std::fs::create_dir_all(&dest).map_err(|e| io_error(&dest, e))?;
                    progress.tick(1);
                    continue;
                }

                if dest.exists() {
                    let conflict = FileConflict {
                        mod_name: mod_name.clone(),
                        path: dest.clone(),
                    };
                    match resolver.resolve(&conflict) {
                        Resolution::Overwrite => {}
                        Resolution::Skip => {
                            debug!(path = %dest.display(), "conflict skipped, keeping existing file");
                            progress.tick(1);
                            continue;
                        }
                        Resolution::Abort => {
                            return Err(WorkflowError::InstallAborted { path: dest });
                        }
                    }
                }

                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
                }
                let mut out = std::fs::File::create(&dest).map_err(|e| io_error(&dest, e))?;
                std::io::copy(&mut file, &mut out).map_err(|e| io_error(&dest, e))?;
                progress.tick(1);
            }
            Ok(())
        })
        .await
        .map_err(|_| WorkflowError::Join { task: label })?
    }
}

/// Remove the files this mod's archive installed, pruning directories that
/// end up empty
pub struct RemoveInstalledFilesTask {
    entry: Mod,
    config: Arc<ManagerConfig>,
}

impl RemoveInstalledFilesTask {
    pub fn new(entry: Mod, config: Arc<ManagerConfig>) -> Self {
        Self { entry, config }
    }
}

#[async_trait]
impl WorkflowTask for RemoveInstalledFilesTask {
    fn label(&self) -> &str {
        "remove installed files"
    }

    async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
        let path = archive_path(&self.entry, &self.config, self.label())?;
        count_entries(path, self.label()).await
    }

    async fn run(&mut self, progress: &TaskProgress) -> Result<(), WorkflowError> {
        let path = archive_path(&self.entry, &self.config, self.label())?;
        let game_dir = self.config.game_data_dir.clone();
        let progress = progress.clone();

        let label = self.label().to_string();
        tokio::task::spawn_blocking(move || {
            let mut archive = open_archive(&path)?;
            let mut dirs: Vec<PathBuf> = Vec::new();
            for index in 0..archive.len() {
                let file = archive.by_index(index).map_err(|e| WorkflowError::Archive {
                    path: path.clone(),
                    source: e,
                })?;
                let Some(relative) = file.enclosed_name() else {
                    progress.tick(1);
                    continue;
                };
                let dest = game_dir.join(&relative);

                if file.is_dir() {
                    dirs.push(dest);
                } else {
                    match std::fs::remove_file(&dest) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::NotFound => {}
                        Err(e) => return Err(io_error(&dest, e)),
                    }
                    if let Some(parent) = dest.parent() {
                        if parent != game_dir {
                            dirs.push(parent.to_path_buf());
                        }
                    }
                }
                progress.tick(1);
            }

            // Deepest first, so nested emptied directories fold up
            dirs.sort_by(|a, b| {
                b.components()
                    .count()
                    .cmp(&a.components().count())
                    .then_with(|| a.cmp(b))
            });
            dirs.dedup();
            for dir in dirs {
                // Fails on non-empty directories, which is exactly what we want
                let _ = std::fs::remove_dir(&dir);
            }
            Ok(())
        })
        .await
        .map_err(|_| WorkflowError::Join { task: label })?
    }
}

/// Flip the mod's enabled flag and commit it through the notifier
pub struct MarkEnabledTask {
    entry: Mod,
    notifier: Arc<ModUpdateNotifier>,
    enable: bool,
}

impl MarkEnabledTask {
    pub fn new(entry: Mod, notifier: Arc<ModUpdateNotifier>, enable: bool) -> Self {
        Self {
            entry,
            notifier,
            enable,
        }
    }
}

#[async_trait]
impl WorkflowTask for MarkEnabledTask {
    fn label(&self) -> &str {
        "mark enabled"
    }

    async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
        Ok(1)
    }

    async fn run(&mut self, _progress: &TaskProgress) -> Result<(), WorkflowError> {
        let mut entry = self.entry.clone();
        entry.enabled = self.enable;
        self.notifier.notify(&entry, false);
        Ok(())
    }
}
