//! Workflow builders: one function per mod lifecycle operation

use crate::models::Mod;
use crate::tasks::delete::{DeleteCachedFilesTask, UnregisterModTask};
use crate::tasks::download::{
    CacheImageTask, DownloadArchiveTask, FetchListingTask, RegisterModTask,
};
use crate::tasks::enable::{ExtractArchiveTask, MarkEnabledTask, RemoveInstalledFilesTask};
use crate::tasks::update::CheckUpdateTask;
use crate::tasks::{ListingSlot, TaskContext};
use crate::workflow::Workflow;
use std::sync::{Arc, OnceLock};
use url::Url;

fn base_name(url: &Url) -> &str {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("mod")
}

/// {fetch listing, download archive, cache image, register}
pub fn download_mod(ctx: &TaskContext, page_url: Url) -> Workflow {
    let slot: ListingSlot = Arc::new(OnceLock::new());
    let mut workflow = Workflow::new(format!("Downloading {}", base_name(&page_url)));
    workflow.add_task(FetchListingTask::new(
        ctx.sources.clone(),
        page_url,
        slot.clone(),
    ));
    workflow.add_task(DownloadArchiveTask::new(
        ctx.fetcher.clone(),
        ctx.config.clone(),
        slot.clone(),
    ));
    workflow.add_task(CacheImageTask::new(
        ctx.fetcher.clone(),
        ctx.config.clone(),
        slot.clone(),
    ));
    workflow.add_task(RegisterModTask::new(
        ctx.registry.clone(),
        ctx.notifier.clone(),
        slot,
    ));
    workflow
}

/// {extract archive resolving conflicts, mark enabled}
pub fn enable_mod(ctx: &TaskContext, entry: Mod) -> Workflow {
    let mut workflow = Workflow::new(format!("Enabling {}", entry.name));
    workflow.add_task(ExtractArchiveTask::new(
        entry.clone(),
        ctx.config.clone(),
        ctx.resolver.clone(),
    ));
    workflow.add_task(MarkEnabledTask::new(entry, ctx.notifier.clone(), true));
    workflow
}

/// {remove installed files, mark disabled}
pub fn disable_mod(ctx: &TaskContext, entry: Mod) -> Workflow {
    let mut workflow = Workflow::new(format!("Disabling {}", entry.name));
    workflow.add_task(RemoveInstalledFilesTask::new(entry.clone(), ctx.config.clone()));
    workflow.add_task(MarkEnabledTask::new(entry, ctx.notifier.clone(), false));
    workflow
}

/// {remove installed files if enabled, unregister, delete cached files}
pub fn delete_mod(ctx: &TaskContext, entry: Mod) -> Workflow {
    let mut workflow = Workflow::new(format!("Deleting {}", entry.name));
    if entry.enabled {
        workflow.add_task(RemoveInstalledFilesTask::new(entry.clone(), ctx.config.clone()));
    }
    workflow.add_task(UnregisterModTask::new(entry.clone(), ctx.notifier.clone()));
    workflow.add_task(DeleteCachedFilesTask::new(entry, ctx.config.clone()));
    workflow
}

/// {compare remote metadata to the local record}
pub fn check_for_updates(ctx: &TaskContext, entry: Mod) -> Workflow {
    let mut workflow = Workflow::new(format!("Checking for update to {}", entry.name));
    workflow.add_task(CheckUpdateTask::new(
        entry,
        ctx.sources.clone(),
        ctx.notifier.clone(),
    ));
    workflow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_falls_back_for_bare_hosts() {
        let url = Url::parse("https://mods.example/ksp/220221").unwrap();
        assert_eq!(base_name(&url), "220221");
        let bare = Url::parse("https://mods.example/").unwrap();
        assert_eq!(base_name(&bare), "mod");
    }
}
