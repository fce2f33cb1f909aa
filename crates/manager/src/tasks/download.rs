//! Tasks composing the "download mod" workflow

use crate::config::ManagerConfig;
use crate::error::WorkflowError;
use crate::http::HttpFetcher;
use crate::registry::{ModRegistry, ModUpdateNotifier};
use crate::sources::SourceRegistry;
use crate::tasks::ListingSlot;
use crate::workflow::{TaskProgress, WorkflowTask};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Resolve the page URL into a structured listing and publish it to the
/// workflow's shared slot
pub struct FetchListingTask {
    sources: Arc<SourceRegistry>,
    page_url: Url,
    slot: ListingSlot,
}

impl FetchListingTask {
    pub fn new(sources: Arc<SourceRegistry>, page_url: Url, slot: ListingSlot) -> Self {
        Self {
            sources,
            page_url,
            slot,
        }
    }
}

#[async_trait]
impl WorkflowTask for FetchListingTask {
    fn label(&self) -> &str {
        "fetch listing"
    }

    async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
        Ok(1)
    }

    async fn run(&mut self, _progress: &TaskProgress) -> Result<(), WorkflowError> {
        let listing = self.sources.fetch_listing(&self.page_url).await?;
        debug!(id = %listing.id, name = %listing.name, "fetched mod listing");
        let _ = self.slot.set(listing);
        Ok(())
    }
}

/// Download the mod archive into the local cache.
///
/// The task's weight is the remote content length; a server that does not
/// report one makes the workload undeterminable.
pub struct DownloadArchiveTask {
    fetcher: Arc<HttpFetcher>,
    config: Arc<ManagerConfig>,
    slot: ListingSlot,
    already_cached: bool,
}

impl DownloadArchiveTask {
    pub fn new(fetcher: Arc<HttpFetcher>, config: Arc<ManagerConfig>, slot: ListingSlot) -> Self {
        Self {
            fetcher,
            config,
            slot,
            already_cached: false,
        }
    }
}

#[async_trait]
impl WorkflowTask for DownloadArchiveTask {
    fn label(&self) -> &str {
        "download archive"
    }

    async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
        let listing = self.slot.get().ok_or(WorkflowError::MissingListing)?;
        let dest = self.config.archive_cache_dir.join(&listing.newest_file_name);
        if dest.exists() {
            self.already_cached = true;
            return Ok(1);
        }
        match self.fetcher.content_length(&listing.download_url).await? {
            Some(length) if length > 0 => Ok(length),
            _ => Err(WorkflowError::InvalidContent {
                task: self.label().to_string(),
                reason: format!(
                    "no content length reported for '{}'",
                    listing.download_url
                ),
            }),
        }
    }

    async fn run(&mut self, progress: &TaskProgress) -> Result<(), WorkflowError> {
        let listing = self.slot.get().ok_or(WorkflowError::MissingListing)?;
        let dest = self.config.archive_cache_dir.join(&listing.newest_file_name);
        if self.already_cached {
            debug!(archive = %dest.display(), "archive already cached, skipping download");
            return Ok(());
        }
        self.fetcher
            .download_to(&listing.download_url, &dest, progress)
            .await?;
        Ok(())
    }
}

/// Cache the mod's image, best-effort: a missing or failing image never
/// fails the download workflow
pub struct CacheImageTask {
    fetcher: Arc<HttpFetcher>,
    config: Arc<ManagerConfig>,
    slot: ListingSlot,
}

impl CacheImageTask {
    pub fn new(fetcher: Arc<HttpFetcher>, config: Arc<ManagerConfig>, slot: ListingSlot) -> Self {
        Self {
            fetcher,
            config,
            slot,
        }
    }
}

#[async_trait]
impl WorkflowTask for CacheImageTask {
    fn label(&self) -> &str {
        "cache image"
    }

    async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
        Ok(1)
    }

    async fn run(&mut self, progress: &TaskProgress) -> Result<(), WorkflowError> {
        let listing = self.slot.get().ok_or(WorkflowError::MissingListing)?;
        let Some(image_url) = listing.image_url.clone() else {
            return Ok(());
        };
        let dest = self
            .config
            .image_cache_dir
            .join(format!("{}.jpg", listing.id));
        if let Err(e) = self.fetcher.download_to(&image_url, &dest, progress).await {
            warn!(url = %image_url, error = %e, "failed to cache mod image");
        }
        Ok(())
    }
}

/// Build the registry record from the fetched listing and notify listeners
pub struct RegisterModTask {
    registry: Arc<ModRegistry>,
    notifier: Arc<ModUpdateNotifier>,
    slot: ListingSlot,
}

impl RegisterModTask {
    pub fn new(
        registry: Arc<ModRegistry>,
        notifier: Arc<ModUpdateNotifier>,
        slot: ListingSlot,
    ) -> Self {
        Self {
            registry,
            notifier,
            slot,
        }
    }
}

#[async_trait]
impl WorkflowTask for RegisterModTask {
    fn label(&self) -> &str {
        "register mod"
    }

    async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
        Ok(1)
    }

    async fn run(&mut self, _progress: &TaskProgress) -> Result<(), WorkflowError> {
        let listing = self
            .slot
            .get()
            .cloned()
            .ok_or(WorkflowError::MissingListing)?;
        // A fresh download of an already-registered mod keeps its enabled flag
        let enabled = self
            .registry
            .get(&listing.id)
            .map(|existing| existing.enabled)
            .unwrap_or(false);
        let entry = listing.into_mod(enabled);
        self.notifier.notify(&entry, false);
        Ok(())
    }
}
