//! Workflow tasks for each mod lifecycle operation, one file per family

pub mod builder;
pub mod delete;
pub mod download;
pub mod enable;
pub mod update;

use crate::config::ManagerConfig;
use crate::conflict::ConflictResolver;
use crate::http::HttpFetcher;
use crate::models::ModListing;
use crate::registry::{ModRegistry, ModUpdateNotifier};
use crate::sources::SourceRegistry;
use std::sync::{Arc, OnceLock};

/// Shared slot a download workflow's tasks use to hand the fetched listing
/// down the pipeline
pub type ListingSlot = Arc<OnceLock<ModListing>>;

/// The shared collaborators tasks borrow through `Arc` handles.
///
/// Tasks never own these resources; the `ModManager` does, for the process
/// lifetime.
#[derive(Clone)]
pub struct TaskContext {
    pub config: Arc<ManagerConfig>,
    pub sources: Arc<SourceRegistry>,
    pub fetcher: Arc<HttpFetcher>,
    pub registry: Arc<ModRegistry>,
    pub notifier: Arc<ModUpdateNotifier>,
    pub resolver: Arc<dyn ConflictResolver>,
}
