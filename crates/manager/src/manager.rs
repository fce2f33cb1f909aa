//! Mod Manager: the public entry point for all mod operations
//!
//! Every operation builds a workflow and submits it to one of two pools: the
//! download pool runs independent downloads in parallel, the enabler pool is
//! one worker wide so file-system-mutating operations never interleave.
//! Entry points that return `Ok` have only submitted work; outcomes of the
//! asynchronous portion arrive through workflow and mod-update listeners.

use crate::config::ManagerConfig;
use crate::conflict::{ConflictResolver, OverwriteResolver};
use crate::error::ModError;
use crate::http::HttpFetcher;
use crate::models::Mod;
use crate::registry::{ModRegistry, ModUpdateListener, ModUpdateNotifier};
use crate::sources::SourceRegistry;
use crate::tasks::{builder, TaskContext};
use crate::workflow::{
    IntoWorkflowCallback, WorkerPool, Workflow, WorkflowCallback, WorkflowHandle, WorkflowListener,
};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use url::Url;

pub const NUM_CONCURRENT_DOWNLOADS: usize = 4;

pub struct ModManager {
    ctx: TaskContext,
    download_pool: WorkerPool,
    enabler_pool: WorkerPool,
    workflow_callbacks: Mutex<Vec<WorkflowCallback>>,
}

impl ModManager {
    /// Manager with the default non-interactive conflict strategy
    pub fn new(config: ManagerConfig, sources: SourceRegistry) -> Self {
        Self::with_resolver(config, sources, Arc::new(OverwriteResolver))
    }

    pub fn with_resolver(
        config: ManagerConfig,
        sources: SourceRegistry,
        resolver: Arc<dyn ConflictResolver>,
    ) -> Self {
        let fetcher = Arc::new(HttpFetcher::new(&config));
        let registry = Arc::new(ModRegistry::new(config.registry_path.clone()));
        let notifier = Arc::new(ModUpdateNotifier::new());
        // The registry is the first observer of every mod change
        notifier.subscribe(registry.clone());

        let download_pool = WorkerPool::new(
            "downloads",
            config.download_pool_width.max(1),
            config.queue_depth,
        );
        // Width 1: enable/disable/delete mutate the shared game directory
        let enabler_pool = WorkerPool::new("enabler", 1, config.queue_depth);

        Self {
            ctx: TaskContext {
                config: Arc::new(config),
                sources: Arc::new(sources),
                fetcher,
                registry,
                notifier,
                resolver,
            },
            download_pool,
            enabler_pool,
            workflow_callbacks: Mutex::new(Vec::new()),
        }
    }

    // -- Listeners -----------------------

    pub fn add_listener(&self, listener: Arc<dyn ModUpdateListener>) {
        self.ctx.notifier.subscribe(listener);
    }

    pub fn add_workflow_listener<L: WorkflowListener + 'static>(&self, listener: L) {
        self.workflow_callbacks
            .lock()
            .unwrap()
            .push(listener.into_callback());
    }

    pub fn notify_mod_updated(&self, entry: &Mod, deleted: bool) {
        self.ctx.notifier.notify(entry, deleted);
    }

    // -- Accessors ------------------------

    pub fn registry(&self) -> &Arc<ModRegistry> {
        &self.ctx.registry
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.ctx.config
    }

    pub fn is_downloaded(&self, entry: &Mod) -> bool {
        entry.is_downloaded(&self.ctx.config)
    }

    // -- Modifiers ---------------------------------

    async fn submit_download_workflow(&self, workflow: Workflow) -> Result<WorkflowHandle, ModError> {
        self.download_pool.submit(self.attach(workflow)).await
    }

    async fn submit_enabler_workflow(&self, workflow: Workflow) -> Result<WorkflowHandle, ModError> {
        self.enabler_pool.submit(self.attach(workflow)).await
    }

    fn attach(&self, mut workflow: Workflow) -> Workflow {
        for callback in self.workflow_callbacks.lock().unwrap().iter() {
            workflow.add_callback(callback.clone());
        }
        workflow
    }

    /// Fetch a mod page, download its archive, and register it.
    ///
    /// The host check fails synchronously with `UnsupportedHost`; everything
    /// after submission is observable only through listeners.
    pub async fn download_mod(&self, page_url: Url) -> Result<WorkflowHandle, ModError> {
        self.ctx.sources.find_source(&page_url)?;
        info!(url = %page_url, "submitting download workflow");
        let workflow = builder::download_mod(&self.ctx, page_url);
        self.submit_download_workflow(workflow).await
    }

    /// Re-download a registered mod from its page URL
    pub async fn update_mod(&self, entry: &Mod) -> Result<WorkflowHandle, ModError> {
        self.download_mod(entry.page_url.clone())
            .await
            .map_err(|e| ModError::ModUpdateFailed {
                name: entry.name.clone(),
                source: Box::new(e),
            })
    }

    /// Update every registered mod; the first failure aborts the loop
    pub async fn update_mods(&self) -> Result<Vec<WorkflowHandle>, ModError> {
        let mut handles = Vec::new();
        for entry in self.ctx.registry.get_all() {
            handles.push(self.update_mod(&entry).await?);
        }
        Ok(handles)
    }

    /// Install the mod's files into the game directory and mark it enabled.
    ///
    /// Fails fast, before any workflow is built, if the mod is already
    /// enabled or its archive is not cached.
    pub async fn enable_mod(&self, entry: &Mod) -> Result<WorkflowHandle, ModError> {
        if entry.enabled {
            return Err(ModError::ModAlreadyEnabled {
                name: entry.name.clone(),
            });
        }
        if !self.is_downloaded(entry) {
            return Err(ModError::ModNotDownloaded {
                name: entry.name.clone(),
            });
        }
        info!(id = %entry.id, "submitting enable workflow");
        let workflow = builder::enable_mod(&self.ctx, entry.clone());
        self.submit_enabler_workflow(workflow).await
    }

    /// Remove the mod's installed files and mark it disabled
    pub async fn disable_mod(&self, entry: &Mod) -> Result<WorkflowHandle, ModError> {
        if !entry.enabled {
            return Err(ModError::ModAlreadyDisabled {
                name: entry.name.clone(),
            });
        }
        info!(id = %entry.id, "submitting disable workflow");
        let workflow = builder::disable_mod(&self.ctx, entry.clone());
        self.submit_enabler_workflow(workflow).await
    }

    /// Disable if needed, drop the registry entry, and clear cached files
    pub async fn delete_mod(&self, entry: &Mod) -> Result<WorkflowHandle, ModError> {
        info!(id = %entry.id, "submitting delete workflow");
        let workflow = builder::delete_mod(&self.ctx, entry.clone());
        self.submit_enabler_workflow(workflow).await
    }

    /// Check every registered mod for updates, best-effort.
    ///
    /// Every mod is attempted; all failures are collected and reported
    /// together rather than keeping only the last one.
    pub async fn check_for_mod_updates(&self) -> Result<(), ModError> {
        let mut handles = Vec::new();
        let mut errors: Vec<ModError> = Vec::new();

        for entry in self.ctx.registry.get_all() {
            if let Err(e) = self.ctx.sources.find_source(&entry.page_url) {
                warn!(id = %entry.id, error = %e, "cannot check mod for updates");
                errors.push(ModError::Source(e));
                continue;
            }
            let workflow = builder::check_for_updates(&self.ctx, entry);
            match self.submit_download_workflow(workflow).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    warn!(error = %e, "update check submission failed");
                    errors.push(e);
                }
            }
        }

        for handle in handles {
            if let Err(e) = handle.wait().await {
                errors.push(e.into());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ModError::UpdateChecksFailed { errors })
        }
    }

    /// Close both pools and wait for in-flight workflows to finish
    pub async fn shutdown(self) {
        self.download_pool.shutdown().await;
        self.enabler_pool.shutdown().await;
    }
}
