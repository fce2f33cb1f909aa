//! Mod lifecycle manager core
//!
//! This crate implements the asynchronous task-execution framework behind a
//! game mod manager. The call chain flows as follows:
//!
//! User Code
//! ↓
//! ModManager (manager.rs)
//! ↓
//! workflow builders (tasks/builder.rs)
//! ↓
//! WorkerPool / Workflow engine (workflow/*)
//! ↓
//! Tasks (tasks/*) calling back into ModRegistry, SourceRegistry, HttpFetcher

pub mod config;
pub mod conflict;
pub mod error;
pub mod http;
pub mod manager;
pub mod models;
pub mod registry;
pub mod sources;
pub mod tasks;
pub mod workflow;

// Re-export main types for convenience
pub use config::ManagerConfig;
pub use conflict::{
    ChannelConflictResolver, ConflictPrompt, ConflictResolver, FileConflict, OverwriteResolver,
    Resolution, SkipResolver,
};
pub use error::{ModError, SourceError, WorkflowError};
pub use http::HttpFetcher;
pub use manager::ModManager;
pub use models::{Mod, ModListing};
pub use registry::{ModRegistry, ModUpdateListener, ModUpdateNotifier};
pub use sources::{ManifestSource, ModSource, SourceRegistry};
pub use workflow::{
    CompositeWorkflowListener, IntoWorkflowCallback, NullWorkflowListener, TaskProgress,
    WorkerPool, Workflow, WorkflowCallback, WorkflowEvent, WorkflowHandle, WorkflowListener,
    WorkflowTask,
};
