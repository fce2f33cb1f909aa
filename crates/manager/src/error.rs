//! Error types for the manager core with context and source chaining

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving or querying a mod metadata source
#[derive(Error, Debug)]
pub enum SourceError {
    /// The page URL's host has no recognized source implementation
    #[error("no registered mod source supports host '{host}' in '{url}'")]
    UnsupportedHost { url: String, host: String },

    /// The page could not be fetched or its metadata could not be parsed
    #[error("could not read mod metadata from '{url}'")]
    CannotAddMod {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Failures surfaced by a running workflow task
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A task could not determine its own workload before running
    #[error("task '{task}' could not determine its workload: {reason}")]
    InvalidContent { task: String, reason: String },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("HTTP request to '{url}' failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("file operation failed on '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("archive error in '{path}'")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The conflict resolver chose to abort the installation
    #[error("install aborted on conflicting file '{path}'")]
    InstallAborted { path: PathBuf },

    /// A task that depends on fetched metadata ran before the fetch completed
    #[error("workflow task ran before its mod listing was available")]
    MissingListing,

    #[error("blocking task '{task}' did not complete")]
    Join { task: String },

    /// The worker pool shut down before the workflow could run
    #[error("workflow was dropped before execution")]
    Canceled,
}

/// Errors reported synchronously by `ModManager` entry points
#[derive(Error, Debug)]
pub enum ModError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("mod '{name}' is already enabled")]
    ModAlreadyEnabled { name: String },

    #[error("mod '{name}' is already disabled")]
    ModAlreadyDisabled { name: String },

    #[error("mod '{name}' has no cached archive")]
    ModNotDownloaded { name: String },

    #[error("update of mod '{name}' failed")]
    ModUpdateFailed {
        name: String,
        #[source]
        source: Box<ModError>,
    },

    /// Aggregate result of a best-effort update check over all mods.
    ///
    /// Every failure encountered is kept with its concrete cause, not just
    /// the last one.
    #[error("{} mod update check(s) failed", errors.len())]
    UpdateChecksFailed { errors: Vec<ModError> },

    #[error("worker pool is closed")]
    PoolClosed,
}

pub type Result<T, E = ModError> = std::result::Result<T, E>;
