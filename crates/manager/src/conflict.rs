//! Conflict resolution strategy for colliding installed files

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use tracing::warn;

/// Description of a file collision detected while installing a mod
#[derive(Debug, Clone)]
pub struct FileConflict {
    /// Name of the mod whose installation hit the collision
    pub mod_name: String,
    /// Path of the already-existing file inside the game data directory
    pub path: PathBuf,
}

/// Decision for one colliding file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Overwrite,
    Skip,
    /// Fail the owning workflow; no further files are installed
    Abort,
}

/// Pluggable strategy consulted per colliding file from within an enable
/// workflow. Called on a worker thread; implementations are allowed to block
/// the worker while a decision is made.
pub trait ConflictResolver: Send + Sync {
    fn resolve(&self, conflict: &FileConflict) -> Resolution;
}

/// Headless strategy: always replace the existing file
#[derive(Debug, Default)]
pub struct OverwriteResolver;

impl ConflictResolver for OverwriteResolver {
    fn resolve(&self, _conflict: &FileConflict) -> Resolution {
        Resolution::Overwrite
    }
}

/// Headless strategy: always keep the existing file
#[derive(Debug, Default)]
pub struct SkipResolver;

impl ConflictResolver for SkipResolver {
    fn resolve(&self, _conflict: &FileConflict) -> Resolution {
        Resolution::Skip
    }
}

/// One pending question for an interactive frontend, with its reply channel
pub struct ConflictPrompt {
    pub conflict: FileConflict,
    pub reply: Sender<Resolution>,
}

/// Interactive strategy that marshals each prompt onto another thread.
///
/// The worker sends a `ConflictPrompt` over the channel and blocks until the
/// consumer (a UI event loop, or a test) replies. If the consumer goes away
/// the install aborts rather than guessing.
pub struct ChannelConflictResolver {
    prompts: Mutex<Sender<ConflictPrompt>>,
}

impl ChannelConflictResolver {
    pub fn new() -> (Self, Receiver<ConflictPrompt>) {
        let (tx, rx) = channel();
        (
            Self {
                prompts: Mutex::new(tx),
            },
            rx,
        )
    }
}

impl ConflictResolver for ChannelConflictResolver {
    fn resolve(&self, conflict: &FileConflict) -> Resolution {
        let (reply_tx, reply_rx) = channel();
        let prompt = ConflictPrompt {
            conflict: conflict.clone(),
            reply: reply_tx,
        };
        if self.prompts.lock().unwrap().send(prompt).is_err() {
            warn!(path = %conflict.path.display(), "conflict prompt consumer is gone, aborting install");
            return Resolution::Abort;
        }
        reply_rx.recv().unwrap_or(Resolution::Abort)
    }
}
