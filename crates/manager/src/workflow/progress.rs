//! Progress and lifecycle reporting for workflows

use std::sync::Arc;

/// Callback invoked inline on the worker thread for every workflow event.
///
/// Callbacks must not block for long; they run in the workflow execution
/// path.
pub type WorkflowCallback = Arc<dyn Fn(WorkflowEvent) + Send + Sync>;

/// Events emitted over the lifetime of a workflow
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    Started {
        label: String,
    },
    /// Aggregate progress; `total` grows as task workloads are resolved and
    /// `completed` is strictly non-decreasing
    Progress {
        label: String,
        completed: u64,
        total: u64,
    },
    Succeeded {
        label: String,
    },
    Failed {
        label: String,
        error: String,
    },
}

/// Trait for progress reporting with more granular control
pub trait WorkflowListener: Send + Sync {
    fn on_started(&self, _label: &str) {}
    fn on_progress(&self, _label: &str, _completed: u64, _total: u64) {}
    fn on_succeeded(&self, _label: &str) {}
    fn on_failed(&self, _label: &str, _error: &str) {}
}

/// Extension trait to convert a WorkflowListener into a WorkflowCallback
pub trait IntoWorkflowCallback {
    fn into_callback(self) -> WorkflowCallback;
}

impl<T: WorkflowListener + 'static> IntoWorkflowCallback for T {
    fn into_callback(self) -> WorkflowCallback {
        Arc::new(move |event| match event {
            WorkflowEvent::Started { label } => self.on_started(&label),
            WorkflowEvent::Progress {
                label,
                completed,
                total,
            } => self.on_progress(&label, completed, total),
            WorkflowEvent::Succeeded { label } => self.on_succeeded(&label),
            WorkflowEvent::Failed { label, error } => self.on_failed(&label, &error),
        })
    }
}

/// Listener that does nothing
#[derive(Debug, Default)]
pub struct NullWorkflowListener;

impl WorkflowListener for NullWorkflowListener {}

/// Listener that forwards events to multiple listeners in order
pub struct CompositeWorkflowListener {
    listeners: Vec<Box<dyn WorkflowListener>>,
}

impl CompositeWorkflowListener {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<L: WorkflowListener + 'static>(mut self, listener: L) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }
}

impl Default for CompositeWorkflowListener {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowListener for CompositeWorkflowListener {
    fn on_started(&self, label: &str) {
        for listener in &self.listeners {
            listener.on_started(label);
        }
    }

    fn on_progress(&self, label: &str, completed: u64, total: u64) {
        for listener in &self.listeners {
            listener.on_progress(label, completed, total);
        }
    }

    fn on_succeeded(&self, label: &str) {
        for listener in &self.listeners {
            listener.on_succeeded(label);
        }
    }

    fn on_failed(&self, label: &str, error: &str) {
        for listener in &self.listeners {
            listener.on_failed(label, error);
        }
    }
}
