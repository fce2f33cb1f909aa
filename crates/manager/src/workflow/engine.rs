//! The workflow pipeline: ordered tasks, aggregate progress, halt on failure

use crate::error::WorkflowError;
use crate::workflow::progress::{IntoWorkflowCallback, WorkflowCallback, WorkflowEvent, WorkflowListener};
use crate::workflow::task::{TaskProgress, WorkflowTask};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tracing::{debug, warn};

/// An ordered pipeline of tasks sharing one logical operation.
///
/// Tasks may be appended before submission only; once running they execute
/// strictly in sequence on the same worker. The first task failure emits
/// exactly one `Failed` event and stops the pipeline; remaining tasks never
/// run. A workflow is executed at most once (`run` consumes it).
pub struct Workflow {
    label: String,
    tasks: Vec<Box<dyn WorkflowTask>>,
    callbacks: Vec<WorkflowCallback>,
}

impl Workflow {
    pub fn new<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            tasks: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn add_task<T: WorkflowTask + 'static>(&mut self, task: T) {
        self.tasks.push(Box::new(task));
    }

    pub fn add_callback(&mut self, callback: WorkflowCallback) {
        self.callbacks.push(callback);
    }

    pub fn add_listener<L: WorkflowListener + 'static>(&mut self, listener: L) {
        self.callbacks.push(listener.into_callback());
    }

    /// Execute every task in order, aggregating progress.
    ///
    /// Each task's workload weight is resolved as the task is scheduled, so
    /// the aggregate target grows monotonically while `completed` never
    /// decreases. Boundary events of non-final tasks are withheld by the
    /// `TaskProgress`, so `completed == total` is reported exactly once, at
    /// success.
    pub async fn run(mut self) -> Result<(), WorkflowError> {
        let label: Arc<str> = Arc::from(self.label.as_str());
        let callbacks = Arc::new(std::mem::take(&mut self.callbacks));
        let completed = Arc::new(AtomicU64::new(0));
        let mut total = 0u64;
        let task_count = self.tasks.len();

        emit(&callbacks, WorkflowEvent::Started {
            label: label.to_string(),
        });
        debug!(workflow = %label, tasks = task_count, "workflow started");

        for (index, mut task) in self.tasks.drain(..).enumerate() {
            let weight = match task.target_progress().await {
                Ok(weight) if weight > 0 => weight,
                Ok(_) => {
                    let error = WorkflowError::InvalidContent {
                        task: task.label().to_string(),
                        reason: "declared a zero workload".to_string(),
                    };
                    fail(&callbacks, &label, &error);
                    return Err(error);
                }
                Err(error) => {
                    fail(&callbacks, &label, &error);
                    return Err(error);
                }
            };
            total += weight;

            let progress = TaskProgress::new(
                label.clone(),
                callbacks.clone(),
                completed.clone(),
                total,
                weight,
                index + 1 == task_count,
            );
            match task.run(&progress).await {
                Ok(()) => progress.finish(),
                Err(error) => {
                    warn!(workflow = %label, task = task.label(), %error, "workflow task failed");
                    fail(&callbacks, &label, &error);
                    return Err(error);
                }
            }
        }

        debug!(workflow = %label, total, "workflow succeeded");
        emit(&callbacks, WorkflowEvent::Succeeded {
            label: label.to_string(),
        });
        Ok(())
    }
}

fn emit(callbacks: &[WorkflowCallback], event: WorkflowEvent) {
    for callback in callbacks {
        callback(event.clone());
    }
}

fn fail(callbacks: &[WorkflowCallback], label: &str, error: &WorkflowError) {
    emit(callbacks, WorkflowEvent::Failed {
        label: label.to_string(),
        error: error.to_string(),
    });
}
