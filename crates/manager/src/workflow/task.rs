//! Task abstraction: one atomic step of a workflow

use crate::error::WorkflowError;
use crate::workflow::progress::{WorkflowCallback, WorkflowEvent};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A single unit of work inside a workflow.
///
/// Tasks declare a positive workload weight immediately before they run and
/// report incremental progress through the `TaskProgress` handed to `run`.
/// Tasks hold `Arc` references to the shared collaborators they need; they do
/// not own those resources and are never retried internally.
#[async_trait]
pub trait WorkflowTask: Send {
    fn label(&self) -> &str;

    /// Workload weight for proportional progress display, evaluated once
    /// right before the task is scheduled. Tasks that cannot determine their
    /// workload fail with `WorkflowError::InvalidContent`.
    async fn target_progress(&mut self) -> Result<u64, WorkflowError>;

    async fn run(&mut self, progress: &TaskProgress) -> Result<(), WorkflowError>;
}

/// Per-task progress reporter shared with the owning workflow.
///
/// Ticks are clamped to the task's declared weight, so a chatty task can
/// never push the aggregate past its budget; the workflow tops up whatever
/// the task did not tick when the task succeeds. The aggregate total keeps
/// growing until the final task is scheduled, so only the final task is
/// allowed to report `completed == total`; a non-final task's boundary
/// units are withheld and surface with the next task's enlarged total.
#[derive(Clone)]
pub struct TaskProgress {
    label: Arc<str>,
    callbacks: Arc<Vec<WorkflowCallback>>,
    completed: Arc<AtomicU64>,
    total: u64,
    budget: u64,
    last: bool,
    ticked: Arc<AtomicU64>,
}

impl TaskProgress {
    pub(crate) fn new(
        label: Arc<str>,
        callbacks: Arc<Vec<WorkflowCallback>>,
        completed: Arc<AtomicU64>,
        total: u64,
        budget: u64,
        last: bool,
    ) -> Self {
        Self {
            label,
            callbacks,
            completed,
            total,
            budget,
            last,
            ticked: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance this task's progress by `units`, clamped to its weight
    pub fn tick(&self, units: u64) {
        let already = self.ticked.load(Ordering::Acquire);
        let allowed = self.budget.saturating_sub(already).min(units);
        if allowed == 0 {
            return;
        }
        self.ticked.fetch_add(allowed, Ordering::AcqRel);
        let done = self.completed.fetch_add(allowed, Ordering::AcqRel) + allowed;
        // A boundary event from a non-final task would falsely report the
        // workflow as complete; the units still count, silently
        if done == self.total && !self.last {
            return;
        }
        self.emit(done);
    }

    /// Top up whatever the task did not tick; called by the workflow on
    /// task success
    pub(crate) fn finish(&self) {
        let remaining = self.budget.saturating_sub(self.ticked.load(Ordering::Acquire));
        if remaining > 0 {
            self.tick(remaining);
        }
    }

    fn emit(&self, completed: u64) {
        for callback in self.callbacks.iter() {
            callback(WorkflowEvent::Progress {
                label: self.label.to_string(),
                completed,
                total: self.total,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn capture() -> (Arc<Mutex<Vec<(u64, u64)>>>, Arc<Vec<WorkflowCallback>>) {
        let events: Arc<Mutex<Vec<(u64, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let callback: WorkflowCallback = Arc::new(move |event| {
            if let WorkflowEvent::Progress {
                completed, total, ..
            } = event
            {
                sink.lock().unwrap().push((completed, total));
            }
        });
        (events, Arc::new(vec![callback]))
    }

    #[test]
    fn ticks_are_clamped_to_the_budget() {
        let (events, callbacks) = capture();
        let completed = Arc::new(AtomicU64::new(0));
        let progress = TaskProgress::new("test".into(), callbacks, completed.clone(), 10, 3, true);

        progress.tick(2);
        progress.tick(5); // only 1 unit left in the budget
        progress.tick(1); // exhausted, no event

        assert_eq!(completed.load(Ordering::Acquire), 3);
        assert_eq!(*events.lock().unwrap(), vec![(2, 10), (3, 10)]);
    }

    #[test]
    fn finish_tops_up_unticked_units_once() {
        let (events, callbacks) = capture();
        let completed = Arc::new(AtomicU64::new(4));
        let progress = TaskProgress::new("test".into(), callbacks, completed.clone(), 9, 5, true);

        progress.tick(1);
        progress.finish();
        progress.finish(); // idempotent

        assert_eq!(completed.load(Ordering::Acquire), 9);
        assert_eq!(*events.lock().unwrap(), vec![(5, 9), (9, 9)]);
    }

    #[test]
    fn non_final_task_boundary_is_counted_but_not_reported() {
        let (events, callbacks) = capture();
        let completed = Arc::new(AtomicU64::new(2));
        let progress = TaskProgress::new("test".into(), callbacks, completed.clone(), 5, 3, false);

        progress.tick(1); // below the boundary, visible
        progress.finish(); // lands on the boundary, withheld

        assert_eq!(completed.load(Ordering::Acquire), 5);
        assert_eq!(*events.lock().unwrap(), vec![(3, 5)]);
    }
}
