//! Bounded worker pools with explicit queues and completion channels

use crate::error::{ModError, WorkflowError};
use crate::workflow::engine::Workflow;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Typed envelope travelling through a pool's work queue
struct WorkflowEnvelope {
    workflow: Workflow,
    done: oneshot::Sender<Result<(), WorkflowError>>,
}

/// Completion channel for one submitted workflow.
///
/// Dropping the handle is fire-and-forget; awaiting it observes the terminal
/// state. If the pool shuts down before the workflow runs, the handle
/// resolves to `WorkflowError::Canceled`.
pub struct WorkflowHandle {
    rx: oneshot::Receiver<Result<(), WorkflowError>>,
}

impl WorkflowHandle {
    pub async fn wait(self) -> Result<(), WorkflowError> {
        self.rx.await.unwrap_or(Err(WorkflowError::Canceled))
    }
}

/// A fixed-width pool of workers draining a bounded work queue.
///
/// Workflows run to completion on one worker; `submit` only enqueues and
/// applies backpressure when the queue is full. A width of 1 serializes all
/// submitted workflows, which is how file-system-mutating operations obtain
/// mutual exclusion.
pub struct WorkerPool {
    name: String,
    tx: mpsc::Sender<WorkflowEnvelope>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(name: &str, width: usize, queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel::<WorkflowEnvelope>(queue_depth.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..width.max(1))
            .map(|worker| {
                let rx = rx.clone();
                let pool = name.to_string();
                tokio::spawn(async move {
                    loop {
                        // Hold the queue lock only while waiting for work
                        let envelope = { rx.lock().await.recv().await };
                        let Some(envelope) = envelope else { break };

                        debug!(pool = %pool, worker, workflow = envelope.workflow.label(), "running workflow");
                        let result = envelope.workflow.run().await;
                        // Receiver may have been dropped (fire-and-forget)
                        let _ = envelope.done.send(result);
                    }
                    debug!(pool = %pool, worker, "worker stopped");
                })
            })
            .collect();

        Self {
            name: name.to_string(),
            tx,
            workers,
        }
    }

    /// Enqueue a workflow, awaiting queue capacity if the pool is saturated
    pub async fn submit(&self, workflow: Workflow) -> Result<WorkflowHandle, ModError> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(WorkflowEnvelope { workflow, done })
            .await
            .map_err(|_| {
                warn!(pool = %self.name, "submit to closed pool");
                ModError::PoolClosed
            })?;
        Ok(WorkflowHandle { rx })
    }

    /// Close the queue and wait for in-flight workflows to finish
    pub async fn shutdown(self) {
        drop(self.tx);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::task::{TaskProgress, WorkflowTask};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Task that records how many of its peers run at the same instant
    struct GaugeTask {
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WorkflowTask for GaugeTask {
        fn label(&self) -> &str {
            "gauge"
        }

        async fn target_progress(&mut self) -> Result<u64, WorkflowError> {
            Ok(1)
        }

        async fn run(&mut self, _progress: &TaskProgress) -> Result<(), WorkflowError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_pool_width() {
        let pool = WorkerPool::new("downloads", 3, 16);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let mut workflow = Workflow::new(format!("Downloading {i}"));
            workflow.add_task(GaugeTask {
                running: running.clone(),
                peak: peak.clone(),
            });
            handles.push(pool.submit(workflow).await.unwrap());
        }
        for handle in handles {
            handle.wait().await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn single_width_pool_serializes_workflows() {
        let pool = WorkerPool::new("enabler", 1, 16);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..4 {
            let mut workflow = Workflow::new(format!("Enabling {i}"));
            workflow.add_task(GaugeTask {
                running: running.clone(),
                peak: peak.clone(),
            });
            handles.push(pool.submit(workflow).await.unwrap());
        }
        for handle in handles {
            handle.wait().await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn handle_resolves_canceled_when_pool_drops_queued_work() {
        let pool = WorkerPool::new("downloads", 1, 1);
        // Occupy the single worker long enough to leave one envelope queued
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut blocker = Workflow::new("Blocker");
        blocker.add_task(GaugeTask {
            running: running.clone(),
            peak: peak.clone(),
        });
        let first = pool.submit(blocker).await.unwrap();

        let mut queued = Workflow::new("Queued");
        queued.add_task(GaugeTask {
            running: running.clone(),
            peak: peak.clone(),
        });
        let second = pool.submit(queued).await.unwrap();

        first.wait().await.unwrap();
        // Shut down while the second workflow may still be queued; it either
        // ran to completion or was dropped with a Canceled terminal state.
        pool.shutdown().await;
        match second.wait().await {
            Ok(()) | Err(WorkflowError::Canceled) => {}
            Err(other) => panic!("unexpected terminal state: {other}"),
        }
    }
}
