//! Workflow engine
//!
//! A `Workflow` is an ordered pipeline of `WorkflowTask`s sharing one logical
//! operation. Workflows are submitted to a `WorkerPool` and observed through
//! `WorkflowListener` callbacks; the submitting caller never blocks on
//! execution.

pub mod engine;
pub mod pool;
pub mod progress;
pub mod task;

pub use engine::Workflow;
pub use pool::{WorkerPool, WorkflowHandle};
pub use progress::{
    CompositeWorkflowListener, IntoWorkflowCallback, NullWorkflowListener, WorkflowCallback,
    WorkflowEvent, WorkflowListener,
};
pub use task::{TaskProgress, WorkflowTask};
