//! Error types for the orchestration core.
//!
//! Two failure families exist: a stage failure, raised by [`Orchestrator::run`]
//! and also recorded on the task itself, and a lookup miss, which is reported as
//! `None` by the registry rather than as an error.
//!
//! [`Orchestrator::run`]: crate::Orchestrator::run

use crate::models::TaskId;
use crate::state::TaskState;

/// An attempted state change that the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Illegal task state transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: TaskState,
    pub to: TaskState,
}

/// A state name that is not one of the canonical names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task state: {0}")]
pub struct StateParseError(pub String);

/// Failure raised by a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// An agent failed while executing one of the six stages. The task has
    /// already been marked `FAILED` when this is returned.
    #[error("Step {stage} failed: {cause}")]
    StageFailed {
        task_id: TaskId,
        stage: TaskState,
        /// The agent's error rendered with its full cause chain.
        cause: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The task was not in `QUEUED` when a run was requested.
    #[error("Task {task_id} cannot be run from state {state}")]
    NotRunnable { task_id: TaskId, state: TaskState },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl WorkflowError {
    /// The stage that failed, if this is a stage failure.
    pub fn stage(&self) -> Option<TaskState> {
        match self {
            WorkflowError::StageFailed { stage, .. } => Some(*stage),
            WorkflowError::NotRunnable { .. } | WorkflowError::Transition(_) => None,
        }
    }

    /// The task the error belongs to, when known.
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            WorkflowError::StageFailed { task_id, .. }
            | WorkflowError::NotRunnable { task_id, .. } => Some(task_id),
            WorkflowError::Transition(_) => None,
        }
    }
}

/// Failure converting a task to or from its plain-structure view.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Invalid task view: {0}")]
    Json(#[from] serde_json::Error),
}
