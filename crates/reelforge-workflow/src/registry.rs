//! Concurrent task registry.
//!
//! The registry owns the identifier → task map and the aggregate statistics.
//! A task is inserted before its pipeline starts, and the pipeline mutates that
//! same shared entity, so a failure is visible to [`TaskRegistry::get_task`]
//! before the error reaches the caller of [`TaskRegistry::start_task`].
//!
//! Reads are best-effort progress snapshots: a `get_task` that races with a
//! running pipeline returns the task as of the last completed state change.
//! Stage outputs and state are never observed half-written, but consecutive
//! reads of a running task may differ.
//!
//! The map lock is never held while a task lock is taken.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::WorkflowError;
use crate::models::{TaskContext, TaskId};
use crate::orchestrator::{Orchestrator, SharedTask};
use crate::state::TaskState;

/// Aggregate outcome counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub registered: u64,
    pub delivered: u64,
    pub failed: u64,
    /// Failures keyed by the canonical name of the failing stage.
    pub failures_by_stage: BTreeMap<String, u64>,
}

impl TaskStats {
    /// Percentage of finished tasks that were delivered.
    pub fn success_rate(&self) -> f32 {
        let finished = self.delivered + self.failed;
        if finished == 0 {
            return 0.0;
        }
        (self.delivered as f32 / finished as f32) * 100.0
    }

    /// Tasks registered but not yet delivered or failed.
    pub fn in_flight(&self) -> u64 {
        self.registered
            .saturating_sub(self.delivered)
            .saturating_sub(self.failed)
    }

    fn record_delivered(&mut self) {
        self.delivered += 1;
    }

    fn record_failure(&mut self, stage: TaskState) {
        self.failed += 1;
        *self
            .failures_by_stage
            .entry(stage.as_str().to_string())
            .or_insert(0) += 1;
    }
}

pub struct TaskRegistry {
    orchestrator: Orchestrator,
    tasks: RwLock<HashMap<TaskId, SharedTask>>,
    stats: RwLock<TaskStats>,
}

impl TaskRegistry {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            tasks: RwLock::new(HashMap::new()),
            stats: RwLock::new(TaskStats::default()),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Create a `QUEUED` task and insert it under its identifier.
    pub fn register(&self, persona: impl Into<String>) -> SharedTask {
        let context = self.orchestrator.create_context(persona);
        let task_id = context.task_id.clone();
        let task: SharedTask = Arc::new(RwLock::new(context));

        self.tasks.write().insert(task_id.clone(), Arc::clone(&task));
        self.stats.write().registered += 1;

        tracing::debug!(task_id = %task_id, "Registered task");
        task
    }

    /// Run the pipeline for an already registered task and record the outcome.
    pub fn execute(&self, task: &SharedTask) -> Result<TaskContext, WorkflowError> {
        let outcome = self.orchestrator.run(task);

        match &outcome {
            Ok(_) => self.stats.write().record_delivered(),
            Err(WorkflowError::StageFailed { stage, .. }) => {
                self.stats.write().record_failure(*stage)
            }
            Err(err) => tracing::warn!("Task was not executed: {}", err),
        }
        outcome
    }

    /// Register a task for `persona` and run it to completion on the calling
    /// thread.
    ///
    /// On a stage failure the registered task is already `FAILED` when the
    /// error is returned; look it up with the id carried by the error.
    pub fn start_task(&self, persona: impl Into<String>) -> Result<TaskContext, WorkflowError> {
        let task = self.register(persona);
        self.execute(&task)
    }

    /// Snapshot of the task with the given identifier, or `None` if no such
    /// task was ever registered.
    pub fn get_task(&self, task_id: &str) -> Option<TaskContext> {
        let task = self.tasks.read().get(task_id).cloned()?;
        let snapshot = task.read().clone();
        Some(snapshot)
    }

    /// Snapshots of every task, oldest first.
    pub fn list_tasks(&self) -> Vec<TaskContext> {
        let handles: Vec<SharedTask> = self.tasks.read().values().cloned().collect();
        let mut tasks: Vec<TaskContext> = handles.iter().map(|task| task.read().clone()).collect();
        tasks.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        tasks
    }

    pub fn stats(&self) -> TaskStats {
        self.stats.read().clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new(Orchestrator::default())
    }
}
