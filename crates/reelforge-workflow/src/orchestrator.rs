//! Sequences the six stages of a task against an [`AgentSet`].
//!
//! Each stage is an explicit enter / invoke / commit-or-fail block:
//!
//! 1. under a short write lock the task advances to the stage state and a
//!    snapshot is taken;
//! 2. the agent runs on the snapshot with no lock held, so readers can observe
//!    the task while a slow agent is working;
//! 3. under a second write lock the output is committed, or the task is marked
//!    `FAILED` with a message naming the stage and cause.
//!
//! A panic inside an agent is caught and handled exactly like an error.
//! Nothing is retried and no stage runs after a failure.

use anyhow::anyhow;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crate::agents::AgentSet;
use crate::error::WorkflowError;
use crate::models::{TaskContext, TaskId};
use crate::state::TaskState;

/// A task entity shared between the run that mutates it and any readers.
///
/// Only the owning [`Orchestrator::run`] call writes to it. Readers take
/// snapshot clones and may see the task between two stages.
pub type SharedTask = Arc<RwLock<TaskContext>>;

pub struct Orchestrator {
    agents: AgentSet,
}

impl Orchestrator {
    pub fn new(agents: AgentSet) -> Self {
        Self { agents }
    }

    pub fn agents(&self) -> &AgentSet {
        &self.agents
    }

    /// Create a fresh `QUEUED` task with a newly generated identifier.
    pub fn create_context(&self, persona: impl Into<String>) -> TaskContext {
        TaskContext::new(TaskId::generate(), persona)
    }

    /// Run every stage against `task`, mutating it in place.
    ///
    /// Returns a snapshot of the delivered task. On a stage failure the shared
    /// task is already `FAILED`, with all outputs of earlier stages intact,
    /// before [`WorkflowError::StageFailed`] is returned.
    pub fn run(&self, task: &SharedTask) -> Result<TaskContext, WorkflowError> {
        let task_id = {
            let current = task.read();
            if current.state != TaskState::Queued {
                return Err(WorkflowError::NotRunnable {
                    task_id: current.task_id.clone(),
                    state: current.state,
                });
            }
            current.task_id.clone()
        };

        tracing::info!(task_id = %task_id, "Starting pipeline");
        let started = Instant::now();
        let agents = &self.agents;

        self.stage(
            task,
            TaskState::Scripting,
            |ctx| agents.script.run(ctx),
            |ctx, script| ctx.script = script,
        )?;
        self.stage(
            task,
            TaskState::VisualPlanning,
            |ctx| agents.visual_planner.run(ctx, &ctx.script),
            |ctx, storyboard| ctx.storyboard = storyboard,
        )?;
        self.stage(
            task,
            TaskState::AssetGeneration,
            |ctx| agents.asset.run(ctx, &ctx.storyboard),
            |ctx, assets| ctx.assets = assets,
        )?;
        self.stage(
            task,
            TaskState::CameraDesign,
            |ctx| agents.camera.run(ctx, &ctx.storyboard),
            |ctx, camera_plan| ctx.camera_plan = camera_plan,
        )?;
        self.stage(
            task,
            TaskState::TimelineBuild,
            |ctx| {
                agents
                    .timeline
                    .run(ctx, &ctx.storyboard, &ctx.assets, &ctx.camera_plan)
            },
            |ctx, timeline| ctx.timeline = timeline,
        )?;
        self.stage(
            task,
            TaskState::Synthesizing,
            |ctx| agents.synthesis.run(ctx, &ctx.timeline),
            |ctx, final_assets| ctx.final_assets = Some(final_assets),
        )?;

        let delivered = {
            let mut current = task.write();
            current.advance(TaskState::Delivered)?;
            current.clone()
        };
        tracing::info!(
            task_id = %task_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline delivered"
        );
        Ok(delivered)
    }

    fn stage<T, I, C>(
        &self,
        task: &SharedTask,
        stage: TaskState,
        invoke: I,
        commit: C,
    ) -> Result<(), WorkflowError>
    where
        I: FnOnce(&TaskContext) -> anyhow::Result<T>,
        C: FnOnce(&mut TaskContext, T),
    {
        let snapshot = {
            let mut current = task.write();
            current.advance(stage)?;
            current.clone()
        };
        let task_id = snapshot.task_id.clone();
        let label = stage.stage_label().unwrap_or(stage.as_str());

        tracing::debug!(
            task_id = %task_id,
            stage = %stage,
            "Entering {} stage",
            label
        );
        let started = Instant::now();

        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| invoke(&snapshot))).unwrap_or_else(|payload| {
                Err(anyhow!("agent panicked: {}", panic_message(&*payload)))
            });

        match outcome {
            Ok(output) => {
                let mut current = task.write();
                commit(&mut current, output);
                drop(current);
                tracing::info!(
                    task_id = %task_id,
                    stage = %stage,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Completed {} stage",
                    label
                );
                Ok(())
            }
            Err(err) => {
                let cause = format!("{err:#}");
                task.write().fail(format!("Step {stage} failed: {cause}"))?;
                tracing::error!(task_id = %task_id, stage = %stage, "Stage failed: {}", cause);
                Err(WorkflowError::StageFailed {
                    task_id,
                    stage,
                    cause,
                    source: err.into(),
                })
            }
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(AgentSet::deterministic())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
