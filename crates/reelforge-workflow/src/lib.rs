//! Reelforge-Workflow: the pipeline orchestration core.
//!
//! A persona string goes in; six agents run in a fixed order and each writes
//! one output collection onto the task:
//!
//! - **State machine**: [`TaskState`] and its legal transitions
//! - **Task entity**: [`TaskContext`] and the per-stage records
//! - **Agents**: one trait per stage, bundled in an [`AgentSet`]
//! - **Orchestrator**: sequences the stages and contains failures
//! - **Registry**: concurrent identifier → task map with statistics
//! - **View**: plain JSON structure of a task for any transport
//!
//! # Examples
//!
//! ```
//! use reelforge_workflow::{AgentSet, Orchestrator, TaskRegistry, TaskState};
//!
//! let registry = TaskRegistry::new(Orchestrator::new(AgentSet::deterministic()));
//! let task = registry.start_task("Ada Lovelace").unwrap();
//! assert_eq!(task.state, TaskState::Delivered);
//! assert_eq!(task.script.len(), 3);
//!
//! let stored = registry.get_task(task.task_id.as_str()).unwrap();
//! assert_eq!(stored.to_view().unwrap()["state"], "DELIVERED");
//! ```

pub mod agents;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod registry;
pub mod state;
pub mod view;

pub use agents::{
    AgentResult, AgentSet, AssetAgent, CameraAgent, ScriptAgent, SynthesisAgent, TimelineAgent,
    VisualPlannerAgent,
};
pub use error::{StateParseError, TransitionError, ViewError, WorkflowError};
pub use models::*;
pub use orchestrator::{Orchestrator, SharedTask};
pub use registry::{TaskRegistry, TaskStats};
pub use state::TaskState;
