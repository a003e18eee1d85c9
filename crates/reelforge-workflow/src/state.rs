//! Task lifecycle states and the legal transitions between them.
//!
//! A task walks the six working stages strictly in order:
//!
//! ```text
//! QUEUED -> SCRIPTING -> VISUAL_PLANNING -> ASSET_GENERATION -> CAMERA_DESIGN
//!        -> TIMELINE_BUILD -> SYNTHESIZING -> DELIVERED
//! ```
//!
//! `FAILED` is reachable from every non-terminal state. `DELIVERED` and
//! `FAILED` are terminal: nothing leaves them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{StateParseError, TransitionError};

/// Lifecycle state of a generation task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    #[default]
    Queued,
    Scripting,
    VisualPlanning,
    AssetGeneration,
    CameraDesign,
    TimelineBuild,
    Synthesizing,
    Delivered,
    Failed,
}

impl TaskState {
    /// The six working stages, in execution order.
    pub const STAGES: [TaskState; 6] = [
        TaskState::Scripting,
        TaskState::VisualPlanning,
        TaskState::AssetGeneration,
        TaskState::CameraDesign,
        TaskState::TimelineBuild,
        TaskState::Synthesizing,
    ];

    /// Every state, in forward order with `Failed` last.
    pub const ALL: [TaskState; 9] = [
        TaskState::Queued,
        TaskState::Scripting,
        TaskState::VisualPlanning,
        TaskState::AssetGeneration,
        TaskState::CameraDesign,
        TaskState::TimelineBuild,
        TaskState::Synthesizing,
        TaskState::Delivered,
        TaskState::Failed,
    ];

    /// Canonical wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Queued => "QUEUED",
            TaskState::Scripting => "SCRIPTING",
            TaskState::VisualPlanning => "VISUAL_PLANNING",
            TaskState::AssetGeneration => "ASSET_GENERATION",
            TaskState::CameraDesign => "CAMERA_DESIGN",
            TaskState::TimelineBuild => "TIMELINE_BUILD",
            TaskState::Synthesizing => "SYNTHESIZING",
            TaskState::Delivered => "DELIVERED",
            TaskState::Failed => "FAILED",
        }
    }

    /// Short human label of the stage this state represents, if it is one of
    /// the six working stages.
    pub fn stage_label(&self) -> Option<&'static str> {
        match self {
            TaskState::Scripting => Some("script"),
            TaskState::VisualPlanning => Some("visual plan"),
            TaskState::AssetGeneration => Some("asset"),
            TaskState::CameraDesign => Some("camera"),
            TaskState::TimelineBuild => Some("timeline"),
            TaskState::Synthesizing => Some("synthesis"),
            TaskState::Queued | TaskState::Delivered | TaskState::Failed => None,
        }
    }

    /// Returns `true` for states with no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Delivered | TaskState::Failed)
    }

    /// Returns `true` while one of the six stages is executing.
    pub fn is_working(&self) -> bool {
        self.stage_label().is_some()
    }

    /// The forward successor of this state.
    pub fn next(&self) -> Option<TaskState> {
        match self {
            TaskState::Queued => Some(TaskState::Scripting),
            TaskState::Scripting => Some(TaskState::VisualPlanning),
            TaskState::VisualPlanning => Some(TaskState::AssetGeneration),
            TaskState::AssetGeneration => Some(TaskState::CameraDesign),
            TaskState::CameraDesign => Some(TaskState::TimelineBuild),
            TaskState::TimelineBuild => Some(TaskState::Synthesizing),
            TaskState::Synthesizing => Some(TaskState::Delivered),
            TaskState::Delivered | TaskState::Failed => None,
        }
    }

    pub fn can_transition_to(&self, target: TaskState) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == TaskState::Failed || self.next() == Some(target)
    }

    /// Validate a transition, returning the error to report when it is
    /// illegal.
    pub fn check_transition(&self, target: TaskState) -> Result<(), TransitionError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(TransitionError {
                from: *self,
                to: target,
            })
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = StateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| StateParseError(s.to_string()))
    }
}
