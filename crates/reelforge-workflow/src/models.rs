//! Data model threaded through every stage of the generation workflow.
//!
//! [`TaskContext`] is the task entity. Each stage writes one output collection
//! onto it; the records in those collections are correlated only through their
//! shared `shot_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::error::TransitionError;
use crate::state::TaskState;
use crate::view::seconds;

/// Opaque, registry-unique task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh identifier: a random v4 UUID rendered as 32 lowercase
    /// hex characters.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Stage records
// ---------------------------------------------------------------------------

/// A segment of the script with its temporal context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSection {
    pub section: String,
    pub timeframe: String,
    pub summary: String,
    #[serde(default)]
    pub citations: Vec<String>,
}

/// A single storyboard shot produced by the visual planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardShot {
    pub shot_id: String,
    #[serde(with = "seconds")]
    pub start: Duration,
    #[serde(with = "seconds")]
    pub duration: Duration,
    pub scene: String,
    pub mood: String,
    pub subtitle: String,
}

/// A generated or retrieved visual for one shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualAsset {
    pub shot_id: String,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub asset_uri: Option<String>,
    #[serde(default)]
    pub confidence: f64,
}

/// How the camera moves during one shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInstruction {
    pub shot_id: String,
    pub motion_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub transition: Option<String>,
}

/// A visual or audio layer placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineLayer {
    #[serde(rename = "type")]
    pub kind: String,
    pub reference: String,
    #[serde(with = "seconds")]
    pub start: Duration,
    #[serde(with = "seconds")]
    pub duration: Duration,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// An audio cue such as narration or music placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineCue {
    pub cue_type: String,
    pub reference: String,
    #[serde(with = "seconds")]
    pub start: Duration,
    #[serde(with = "seconds")]
    pub duration: Duration,
}

/// Layers and cues for one shot. Owns both lists outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub shot_id: String,
    #[serde(default)]
    pub layers: Vec<TimelineLayer>,
    #[serde(default)]
    pub audio_cues: Vec<TimelineCue>,
}

/// Locations of the synthesized deliverables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalAssets {
    #[serde(default)]
    pub video_uri: Option<String>,
    #[serde(default)]
    pub audio_uri: Option<String>,
    #[serde(default)]
    pub subtitles_uri: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Task entity
// ---------------------------------------------------------------------------

/// Identity, lifecycle state and accumulated stage outputs of one pipeline
/// run.
///
/// Outputs written by a stage are kept when a later stage fails; only the
/// failing stage and the ones after it stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    pub task_id: TaskId,
    pub persona: String,
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub script: Vec<ScriptSection>,
    #[serde(default)]
    pub storyboard: Vec<StoryboardShot>,
    #[serde(default)]
    pub assets: Vec<VisualAsset>,
    #[serde(default)]
    pub camera_plan: Vec<CameraInstruction>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub final_assets: Option<FinalAssets>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskContext {
    /// A fresh task in `QUEUED` with every output collection empty.
    pub fn new(task_id: TaskId, persona: impl Into<String>) -> Self {
        Self {
            task_id,
            persona: persona.into(),
            state: TaskState::Queued,
            error: None,
            script: Vec::new(),
            storyboard: Vec::new(),
            assets: Vec::new(),
            camera_plan: Vec::new(),
            timeline: Vec::new(),
            final_assets: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Move to `state`, clearing any previously recorded error. Stage outputs
    /// are left alone.
    pub fn advance(&mut self, state: TaskState) -> Result<(), TransitionError> {
        self.state.check_transition(state)?;
        self.state = state;
        self.error = None;

        if self.started_at.is_none() && state.is_working() {
            self.started_at = Some(Utc::now());
        }
        if state == TaskState::Delivered {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Mark the task as failed with an explanatory message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.state.check_transition(TaskState::Failed)?;
        self.state = TaskState::Failed;
        self.error = Some(message.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Wall-clock time between the first stage starting and the task reaching
    /// a terminal state.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.completed_at? - self.started_at?)
    }
}
