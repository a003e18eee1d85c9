//! Agent traits, one per pipeline stage.
//!
//! The orchestrator depends only on these signatures. Every agent receives a
//! snapshot of the task plus the outputs of the stages it builds on and returns
//! its own stage output. Implementations may call external services or be fully
//! deterministic; the orchestrator cannot tell the difference.
//!
//! Agents are synchronous and may block for as long as the underlying service
//! takes. No timeout is applied at this boundary, so an agent that never
//! returns blocks its task indefinitely.

mod deterministic;

pub use deterministic::{
    DeterministicAssetAgent, DeterministicCameraAgent, DeterministicScriptAgent,
    DeterministicSynthesisAgent, DeterministicTimelineAgent, DeterministicVisualPlannerAgent,
};

use std::fmt;
use std::sync::Arc;

use crate::models::{
    CameraInstruction, FinalAssets, ScriptSection, StoryboardShot, TaskContext, TimelineEntry,
    VisualAsset,
};

/// Result type returned by every agent.
pub type AgentResult<T> = anyhow::Result<T>;

/// Generates the narrative sections for the persona.
pub trait ScriptAgent: Send + Sync {
    fn run(&self, context: &TaskContext) -> AgentResult<Vec<ScriptSection>>;
}

/// Turns the script into storyboard shots.
pub trait VisualPlannerAgent: Send + Sync {
    fn run(
        &self,
        context: &TaskContext,
        script: &[ScriptSection],
    ) -> AgentResult<Vec<StoryboardShot>>;
}

/// Produces a visual asset (or prompt) for each storyboard shot.
pub trait AssetAgent: Send + Sync {
    fn run(
        &self,
        context: &TaskContext,
        storyboard: &[StoryboardShot],
    ) -> AgentResult<Vec<VisualAsset>>;
}

/// Designs the camera motion for each storyboard shot.
pub trait CameraAgent: Send + Sync {
    fn run(
        &self,
        context: &TaskContext,
        storyboard: &[StoryboardShot],
    ) -> AgentResult<Vec<CameraInstruction>>;
}

/// Assembles timeline layers from the storyboard, assets and camera plan.
pub trait TimelineAgent: Send + Sync {
    fn run(
        &self,
        context: &TaskContext,
        storyboard: &[StoryboardShot],
        assets: &[VisualAsset],
        camera_plan: &[CameraInstruction],
    ) -> AgentResult<Vec<TimelineEntry>>;
}

/// Produces the final deliverables from the timeline.
pub trait SynthesisAgent: Send + Sync {
    fn run(&self, context: &TaskContext, timeline: &[TimelineEntry]) -> AgentResult<FinalAssets>;
}

/// One agent per stage, chosen once when the orchestrator is built.
#[derive(Clone)]
pub struct AgentSet {
    pub script: Arc<dyn ScriptAgent>,
    pub visual_planner: Arc<dyn VisualPlannerAgent>,
    pub asset: Arc<dyn AssetAgent>,
    pub camera: Arc<dyn CameraAgent>,
    pub timeline: Arc<dyn TimelineAgent>,
    pub synthesis: Arc<dyn SynthesisAgent>,
}

impl AgentSet {
    /// The deterministic agents used for local development and tests.
    pub fn deterministic() -> Self {
        Self {
            script: Arc::new(DeterministicScriptAgent),
            visual_planner: Arc::new(DeterministicVisualPlannerAgent),
            asset: Arc::new(DeterministicAssetAgent),
            camera: Arc::new(DeterministicCameraAgent),
            timeline: Arc::new(DeterministicTimelineAgent),
            synthesis: Arc::new(DeterministicSynthesisAgent),
        }
    }

    pub fn with_script(mut self, agent: Arc<dyn ScriptAgent>) -> Self {
        self.script = agent;
        self
    }

    pub fn with_visual_planner(mut self, agent: Arc<dyn VisualPlannerAgent>) -> Self {
        self.visual_planner = agent;
        self
    }

    pub fn with_asset(mut self, agent: Arc<dyn AssetAgent>) -> Self {
        self.asset = agent;
        self
    }

    pub fn with_camera(mut self, agent: Arc<dyn CameraAgent>) -> Self {
        self.camera = agent;
        self
    }

    pub fn with_timeline(mut self, agent: Arc<dyn TimelineAgent>) -> Self {
        self.timeline = agent;
        self
    }

    pub fn with_synthesis(mut self, agent: Arc<dyn SynthesisAgent>) -> Self {
        self.synthesis = agent;
        self
    }
}

impl Default for AgentSet {
    fn default() -> Self {
        Self::deterministic()
    }
}

impl fmt::Debug for AgentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSet").finish_non_exhaustive()
    }
}
