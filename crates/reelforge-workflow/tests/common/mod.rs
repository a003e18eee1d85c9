//! Shared agents for the workflow integration tests.

#![allow(dead_code)]

use anyhow::anyhow;
use parking_lot::Mutex;
use reelforge_workflow::{
    AgentResult, AgentSet, AssetAgent, CameraAgent, CameraInstruction, FinalAssets, ScriptAgent,
    ScriptSection, StoryboardShot, SynthesisAgent, TaskContext, TaskState, TimelineAgent,
    TimelineEntry, VisualAsset, VisualPlannerAgent,
};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

/// Fails whichever stage it is plugged into with a fixed message.
pub struct FailingAgent(pub &'static str);

impl FailingAgent {
    fn fail<T>(&self) -> AgentResult<T> {
        Err(anyhow!(self.0))
    }
}

impl ScriptAgent for FailingAgent {
    fn run(&self, _: &TaskContext) -> AgentResult<Vec<ScriptSection>> {
        self.fail()
    }
}

impl VisualPlannerAgent for FailingAgent {
    fn run(&self, _: &TaskContext, _: &[ScriptSection]) -> AgentResult<Vec<StoryboardShot>> {
        self.fail()
    }
}

impl AssetAgent for FailingAgent {
    fn run(&self, _: &TaskContext, _: &[StoryboardShot]) -> AgentResult<Vec<VisualAsset>> {
        self.fail()
    }
}

impl CameraAgent for FailingAgent {
    fn run(&self, _: &TaskContext, _: &[StoryboardShot]) -> AgentResult<Vec<CameraInstruction>> {
        self.fail()
    }
}

impl TimelineAgent for FailingAgent {
    fn run(
        &self,
        _: &TaskContext,
        _: &[StoryboardShot],
        _: &[VisualAsset],
        _: &[CameraInstruction],
    ) -> AgentResult<Vec<TimelineEntry>> {
        self.fail()
    }
}

impl SynthesisAgent for FailingAgent {
    fn run(&self, _: &TaskContext, _: &[TimelineEntry]) -> AgentResult<FinalAssets> {
        self.fail()
    }
}

/// Deterministic agents with the agent for `stage` replaced by a failing one.
pub fn agents_failing_at(stage: TaskState, message: &'static str) -> AgentSet {
    let failing = Arc::new(FailingAgent(message));
    let agents = AgentSet::deterministic();
    match stage {
        TaskState::Scripting => agents.with_script(failing),
        TaskState::VisualPlanning => agents.with_visual_planner(failing),
        TaskState::AssetGeneration => agents.with_asset(failing),
        TaskState::CameraDesign => agents.with_camera(failing),
        TaskState::TimelineBuild => agents.with_timeline(failing),
        TaskState::Synthesizing => agents.with_synthesis(failing),
        other => panic!("{other} is not a working stage"),
    }
}

/// Camera agent that panics instead of returning an error.
pub struct PanickingCamera;

impl CameraAgent for PanickingCamera {
    fn run(&self, _: &TaskContext, _: &[StoryboardShot]) -> AgentResult<Vec<CameraInstruction>> {
        panic!("camera rig exploded");
    }
}

/// Asset agent that reports when it starts and waits for a release signal
/// before delegating to the deterministic asset agent.
pub struct GatedAssetAgent {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl GatedAssetAgent {
    pub fn new(entered: Sender<()>, release: Receiver<()>) -> Self {
        Self {
            entered: Mutex::new(entered),
            release: Mutex::new(release),
        }
    }
}

impl AssetAgent for GatedAssetAgent {
    fn run(
        &self,
        ctx: &TaskContext,
        storyboard: &[StoryboardShot],
    ) -> AgentResult<Vec<VisualAsset>> {
        self.entered.lock().send(())?;
        self.release.lock().recv()?;
        AgentSet::deterministic().asset.run(ctx, storyboard)
    }
}
