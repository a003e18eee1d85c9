//! Deterministic agents for local development and testing.
//!
//! They never fail and never touch the network. Given any persona they produce
//! a three-section script and one shot, asset, camera instruction and timeline
//! entry per section, all keyed by `shot_<n>`.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;

use super::{
    AgentResult, AssetAgent, CameraAgent, ScriptAgent, SynthesisAgent, TimelineAgent,
    VisualPlannerAgent,
};
use crate::models::{
    CameraInstruction, FinalAssets, ScriptSection, StoryboardShot, TaskContext, TimelineCue,
    TimelineEntry, TimelineLayer, VisualAsset,
};

const SECONDS_PER_SECTION: u64 = 40;
const CAMERA_MOTIONS: [&str; 3] = ["slow_zoom_in", "pan_right", "ken_burns"];

pub struct DeterministicScriptAgent;

impl ScriptAgent for DeterministicScriptAgent {
    fn run(&self, context: &TaskContext) -> AgentResult<Vec<ScriptSection>> {
        let persona = &context.persona;
        Ok(vec![
            ScriptSection {
                section: "introduction".into(),
                timeframe: "birth and early years".into(),
                summary: format!(
                    "The life of {persona} was remarkable; we begin with the years of learning and growth."
                ),
                citations: vec!["encyclopedia:overview".into()],
            },
            ScriptSection {
                section: "turning_point".into(),
                timeframe: "defining events".into(),
                summary: format!(
                    "At the height of their career, {persona} made a decision that changed history."
                ),
                citations: vec!["chronicle:milestone".into()],
            },
            ScriptSection {
                section: "legacy".into(),
                timeframe: "influence and legacy".into(),
                summary: format!("Today the story of {persona} still offers lessons and inspiration."),
                citations: vec!["analysis:legacy".into()],
            },
        ])
    }
}

/// Maps each script section to an equally long, back-to-back shot.
pub struct DeterministicVisualPlannerAgent;

impl VisualPlannerAgent for DeterministicVisualPlannerAgent {
    fn run(
        &self,
        context: &TaskContext,
        script: &[ScriptSection],
    ) -> AgentResult<Vec<StoryboardShot>> {
        let shot_length = Duration::from_secs(SECONDS_PER_SECTION);
        Ok(script
            .iter()
            .enumerate()
            .map(|(index, section)| StoryboardShot {
                shot_id: format!("shot_{}", index + 1),
                start: shot_length * index as u32,
                duration: shot_length,
                scene: format!(
                    "Visualise the {} with scenes from the life of {}",
                    section.section, context.persona
                ),
                mood: if index == 1 { "dramatic" } else { "reflective" }.into(),
                subtitle: section.summary.clone(),
            })
            .collect())
    }
}

/// Returns a placeholder prompt for each shot without rendering anything.
pub struct DeterministicAssetAgent;

impl AssetAgent for DeterministicAssetAgent {
    fn run(
        &self,
        context: &TaskContext,
        storyboard: &[StoryboardShot],
    ) -> AgentResult<Vec<VisualAsset>> {
        Ok(storyboard
            .iter()
            .map(|shot| VisualAsset {
                shot_id: shot.shot_id.clone(),
                prompt: format!("Oil painting of {}: {}", context.persona, shot.scene),
                negative_prompt: Some("avoid modern elements".into()),
                asset_uri: None,
                confidence: 0.2,
            })
            .collect())
    }
}

pub struct DeterministicCameraAgent;

impl CameraAgent for DeterministicCameraAgent {
    fn run(
        &self,
        _context: &TaskContext,
        storyboard: &[StoryboardShot],
    ) -> AgentResult<Vec<CameraInstruction>> {
        Ok(storyboard
            .iter()
            .enumerate()
            .map(|(index, shot)| {
                let mut params = Map::new();
                params.insert("speed".into(), json!(0.5));
                params.insert("easing".into(), json!("ease_in_out"));
                CameraInstruction {
                    shot_id: shot.shot_id.clone(),
                    motion_type: CAMERA_MOTIONS[index % CAMERA_MOTIONS.len()].into(),
                    params,
                    transition: (index > 0).then(|| "crossfade".to_string()),
                }
            })
            .collect())
    }
}

/// Merges storyboard, assets and camera plan into one entry per shot.
pub struct DeterministicTimelineAgent;

impl TimelineAgent for DeterministicTimelineAgent {
    fn run(
        &self,
        _context: &TaskContext,
        storyboard: &[StoryboardShot],
        assets: &[VisualAsset],
        camera_plan: &[CameraInstruction],
    ) -> AgentResult<Vec<TimelineEntry>> {
        let assets_by_shot: HashMap<&str, &VisualAsset> = assets
            .iter()
            .map(|asset| (asset.shot_id.as_str(), asset))
            .collect();
        let camera_by_shot: HashMap<&str, &CameraInstruction> = camera_plan
            .iter()
            .map(|instruction| (instruction.shot_id.as_str(), instruction))
            .collect();

        let mut entries = Vec::with_capacity(storyboard.len());
        for shot in storyboard {
            let mut layers = Vec::new();

            if let Some(asset) = assets_by_shot.get(shot.shot_id.as_str()) {
                let mut metadata = Map::new();
                metadata.insert(
                    "negative_prompt".into(),
                    asset
                        .negative_prompt
                        .clone()
                        .map(Value::String)
                        .unwrap_or(Value::Null),
                );
                layers.push(TimelineLayer {
                    kind: "visual".into(),
                    reference: asset
                        .asset_uri
                        .clone()
                        .unwrap_or_else(|| format!("prompt:{}", asset.prompt)),
                    start: shot.start,
                    duration: shot.duration,
                    metadata,
                });
            }

            if let Some(camera) = camera_by_shot.get(shot.shot_id.as_str()) {
                let mut metadata = camera.params.clone();
                metadata.insert(
                    "transition".into(),
                    camera
                        .transition
                        .clone()
                        .map(Value::String)
                        .unwrap_or(Value::Null),
                );
                layers.push(TimelineLayer {
                    kind: "camera".into(),
                    reference: camera.motion_type.clone(),
                    start: shot.start,
                    duration: shot.duration,
                    metadata,
                });
            }

            entries.push(TimelineEntry {
                shot_id: shot.shot_id.clone(),
                layers,
                audio_cues: vec![TimelineCue {
                    cue_type: "narration".into(),
                    reference: shot.subtitle.clone(),
                    start: shot.start,
                    duration: shot.duration,
                }],
            });
        }
        Ok(entries)
    }
}

/// Returns placeholder URIs for the deliverables.
pub struct DeterministicSynthesisAgent;

impl SynthesisAgent for DeterministicSynthesisAgent {
    fn run(&self, context: &TaskContext, timeline: &[TimelineEntry]) -> AgentResult<FinalAssets> {
        let base_uri = format!("https://example.com/tasks/{}", context.task_id);
        let mut metadata = Map::new();
        metadata.insert("shots".into(), json!(timeline.len()));
        Ok(FinalAssets {
            video_uri: Some(format!("{base_uri}/video.mp4")),
            audio_uri: Some(format!("{base_uri}/narration.wav")),
            subtitles_uri: Some(format!("{base_uri}/subtitles.srt")),
            metadata,
        })
    }
}
