//! Agents backed by chat-completion and image-generation services.

use std::sync::Arc;

use anyhow::Context;
use reelforge_workflow::{
    AgentResult, AssetAgent, CameraAgent, CameraInstruction, ScriptAgent, ScriptSection,
    StoryboardShot, TaskContext, TimelineAgent, TimelineEntry, VisualAsset, VisualPlannerAgent,
};
use serde_json::json;

use crate::providers::{parse, DoubaoImageClient, OpenAiClient};

const SCRIPT_PROMPT: &str = "You are an expert documentary writer. \
    Produce a concise script about a historical figure strictly in chronological order. \
    Always include citations referencing credible sources. \
    Respond with a JSON object matching the requested structure.";

const STORYBOARD_PROMPT: &str = "You are a senior video director. \
    Convert the provided script sections into a storyboard. \
    Return JSON with 'shots', each containing shot_id, start_seconds, duration_seconds, \
    scene, mood, subtitle.";

const CAMERA_PROMPT: &str = "You are a cinematographer. \
    Provide camera motion instructions for each shot. \
    Return JSON with 'plan' items containing shot_id, motion_type, transition, params.";

const TIMELINE_PROMPT: &str = "You are a professional video editor. \
    Combine the storyboard, assets, and camera motions into a timeline. \
    Return JSON with 'entries' each containing shot_id, \
    layers (type, reference, start_seconds, duration_seconds, metadata), \
    and audio_cues (cue_type, reference, start_seconds, duration_seconds).";

pub const OPENAI_ASSET_CONFIDENCE: f64 = 0.85;
pub const DOUBAO_ASSET_CONFIDENCE: f64 = 0.8;

/// Script sections from a chat model (OpenAI or DeepSeek).
pub struct LlmScriptAgent {
    client: Arc<OpenAiClient>,
}

impl LlmScriptAgent {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

impl ScriptAgent for LlmScriptAgent {
    fn run(&self, context: &TaskContext) -> AgentResult<Vec<ScriptSection>> {
        let request = json!({
            "persona": context.persona,
            "requirements": {
                "sections": ["introduction", "climax", "legacy"],
                "citation_format": "short",
                "max_words": 320,
            },
        });

        let payload = self
            .client
            .chat_json(SCRIPT_PROMPT, &request)
            .context("Script generation request failed")?;
        parse::script_sections(&payload)
    }
}

pub struct LlmVisualPlannerAgent {
    client: Arc<OpenAiClient>,
}

impl LlmVisualPlannerAgent {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

impl VisualPlannerAgent for LlmVisualPlannerAgent {
    fn run(
        &self,
        context: &TaskContext,
        script: &[ScriptSection],
    ) -> AgentResult<Vec<StoryboardShot>> {
        let sections: Vec<_> = script
            .iter()
            .map(|s| {
                json!({
                    "section": s.section,
                    "timeframe": s.timeframe,
                    "summary": s.summary,
                })
            })
            .collect();
        let request = json!({"persona": context.persona, "script": sections});

        let payload = self
            .client
            .chat_json(STORYBOARD_PROMPT, &request)
            .context("Storyboard generation request failed")?;
        parse::storyboard(&payload)
    }
}

pub struct LlmCameraAgent {
    client: Arc<OpenAiClient>,
}

impl LlmCameraAgent {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

impl CameraAgent for LlmCameraAgent {
    fn run(
        &self,
        _context: &TaskContext,
        storyboard: &[StoryboardShot],
    ) -> AgentResult<Vec<CameraInstruction>> {
        let shots: Vec<_> = storyboard
            .iter()
            .map(|shot| {
                json!({
                    "shot_id": shot.shot_id,
                    "mood": shot.mood,
                    "duration_seconds": shot.duration.as_secs_f64(),
                    "scene": shot.scene,
                })
            })
            .collect();

        let payload = self
            .client
            .chat_json(CAMERA_PROMPT, &json!({ "shots": shots }))
            .context("Camera plan request failed")?;
        parse::camera_plan(&payload)
    }
}

pub struct LlmTimelineAgent {
    client: Arc<OpenAiClient>,
}

impl LlmTimelineAgent {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

impl TimelineAgent for LlmTimelineAgent {
    fn run(
        &self,
        _context: &TaskContext,
        storyboard: &[StoryboardShot],
        assets: &[VisualAsset],
        camera_plan: &[CameraInstruction],
    ) -> AgentResult<Vec<TimelineEntry>> {
        let request = json!({
            "storyboard": storyboard.iter().map(|shot| json!({
                "shot_id": shot.shot_id,
                "start": shot.start.as_secs_f64(),
                "duration": shot.duration.as_secs_f64(),
                "subtitle": shot.subtitle,
            })).collect::<Vec<_>>(),
            "assets": assets.iter().map(|asset| json!({
                "shot_id": asset.shot_id,
                "prompt": asset.prompt,
                "asset_uri": asset.asset_uri,
            })).collect::<Vec<_>>(),
            "camera_plan": camera_plan.iter().map(|instruction| json!({
                "shot_id": instruction.shot_id,
                "motion_type": instruction.motion_type,
                "params": instruction.params,
                "transition": instruction.transition,
            })).collect::<Vec<_>>(),
        });

        let payload = self
            .client
            .chat_json(TIMELINE_PROMPT, &request)
            .context("Timeline request failed")?;
        parse::timeline(&payload)
    }
}

/// One OpenAI image per storyboard shot.
pub struct OpenAiAssetAgent {
    client: Arc<OpenAiClient>,
}

impl OpenAiAssetAgent {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

impl AssetAgent for OpenAiAssetAgent {
    fn run(
        &self,
        context: &TaskContext,
        storyboard: &[StoryboardShot],
    ) -> AgentResult<Vec<VisualAsset>> {
        storyboard
            .iter()
            .map(|shot| {
                let prompt = format!(
                    "{} {}. Historical authenticity, cinematic lighting, fine details.",
                    context.persona, shot.scene
                );
                let uri = self
                    .client
                    .generate_image(&prompt)
                    .with_context(|| format!("Image generation failed for {}", shot.shot_id))?;
                Ok(VisualAsset {
                    shot_id: shot.shot_id.clone(),
                    prompt,
                    negative_prompt: None,
                    asset_uri: Some(uri),
                    confidence: OPENAI_ASSET_CONFIDENCE,
                })
            })
            .collect()
    }
}

/// One Doubao image per storyboard shot.
pub struct DoubaoAssetAgent {
    client: Arc<DoubaoImageClient>,
}

impl DoubaoAssetAgent {
    pub fn new(client: Arc<DoubaoImageClient>) -> Self {
        Self { client }
    }
}

impl AssetAgent for DoubaoAssetAgent {
    fn run(
        &self,
        context: &TaskContext,
        storyboard: &[StoryboardShot],
    ) -> AgentResult<Vec<VisualAsset>> {
        let negative_prompt = self.client.default_negative_prompt().map(str::to_string);

        storyboard
            .iter()
            .map(|shot| {
                let prompt = format!(
                    "{} {}. Chinese painting style, high detail, documentary texture.",
                    context.persona, shot.scene
                );
                let uri = self
                    .client
                    .generate_image(&prompt, None)
                    .with_context(|| format!("Image generation failed for {}", shot.shot_id))?;
                Ok(VisualAsset {
                    shot_id: shot.shot_id.clone(),
                    prompt,
                    negative_prompt: negative_prompt.clone(),
                    asset_uri: Some(uri),
                    confidence: DOUBAO_ASSET_CONFIDENCE,
                })
            })
            .collect()
    }
}
