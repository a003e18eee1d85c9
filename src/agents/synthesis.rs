//! Synthesis: subtitles, a timeline manifest, a video placeholder and,
//! when audio services are configured, narration, music and ambience.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use reelforge_workflow::{AgentResult, FinalAssets, SynthesisAgent, TaskContext, TimelineEntry};
use serde_json::{json, Map, Value};

use crate::providers::{DashscopeAudioClient, XunfeiTtsClient};

/// Writes deliverables for a task into a storage directory.
///
/// Only the SRT subtitles, a JSON manifest of the timeline and an empty
/// `<id>.mp4` placeholder are produced; see [`ExternalSynthesisAgent`] for audio.
pub struct LocalSynthesisAgent {
    output_dir: PathBuf,
}

impl LocalSynthesisAgent {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl SynthesisAgent for LocalSynthesisAgent {
    fn run(&self, context: &TaskContext, timeline: &[TimelineEntry]) -> AgentResult<FinalAssets> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", self.output_dir))?;

        let id = context.task_id.as_str();
        let video_path = self.output_dir.join(format!("{}.mp4", id));
        if !video_path.exists() {
            fs::write(&video_path, b"")
                .with_context(|| format!("Failed to write {:?}", video_path))?;
        }

        let manifest_path = self.output_dir.join(format!("{}_timeline.json", id));
        let manifest = json!({
            "task_id": id,
            "persona": context.persona,
            "entries": serde_json::to_value(timeline)?,
        });
        fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)
            .with_context(|| format!("Failed to write {:?}", manifest_path))?;

        let subtitles = render_srt(timeline);
        let subtitles_uri = if subtitles.is_empty() {
            None
        } else {
            let path = self.output_dir.join(format!("{}.srt", id));
            fs::write(&path, &subtitles).with_context(|| format!("Failed to write {:?}", path))?;
            Some(path.display().to_string())
        };

        let narration: Vec<Value> = timeline
            .iter()
            .flat_map(|entry| &entry.audio_cues)
            .filter(|cue| cue.cue_type == "narration")
            .map(|cue| Value::String(cue.reference.clone()))
            .collect();

        let mut metadata = Map::new();
        metadata.insert("shots".into(), json!(timeline.len()));
        metadata.insert("narration".into(), Value::Array(narration));
        metadata.insert(
            "timeline_manifest".into(),
            json!(manifest_path.display().to_string()),
        );

        tracing::debug!(
            task_id = %context.task_id,
            "Wrote deliverables to {:?}",
            self.output_dir
        );

        Ok(FinalAssets {
            video_uri: Some(video_path.display().to_string()),
            audio_uri: None,
            subtitles_uri,
            metadata,
        })
    }
}

/// Local deliverables plus audio from whichever services are configured.
///
/// Narration goes to `<id>_narration_NN.<format>` (one file per narration
/// cue), the background track to `<id>_bgm.mp3` and ambience to
/// `<id>_ambience.mp3`. The background track becomes `audio_uri`.
pub struct ExternalSynthesisAgent {
    local: LocalSynthesisAgent,
    tts: Option<XunfeiTtsClient>,
    music: Option<DashscopeAudioClient>,
    ambience: Option<DashscopeAudioClient>,
}

impl ExternalSynthesisAgent {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            local: LocalSynthesisAgent::new(output_dir),
            tts: None,
            music: None,
            ambience: None,
        }
    }

    pub fn with_tts(mut self, client: XunfeiTtsClient) -> Self {
        self.tts = Some(client);
        self
    }

    pub fn with_music(mut self, client: DashscopeAudioClient) -> Self {
        self.music = Some(client);
        self
    }

    pub fn with_ambience(mut self, client: DashscopeAudioClient) -> Self {
        self.ambience = Some(client);
        self
    }

    /// True when at least one audio service is attached.
    pub fn has_audio(&self) -> bool {
        self.tts.is_some() || self.music.is_some() || self.ambience.is_some()
    }

    fn narrate(
        &self,
        tts: &XunfeiTtsClient,
        id: &str,
        timeline: &[TimelineEntry],
    ) -> AgentResult<Vec<Value>> {
        let cues = timeline
            .iter()
            .flat_map(|entry| &entry.audio_cues)
            .filter(|cue| cue.cue_type == "narration");

        let mut files = Vec::new();
        for (index, cue) in cues.enumerate() {
            let path = self
                .local
                .output_dir()
                .join(format!("{}_narration_{:02}.{}", id, index, tts.format()));
            let written = tts
                .synthesize(&cue.reference, &path)
                .with_context(|| format!("Narration {} failed", index))?;
            files.push(json!(written.display().to_string()));
        }
        Ok(files)
    }
}

impl SynthesisAgent for ExternalSynthesisAgent {
    fn run(&self, context: &TaskContext, timeline: &[TimelineEntry]) -> AgentResult<FinalAssets> {
        let mut assets = self.local.run(context, timeline)?;
        let id = context.task_id.as_str();
        let dir = self.local.output_dir();

        if let Some(tts) = &self.tts {
            let files = self.narrate(tts, id, timeline)?;
            assets
                .metadata
                .insert("narration_files".into(), Value::Array(files));
        }

        if let Some(music) = &self.music {
            let path = music.generate(&context.persona, &dir.join(format!("{}_bgm.mp3", id)))?;
            let uri = path.display().to_string();
            assets
                .metadata
                .insert("background_music".into(), Value::String(uri.clone()));
            assets.audio_uri = Some(uri);
        }

        if let Some(ambience) = &self.ambience {
            let path =
                ambience.generate(&context.persona, &dir.join(format!("{}_ambience.mp3", id)))?;
            assets
                .metadata
                .insert("ambience".into(), json!(path.display().to_string()));
        }

        tracing::debug!(
            task_id = %context.task_id,
            "Audio synthesized (narration: {}, music: {}, ambience: {})",
            self.tts.is_some(),
            self.music.is_some(),
            self.ambience.is_some()
        );

        Ok(assets)
    }
}

/// Render every audio cue as an SRT block, numbered from 1.
pub fn render_srt(timeline: &[TimelineEntry]) -> String {
    let cues = timeline.iter().flat_map(|entry| &entry.audio_cues);
    cues.enumerate()
        .map(|(index, cue)| {
            let end = cue.start.saturating_add(cue.duration);
            format!(
                "{}\n{} --> {}\n{}\n\n",
                index + 1,
                format_timestamp(cue.start),
                format_timestamp(end),
                cue.reference
            )
        })
        .collect()
}

/// `HH:MM:SS,mmm`
pub fn format_timestamp(offset: Duration) -> String {
    let total = offset.as_secs();
    format!(
        "{:02}:{:02}:{:02},{:03}",
        total / 3600,
        (total % 3600) / 60,
        total % 60,
        offset.subsec_millis()
    )
}
