use crate::config::{DashscopeAmbienceSettings, DashscopeMusicSettings};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::openai::{base_url, build_client};
use super::write_audio;

pub const DEFAULT_DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/api/v1";

const TEXT_TO_MUSIC_PATH: &str = "services/audio-generation/text-to-music";
const MUSIC_TIMEOUT: Duration = Duration::from_secs(120);
const AMBIENCE_TIMEOUT: Duration = Duration::from_secs(60);

/// What a [`DashscopeAudioClient`] is asked to compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioKind {
    Music,
    Ambience,
}

impl AudioKind {
    fn label(self) -> &'static str {
        match self {
            AudioKind::Music => "DashScope music",
            AudioKind::Ambience => "DashScope ambience",
        }
    }

    /// Prompt describing the track for a persona.
    pub fn prompt(self, persona: &str) -> String {
        match self {
            AudioKind::Music => {
                format!("为历史人物{}的生平故事创作具有中国传统氛围的配乐", persona)
            }
            AudioKind::Ambience => format!(
                "为中国历史人物{}的生平故事营造真实场景环境音，包含宫殿、战场、书院等氛围元素",
                persona
            ),
        }
    }
}

/// Blocking client for the DashScope text-to-music endpoint.
///
/// The same endpoint serves the background track and the ambience bed;
/// the two differ in prompt, style, duration and timeout.
pub struct DashscopeAudioClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    style: String,
    duration_seconds: u32,
    kind: AudioKind,
}

impl DashscopeAudioClient {
    pub fn music(settings: &DashscopeMusicSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(MUSIC_TIMEOUT)?,
            endpoint: endpoint(settings.base_url.as_deref()),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            style: settings.style.clone(),
            duration_seconds: settings.duration_seconds,
            kind: AudioKind::Music,
        })
    }

    pub fn ambience(settings: &DashscopeAmbienceSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(AMBIENCE_TIMEOUT)?,
            endpoint: endpoint(settings.base_url.as_deref()),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            style: settings.style.clone(),
            duration_seconds: settings.duration_seconds,
            kind: AudioKind::Ambience,
        })
    }

    pub fn kind(&self) -> AudioKind {
        self.kind
    }

    /// Compose a track for `persona` and write the decoded audio to `output`.
    pub fn generate(&self, persona: &str, output: &Path) -> Result<PathBuf> {
        let label = self.kind.label();
        let body = json!({
            "model": self.model,
            "input": {
                "prompt": self.kind.prompt(persona),
                "duration": self.duration_seconds,
            },
            "parameters": {
                "style": self.style,
            },
        });

        tracing::debug!("POST {} ({}, model {})", self.endpoint, label, self.model);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("Failed to call {} API", label))?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().unwrap_or_default();
            anyhow::bail!("{} API returned {}: {}", label, status, error);
        }

        let payload: Value = response
            .json()
            .with_context(|| format!("Invalid response body from {} API", label))?;
        let block = audio_block(&payload)
            .with_context(|| format!("{} response missing audio payload", label))?;
        let audio = ["audio", "data"]
            .iter()
            .find_map(|key| block.get(*key).and_then(Value::as_str))
            .filter(|audio| !audio.is_empty())
            .with_context(|| format!("{} audio payload is empty", label))?;

        write_audio(audio, output)
    }
}

fn endpoint(configured: Option<&str>) -> String {
    format!(
        "{}/{}",
        base_url(configured, DEFAULT_DASHSCOPE_BASE_URL),
        TEXT_TO_MUSIC_PATH
    )
}

/// First audio object under `output.audio`, `output.audios` or
/// `output.results`; each may be an object or a list of objects.
fn audio_block(payload: &Value) -> Option<&Value> {
    let output = payload.get("output")?;
    ["audio", "audios", "results"]
        .iter()
        .filter_map(|key| output.get(*key))
        .find_map(|candidate| match candidate {
            Value::Object(_) => Some(candidate),
            Value::Array(items) => items.iter().find(|item| item.is_object()),
            _ => None,
        })
}
