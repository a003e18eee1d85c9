use crate::config::XunfeiSettings;
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use md5::{Digest, Md5};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::openai::{base_url, build_client};
use super::write_audio;

pub const DEFAULT_XUNFEI_BASE_URL: &str = "https://tts-api.xfyun.cn/v2";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const AUDIO_FORMAT: &str = "audio/L16;rate=16000";
const AUDIO_ENCODING: &str = "lame";
const ENGINE_TYPE: &str = "intp65";

/// Blocking client for the Xunfei text-to-speech API.
pub struct XunfeiTtsClient {
    client: Client,
    endpoint: String,
    app_id: String,
    api_key: String,
    api_secret: String,
    voice: String,
    speed: u32,
    format: String,
}

#[derive(Deserialize)]
struct TtsResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<TtsData>,
}

#[derive(Deserialize)]
struct TtsData {
    #[serde(default)]
    audio: Option<String>,
}

impl XunfeiTtsClient {
    pub fn new(settings: &XunfeiSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            endpoint: format!(
                "{}/tts",
                base_url(settings.base_url.as_deref(), DEFAULT_XUNFEI_BASE_URL)
            ),
            app_id: settings.app_id.clone(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            voice: settings.voice.clone(),
            speed: settings.speed,
            format: settings.format.clone(),
        })
    }

    /// File extension for narration written by this client.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Synthesize `text` and write the decoded audio to `output`.
    pub fn synthesize(&self, text: &str, output: &Path) -> Result<PathBuf> {
        if text.trim().is_empty() {
            anyhow::bail!("Narration text cannot be empty");
        }

        let params = json!({
            "auf": AUDIO_FORMAT,
            "aue": AUDIO_ENCODING,
            "voice_name": self.voice,
            "speed": self.speed.to_string(),
            "engine_type": ENGINE_TYPE,
        });
        let param_header = STANDARD.encode(serde_json::to_vec(&params)?);
        let cur_time = chrono::Utc::now().timestamp().to_string();
        let checksum = signature(&self.api_key, &cur_time, &param_header);

        let body = json!({
            "text": STANDARD.encode(text.as_bytes()),
            "app_id": self.app_id,
            "api_secret": self.api_secret,
        });

        tracing::debug!("POST {} (voice {})", self.endpoint, self.voice);
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Appid", &self.app_id)
            .header("X-CurTime", &cur_time)
            .header("X-Param", &param_header)
            .header("X-CheckSum", checksum)
            .json(&body)
            .send()
            .context("Failed to call Xunfei TTS API")?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().unwrap_or_default();
            anyhow::bail!("Xunfei TTS API returned {}: {}", status, error);
        }

        let payload: TtsResponse = response
            .json()
            .context("Invalid response body from Xunfei TTS API")?;
        if payload.code != Some(0) {
            let reason = payload
                .desc
                .or(payload.message)
                .unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("Xunfei TTS error: {}", reason);
        }

        let audio = payload
            .data
            .and_then(|data| data.audio)
            .filter(|audio| !audio.is_empty())
            .context("Xunfei TTS did not return audio data")?;
        write_audio(&audio, output)
    }
}

/// `md5(api_key + cur_time + param)` as lowercase hex.
pub fn signature(api_key: &str, cur_time: &str, param: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(api_key.as_bytes());
    hasher.update(cur_time.as_bytes());
    hasher.update(param.as_bytes());
    hex::encode(hasher.finalize())
}
