use crate::config::{DeepSeekSettings, OpenAiSettings};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::parse::message_text;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

/// DeepSeek has no per-request timeout setting
const DEEPSEEK_TIMEOUT: Duration = Duration::from_secs(60);

const IMAGE_SIZE: &str = "1024x1024";

/// Blocking client for OpenAI-compatible chat completion and image endpoints.
///
/// Used for OpenAI itself and for DeepSeek, which exposes the same chat API.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    image_model: Option<String>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Value,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
pub(crate) struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl ImageData {
    /// Remote URL, or an inline data URI for base64 payloads.
    pub(crate) fn into_uri(self) -> Option<String> {
        self.url
            .filter(|url| !url.is_empty())
            .or_else(|| {
                self.b64_json
                    .filter(|data| !data.is_empty())
                    .map(|data| format!("data:image/png;base64,{}", data))
            })
    }
}

impl OpenAiClient {
    pub fn new(settings: &OpenAiSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_secs(settings.timeout_secs))?,
            base_url: base_url(settings.base_url.as_deref(), DEFAULT_OPENAI_BASE_URL),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            image_model: Some(settings.image_model.clone()),
            temperature: settings.temperature,
        })
    }

    /// Chat-only client for DeepSeek.
    pub fn deepseek(settings: &DeepSeekSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(DEEPSEEK_TIMEOUT)?,
            base_url: base_url(settings.base_url.as_deref(), DEFAULT_DEEPSEEK_BASE_URL),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            image_model: None,
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run a chat completion in JSON mode and decode the reply.
    pub fn chat_json(&self, system_prompt: &str, user_content: &Value) -> Result<Value> {
        let system_prompt = if system_prompt.to_lowercase().contains("json") {
            system_prompt.to_string()
        } else {
            format!("{} Respond with valid JSON.", system_prompt.trim())
        };

        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content.to_string()},
            ],
        });

        tracing::debug!("POST {}/chat/completions (model {})", self.base_url, self.model);
        let response: ChatResponse = self.post("/chat/completions", &body)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .context("Chat completion returned no choices")?;
        let content =
            message_text(&choice.message.content).context("Chat completion returned empty content")?;

        serde_json::from_str(&content).context("Failed to decode JSON from chat completion")
    }

    /// Generate one image and return its URL or data URI.
    pub fn generate_image(&self, prompt: &str) -> Result<String> {
        let image_model = self
            .image_model
            .as_deref()
            .context("This provider does not support image generation")?;

        let body = json!({
            "model": image_model,
            "prompt": prompt,
            "size": IMAGE_SIZE,
            "n": 1,
        });

        tracing::debug!("POST {}/images/generations (model {})", self.base_url, image_model);
        let response: ImageResponse = self.post("/images/generations", &body)?;

        response
            .data
            .into_iter()
            .next()
            .and_then(ImageData::into_uri)
            .context("Image generation returned no image")
    }

    fn post<T: serde::de::DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .with_context(|| format!("Failed to POST {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().unwrap_or_default();
            anyhow::bail!("{} returned {}: {}", url, status, error);
        }

        response
            .json()
            .with_context(|| format!("Invalid response body from {}", url))
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

pub(crate) fn base_url(configured: Option<&str>, default: &str) -> String {
    configured.unwrap_or(default).trim_end_matches('/').to_string()
}
