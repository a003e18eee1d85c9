use crate::config::DoubaoSettings;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::openai::{base_url, build_client, ImageData};

pub const DEFAULT_DOUBAO_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const IMAGE_SIZE: &str = "1024*1024";

/// Blocking client for the Doubao image generation API.
pub struct DoubaoImageClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    negative_prompt: Option<String>,
}

#[derive(Deserialize)]
struct DoubaoResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

impl DoubaoImageClient {
    pub fn new(settings: &DoubaoSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            endpoint: format!(
                "{}/images",
                base_url(settings.base_url.as_deref(), DEFAULT_DOUBAO_BASE_URL)
            ),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            negative_prompt: settings.negative_prompt.clone(),
        })
    }

    /// Negative prompt applied when a request does not supply its own.
    pub fn default_negative_prompt(&self) -> Option<&str> {
        self.negative_prompt.as_deref()
    }

    /// Generate one image and return its URL or data URI.
    pub fn generate_image(&self, prompt: &str, negative_prompt: Option<&str>) -> Result<String> {
        let body = json!({
            "model": self.model,
            "input": {
                "prompt": prompt,
                "negative_prompt": negative_prompt.or(self.default_negative_prompt()),
                "size": IMAGE_SIZE,
            },
        });

        tracing::debug!("POST {} (model {})", self.endpoint, self.model);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .context("Failed to call Doubao API")?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().unwrap_or_default();
            anyhow::bail!("Doubao API returned {}: {}", status, error);
        }

        let payload: DoubaoResponse = response
            .json()
            .context("Invalid response body from Doubao API")?;
        let image = payload
            .data
            .into_iter()
            .next()
            .context("Doubao returned no images")?;
        image
            .into_uri()
            .context("Doubao image payload missing url/b64 data")
    }
}
