use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub agents: AgentsConfig,

    #[serde(default)]
    pub openai: Option<OpenAiSettings>,

    #[serde(default)]
    pub deepseek: Option<DeepSeekSettings>,

    #[serde(default)]
    pub doubao: Option<DoubaoSettings>,

    #[serde(default)]
    pub xunfei_tts: Option<XunfeiSettings>,

    #[serde(default)]
    pub dashscope_music: Option<DashscopeMusicSettings>,

    #[serde(default)]
    pub dashscope_ambience: Option<DashscopeAmbienceSettings>,

    #[serde(default)]
    pub text_generation: TextGenerationConfig,

    #[serde(default)]
    pub image_generation: ImageGenerationConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static files served at `/` (optional web UI)
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

/// Which agent implementations the registry is built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// Production agents when they can be built, deterministic otherwise
    #[default]
    Auto,
    Deterministic,
    Production,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub mode: AgentMode,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiSettings {
    pub api_key: String,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_openai_image_model")]
    pub image_model: String,

    /// Alternative OpenAI-compatible endpoint (default: https://api.openai.com/v1)
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout in seconds (default: 120)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_openai_image_model() -> String {
    "gpt-image-1".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_timeout_secs() -> u64 {
    120
}

impl OpenAiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_openai_model(),
            image_model: default_openai_image_model(),
            base_url: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeepSeekSettings {
    pub api_key: String,

    #[serde(default = "default_deepseek_model")]
    pub model: String,

    /// Default: https://api.deepseek.com/v1
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_deepseek_model() -> String {
    "deepseek-chat".to_string()
}

impl DeepSeekSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_deepseek_model(),
            base_url: None,
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DoubaoSettings {
    pub api_key: String,

    #[serde(default = "default_doubao_model")]
    pub model: String,

    /// Default: https://ark.cn-beijing.volces.com/api/v3
    #[serde(default)]
    pub base_url: Option<String>,

    /// Sent with every image request that has no negative prompt of its own
    #[serde(default)]
    pub negative_prompt: Option<String>,
}

fn default_doubao_model() -> String {
    "doubao-vision".to_string()
}

impl DoubaoSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_doubao_model(),
            base_url: None,
            negative_prompt: None,
        }
    }
}

/// Xunfei text-to-speech, used for narration audio.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct XunfeiSettings {
    pub app_id: String,
    pub api_key: String,
    pub api_secret: String,

    #[serde(default = "default_xunfei_voice")]
    pub voice: String,

    /// Extension of the narration files written to storage
    #[serde(default = "default_xunfei_format")]
    pub format: String,

    #[serde(default = "default_xunfei_speed")]
    pub speed: u32,

    /// Default: https://tts-api.xfyun.cn/v2
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_xunfei_voice() -> String {
    "xiaoyan".to_string()
}
fn default_xunfei_format() -> String {
    "mp3".to_string()
}
fn default_xunfei_speed() -> u32 {
    50
}

impl XunfeiSettings {
    pub fn new(
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            voice: default_xunfei_voice(),
            format: default_xunfei_format(),
            speed: default_xunfei_speed(),
            base_url: None,
        }
    }
}

/// DashScope text-to-music, used for the background track.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashscopeMusicSettings {
    pub api_key: String,

    #[serde(default = "default_dashscope_model")]
    pub model: String,

    #[serde(default = "default_music_style")]
    pub style: String,

    #[serde(default = "default_music_duration")]
    pub duration_seconds: u32,

    /// Default: https://dashscope.aliyuncs.com/api/v1
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_dashscope_model() -> String {
    "text-to-music-001".to_string()
}
fn default_music_style() -> String {
    "中国古风".to_string()
}
fn default_music_duration() -> u32 {
    120
}

impl DashscopeMusicSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_dashscope_model(),
            style: default_music_style(),
            duration_seconds: default_music_duration(),
            base_url: None,
        }
    }
}

/// DashScope text-to-music, used for scene ambience.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashscopeAmbienceSettings {
    pub api_key: String,

    #[serde(default = "default_dashscope_model")]
    pub model: String,

    #[serde(default = "default_ambience_style")]
    pub style: String,

    #[serde(default = "default_ambience_duration")]
    pub duration_seconds: u32,

    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_ambience_style() -> String {
    "中国场景环境音".to_string()
}
fn default_ambience_duration() -> u32 {
    45
}

impl DashscopeAmbienceSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_dashscope_model(),
            style: default_ambience_style(),
            duration_seconds: default_ambience_duration(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextProvider {
    #[default]
    OpenAi,
    DeepSeek,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageProvider {
    #[default]
    OpenAi,
    Doubao,
}

impl FromStr for TextProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(TextProvider::OpenAi),
            "deepseek" => Ok(TextProvider::DeepSeek),
            other => Err(format!("Unknown text generation provider: {}", other)),
        }
    }
}

impl FromStr for ImageProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ImageProvider::OpenAi),
            "doubao" => Ok(ImageProvider::Doubao),
            other => Err(format!("Unknown image generation provider: {}", other)),
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AgentMode::Auto => "auto",
            AgentMode::Deterministic => "deterministic",
            AgentMode::Production => "production",
        })
    }
}

impl fmt::Display for TextProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextProvider::OpenAi => "openai",
            TextProvider::DeepSeek => "deepseek",
        })
    }
}

impl fmt::Display for ImageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageProvider::OpenAi => "openai",
            ImageProvider::Doubao => "doubao",
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TextGenerationConfig {
    #[serde(default)]
    pub provider: TextProvider,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImageGenerationConfig {
    #[serde(default)]
    pub provider: ImageProvider,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where synthesized subtitles, manifests and videos are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./var/output")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}
