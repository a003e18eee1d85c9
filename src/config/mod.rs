mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file to load
pub const CONFIG_ENV_VAR: &str = "REELFORGE_CONFIG";

const DEFAULT_PATHS: [&str; 3] = [
    "./reelforge.toml",
    "./config/services.toml",
    "~/.config/reelforge/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    normalize(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from the explicit path, `REELFORGE_CONFIG`, the default
/// locations, or finally the environment.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    if let Some(path) = non_blank(std::env::var(CONFIG_ENV_VAR).ok()) {
        return load_config(Path::new(&path));
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let config = config_from_env(|key| std::env::var(key).ok())?;
    validate_config(&config)?;
    Ok(config)
}

/// Build a configuration purely from environment-style variables.
///
/// `lookup` returns the raw value of a variable; blank values count as unset.
/// A service section is only present when its API key is set.
pub fn config_from_env<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| non_blank(lookup(key));
    let mut config = Config::default();

    if let Some(api_key) = var("OPENAI_API_KEY") {
        let mut openai = OpenAiSettings::new(api_key);
        openai.base_url = var("OPENAI_BASE_URL");
        if let Some(model) = var("OPENAI_MODEL") {
            openai.model = model;
        }
        if let Some(model) = var("OPENAI_IMAGE_MODEL") {
            openai.image_model = model;
        }
        if let Some(temperature) = var("OPENAI_TEMPERATURE") {
            openai.temperature = temperature
                .parse()
                .with_context(|| format!("Invalid OPENAI_TEMPERATURE: {}", temperature))?;
        }
        config.openai = Some(openai);
    }

    if let Some(api_key) = var("DEEPSEEK_API_KEY") {
        let mut deepseek = DeepSeekSettings::new(api_key);
        deepseek.base_url = var("DEEPSEEK_BASE_URL");
        if let Some(model) = var("DEEPSEEK_MODEL") {
            deepseek.model = model;
        }
        if let Some(temperature) = var("DEEPSEEK_TEMPERATURE") {
            deepseek.temperature = temperature
                .parse()
                .with_context(|| format!("Invalid DEEPSEEK_TEMPERATURE: {}", temperature))?;
        }
        config.deepseek = Some(deepseek);
    }

    if let Some(api_key) = var("DOUBAO_API_KEY") {
        let mut doubao = DoubaoSettings::new(api_key);
        doubao.base_url = var("DOUBAO_BASE_URL");
        doubao.negative_prompt = var("DOUBAO_NEGATIVE_PROMPT");
        if let Some(model) = var("DOUBAO_MODEL") {
            doubao.model = model;
        }
        config.doubao = Some(doubao);
    }

    if let Some(app_id) = var("XUNFEI_APP_ID") {
        let api_key =
            var("XUNFEI_API_KEY").context("XUNFEI_APP_ID is set but XUNFEI_API_KEY is not")?;
        let api_secret =
            var("XUNFEI_API_SECRET").context("XUNFEI_APP_ID is set but XUNFEI_API_SECRET is not")?;
        let mut xunfei = XunfeiSettings::new(app_id, api_key, api_secret);
        if let Some(voice) = var("XUNFEI_VOICE") {
            xunfei.voice = voice;
        }
        if let Some(format) = var("XUNFEI_FORMAT") {
            xunfei.format = format;
        }
        if let Some(speed) = var("XUNFEI_SPEED") {
            xunfei.speed = speed
                .parse()
                .with_context(|| format!("Invalid XUNFEI_SPEED: {}", speed))?;
        }
        config.xunfei_tts = Some(xunfei);
    }

    if let Some(api_key) = var("DASHSCOPE_API_KEY") {
        let mut music = DashscopeMusicSettings::new(api_key);
        if let Some(model) = var("DASHSCOPE_MUSIC_MODEL") {
            music.model = model;
        }
        if let Some(style) = var("DASHSCOPE_MUSIC_STYLE") {
            music.style = style;
        }
        if let Some(duration) = var("DASHSCOPE_MUSIC_DURATION") {
            music.duration_seconds = duration
                .parse()
                .with_context(|| format!("Invalid DASHSCOPE_MUSIC_DURATION: {}", duration))?;
        }
        config.dashscope_music = Some(music);
    }

    // Ambience shares the music key unless it has its own
    let ambience_key = var("DASHSCOPE_AMBIENCE_API_KEY").or_else(|| var("DASHSCOPE_API_KEY"));
    if let Some(api_key) = ambience_key {
        let mut ambience = DashscopeAmbienceSettings::new(api_key);
        if let Some(model) = var("DASHSCOPE_AMBIENCE_MODEL") {
            ambience.model = model;
        }
        if let Some(style) = var("DASHSCOPE_AMBIENCE_STYLE") {
            ambience.style = style;
        }
        if let Some(duration) = var("DASHSCOPE_AMBIENCE_DURATION") {
            ambience.duration_seconds = duration
                .parse()
                .with_context(|| format!("Invalid DASHSCOPE_AMBIENCE_DURATION: {}", duration))?;
        }
        config.dashscope_ambience = Some(ambience);
    }

    if let Some(provider) = var("TEXT_GENERATION_PROVIDER") {
        config.text_generation.provider = provider.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(provider) = var("IMAGE_GENERATION_PROVIDER") {
        config.image_generation.provider = provider.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(output_dir) = var("REELFORGE_OUTPUT_DIR") {
        config.storage.output_dir = PathBuf::from(output_dir);
    }

    Ok(config)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Treat blank optional strings in a loaded file as unset.
fn normalize(config: &mut Config) {
    if let Some(openai) = config.openai.as_mut() {
        openai.base_url = non_blank(openai.base_url.take());
    }
    if let Some(deepseek) = config.deepseek.as_mut() {
        deepseek.base_url = non_blank(deepseek.base_url.take());
    }
    if let Some(doubao) = config.doubao.as_mut() {
        doubao.base_url = non_blank(doubao.base_url.take());
        doubao.negative_prompt = non_blank(doubao.negative_prompt.take());
    }
    if let Some(xunfei) = config.xunfei_tts.as_mut() {
        xunfei.base_url = non_blank(xunfei.base_url.take());
    }
    if let Some(music) = config.dashscope_music.as_mut() {
        music.base_url = non_blank(music.base_url.take());
    }
    if let Some(ambience) = config.dashscope_ambience.as_mut() {
        ambience.base_url = non_blank(ambience.base_url.take());
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if let Some(ref dir) = config.server.static_dir {
        if !dir.exists() {
            tracing::warn!("Static directory does not exist: {:?}", dir);
        }
    }

    let keys = [
        ("openai", config.openai.as_ref().map(|s| s.api_key.as_str())),
        ("deepseek", config.deepseek.as_ref().map(|s| s.api_key.as_str())),
        ("doubao", config.doubao.as_ref().map(|s| s.api_key.as_str())),
        ("xunfei_tts", config.xunfei_tts.as_ref().map(|s| s.api_key.as_str())),
        (
            "dashscope_music",
            config.dashscope_music.as_ref().map(|s| s.api_key.as_str()),
        ),
        (
            "dashscope_ambience",
            config.dashscope_ambience.as_ref().map(|s| s.api_key.as_str()),
        ),
    ];
    for (section, api_key) in keys {
        if api_key.is_some_and(|key| key.trim().is_empty()) {
            anyhow::bail!("Section [{}] is present but has no API key", section);
        }
    }

    if let Some(xunfei) = &config.xunfei_tts {
        if xunfei.app_id.trim().is_empty() || xunfei.api_secret.trim().is_empty() {
            anyhow::bail!("Section [xunfei_tts] needs app_id and api_secret");
        }
    }

    if config.text_generation.provider == TextProvider::DeepSeek && config.deepseek.is_none() {
        anyhow::bail!("Text provider 'deepseek' selected but no [deepseek] settings supplied");
    }
    if config.image_generation.provider == ImageProvider::Doubao && config.doubao.is_none() {
        anyhow::bail!("Image provider 'doubao' selected but no [doubao] settings supplied");
    }

    if config.agents.mode == AgentMode::Production && config.openai.is_none() {
        anyhow::bail!("Agent mode 'production' requires [openai] settings");
    }

    Ok(())
}
