//! Production agents and the agent set chosen from configuration.

mod production;
mod synthesis;

pub use production::{
    DoubaoAssetAgent, LlmCameraAgent, LlmScriptAgent, LlmTimelineAgent, LlmVisualPlannerAgent,
    OpenAiAssetAgent, DOUBAO_ASSET_CONFIDENCE, OPENAI_ASSET_CONFIDENCE,
};
pub use synthesis::{format_timestamp, render_srt, ExternalSynthesisAgent, LocalSynthesisAgent};

use std::sync::Arc;

use anyhow::{Context, Result};
use reelforge_workflow::{AgentSet, AssetAgent, ScriptAgent, SynthesisAgent};

use crate::config::{AgentMode, Config, ImageProvider, TextProvider};
use crate::providers::{DashscopeAudioClient, DoubaoImageClient, OpenAiClient, XunfeiTtsClient};

/// Build the service-backed agent set.
///
/// OpenAI settings are always required; DeepSeek and Doubao replace the
/// script and asset agents when selected as providers.
pub fn build_production_agents(config: &Config) -> Result<AgentSet> {
    let openai_settings = config
        .openai
        .as_ref()
        .context("Production agents require [openai] settings")?;
    let openai = Arc::new(OpenAiClient::new(openai_settings)?);

    let script: Arc<dyn ScriptAgent> = match config.text_generation.provider {
        TextProvider::OpenAi => Arc::new(LlmScriptAgent::new(openai.clone())),
        TextProvider::DeepSeek => {
            let settings = config
                .deepseek
                .as_ref()
                .context("DeepSeek provider selected but no [deepseek] settings supplied")?;
            Arc::new(LlmScriptAgent::new(Arc::new(OpenAiClient::deepseek(
                settings,
            )?)))
        }
    };

    let asset: Arc<dyn AssetAgent> = match config.image_generation.provider {
        ImageProvider::OpenAi => Arc::new(OpenAiAssetAgent::new(openai.clone())),
        ImageProvider::Doubao => {
            let settings = config
                .doubao
                .as_ref()
                .context("Doubao provider selected but no [doubao] settings supplied")?;
            Arc::new(DoubaoAssetAgent::new(Arc::new(DoubaoImageClient::new(
                settings,
            )?)))
        }
    };

    tracing::info!(
        "Production agents ready (text: {}, image: {}, model: {})",
        config.text_generation.provider,
        config.image_generation.provider,
        openai.model()
    );

    Ok(AgentSet::deterministic()
        .with_script(script)
        .with_visual_planner(Arc::new(LlmVisualPlannerAgent::new(openai.clone())))
        .with_asset(asset)
        .with_camera(Arc::new(LlmCameraAgent::new(openai.clone())))
        .with_timeline(Arc::new(LlmTimelineAgent::new(openai)))
        .with_synthesis(build_synthesis_agent(config)?))
}

/// Audio-producing synthesis when any of `[xunfei_tts]`, `[dashscope_music]`
/// or `[dashscope_ambience]` is configured, local-only synthesis otherwise.
pub fn build_synthesis_agent(config: &Config) -> Result<Arc<dyn SynthesisAgent>> {
    let output_dir = config.storage.output_dir.clone();
    let mut agent = ExternalSynthesisAgent::new(output_dir.clone());

    if let Some(settings) = &config.xunfei_tts {
        agent = agent.with_tts(XunfeiTtsClient::new(settings)?);
    }
    if let Some(settings) = &config.dashscope_music {
        agent = agent.with_music(DashscopeAudioClient::music(settings)?);
    }
    if let Some(settings) = &config.dashscope_ambience {
        agent = agent.with_ambience(DashscopeAudioClient::ambience(settings)?);
    }

    if agent.has_audio() {
        tracing::info!(
            "Audio synthesis enabled (narration: {}, music: {}, ambience: {})",
            config.xunfei_tts.is_some(),
            config.dashscope_music.is_some(),
            config.dashscope_ambience.is_some()
        );
        Ok(Arc::new(agent))
    } else {
        Ok(Arc::new(LocalSynthesisAgent::new(output_dir)))
    }
}

/// Pick the agent set for `[agents] mode`.
///
/// `auto` uses production agents when they can be built and the
/// deterministic set otherwise.
pub fn select_agents(config: &Config) -> Result<AgentSet> {
    match config.agents.mode {
        AgentMode::Deterministic => {
            tracing::info!("Using deterministic agents");
            Ok(AgentSet::deterministic())
        }
        AgentMode::Production => build_production_agents(config),
        AgentMode::Auto => match build_production_agents(config) {
            Ok(agents) => Ok(agents),
            Err(e) => {
                tracing::warn!("Falling back to deterministic agents: {:#}", e);
                Ok(AgentSet::deterministic())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DashscopeMusicSettings, OpenAiSettings};

    #[test]
    fn auto_mode_without_services_falls_back() {
        let config = Config::default();
        assert!(select_agents(&config).is_ok());
    }

    #[test]
    fn production_mode_without_openai_fails() {
        let mut config = Config::default();
        config.agents.mode = AgentMode::Production;
        let err = select_agents(&config).unwrap_err();
        assert!(err.to_string().contains("[openai]"));
    }

    #[test]
    fn synthesis_without_audio_services_stays_local() {
        let config = Config::default();
        assert!(build_synthesis_agent(&config).is_ok());
    }

    #[test]
    fn audio_section_enables_external_synthesis() {
        let mut config = Config::default();
        config.dashscope_music = Some(DashscopeMusicSettings::new("ds"));
        assert!(build_synthesis_agent(&config).is_ok());
    }

    #[test]
    fn selected_doubao_without_settings_fails() {
        let mut config = Config::default();
        config.openai = Some(OpenAiSettings::new("sk-test"));
        config.image_generation.provider = ImageProvider::Doubao;
        let err = build_production_agents(&config).unwrap_err();
        assert!(err.to_string().contains("doubao"));
    }
}
