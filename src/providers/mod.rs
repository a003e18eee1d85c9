//! Clients for the external generation services used by the production agents.

pub mod dashscope;
pub mod doubao;
pub mod openai;
pub mod parse;
pub mod xunfei;

pub use dashscope::{AudioKind, DashscopeAudioClient, DEFAULT_DASHSCOPE_BASE_URL};
pub use doubao::{DoubaoImageClient, DEFAULT_DOUBAO_BASE_URL};
pub use openai::{OpenAiClient, DEFAULT_DEEPSEEK_BASE_URL, DEFAULT_OPENAI_BASE_URL};
pub use xunfei::{XunfeiTtsClient, DEFAULT_XUNFEI_BASE_URL};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};

/// Decode a base64 audio payload into `path`, creating parent directories.
pub(crate) fn write_audio(encoded: &str, path: &Path) -> Result<PathBuf> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .context("Audio payload is not valid base64")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path.to_path_buf())
}
