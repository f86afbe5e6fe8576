use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Which HTML-to-PDF engine the renderer delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfEngineKind {
    /// In-process layout with base-14 fonts.
    Builtin,
    /// External converter binary (`PDF_ENGINE_BIN`).
    Command,
}

impl PdfEngineKind {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "builtin" => Ok(Self::Builtin),
            "command" => Ok(Self::Command),
            other => bail!("PDF_ENGINE must be 'builtin' or 'command', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub pdf_engine: PdfEngineKind,
    pub pdf_engine_bin: String,
    pub scratch_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            pdf_engine: PdfEngineKind::parse(
                &std::env::var("PDF_ENGINE").unwrap_or_else(|_| "builtin".to_string()),
            )?,
            pdf_engine_bin: std::env::var("PDF_ENGINE_BIN")
                .unwrap_or_else(|_| "weasyprint".to_string()),
            scratch_dir: std::env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "10485760".to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a positive integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
