mod config;
mod customize;
mod errors;
mod extract;
mod llm_client;
mod models;
mod pipeline;
mod render;
mod routes;
mod state;
mod structure;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, PdfEngineKind};
use crate::customize::Customizer;
use crate::extract::PdfTextExtractor;
use crate::llm_client::LlmClient;
use crate::pipeline::ResumePipeline;
use crate::render::{BuiltinEngine, CommandEngine, PdfEngine, Renderer};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Tailor v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())
        .context("failed to build text generation client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize PDF engine
    let engine: Arc<dyn PdfEngine> = match config.pdf_engine {
        PdfEngineKind::Builtin => Arc::new(BuiltinEngine::new()),
        PdfEngineKind::Command => Arc::new(CommandEngine::new(
            config.pdf_engine_bin.clone(),
            config.scratch_dir.clone(),
        )),
    };
    info!(
        "PDF engine: {} (scratch dir {})",
        engine.name(),
        config.scratch_dir.display()
    );

    let pipeline = ResumePipeline::new(
        Arc::new(PdfTextExtractor),
        Customizer::new(Arc::new(llm)),
        Renderer::new(engine, config.scratch_dir.clone()),
    );

    // Build app state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
