mod classification;
mod config;
mod errors;
mod evaluations;
mod llm_client;
mod references;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::classification::HeuristicConfig;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::references::PdfReferenceLibrary;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pdscore API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())
        .context("Failed to build LLM HTTP client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // OPM guide PDFs for prompt grounding (best-effort)
    let references = PdfReferenceLibrary::new(&config.reference_dir);
    info!(
        "Reference library at {} (budget {} chars)",
        config.reference_dir.display(),
        config.reference_char_budget
    );

    // Builder heuristics: built-in defaults unless HEURISTICS_PATH overrides them
    let heuristics = HeuristicConfig::load(config.heuristics_path.as_deref())?;

    let state = AppState {
        llm: Arc::new(llm),
        references: Arc::new(references),
        heuristics: Arc::new(heuristics),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
