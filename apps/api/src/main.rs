mod config;
mod errors;
mod extraction;
mod gateway;
mod knowledge;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::gateway::ReasoningGateway;
use crate::knowledge::KnowledgeBase;
use crate::llm_client::LlmClient;
use crate::pipeline::Pipeline;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Knowledge base (an unsupported URI scheme is fatal here)
    let knowledge = Arc::new(
        KnowledgeBase::new(&config.knowledge()).context("Invalid knowledge base configuration")?,
    );
    let mode = knowledge.mode();
    info!(
        "Knowledge base at {} (mode: {mode:?})",
        knowledge.root().display()
    );

    // Reasoning service
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        warn!("ANTHROPIC_API_KEY not set, analysis and rewriting will use heuristics");
    }
    let gateway = ReasoningGateway::new(Arc::new(llm));

    let state = AppState {
        pipeline: Pipeline::new(knowledge.clone(), gateway),
        knowledge: knowledge.clone(),
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    knowledge.close().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
