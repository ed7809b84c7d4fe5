use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, and how the knowledge base is being read.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let knowledge_mode = state.knowledge.mode();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "knowledge_mode": knowledge_mode,
        "reasoning_configured": state.config.anthropic_api_key.is_some(),
    }))
}
