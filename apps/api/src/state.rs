use std::sync::Arc;

use crate::config::Config;
use crate::knowledge::KnowledgeBase;
use crate::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    /// Same instance the pipeline reads through; held here for health and shutdown.
    pub knowledge: Arc<KnowledgeBase>,
    pub config: Config,
}
