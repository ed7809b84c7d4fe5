//! Reasoning Gateway: builds capability prompts, calls the reasoning service
//! once, and normalizes the reply into a typed payload.
//!
//! `None` is the "use the heuristic" signal, never an error: call failures and
//! malformed replies are logged here and go no further.

pub mod payload;
pub mod prompts;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::gateway::payload::{AnalysisPayload, RewritePayload};
use crate::gateway::prompts::{build_analysis_prompt, build_rewrite_prompt, Prompt};
use crate::llm_client::normalizer::{extract_payload, snippet, MalformedResponse};
use crate::llm_client::ReasoningService;
use crate::models::{AnalysisReport, ParsedPosting, StructuredCv};

#[derive(Clone)]
pub struct ReasoningGateway {
    service: Arc<dyn ReasoningService>,
}

impl ReasoningGateway {
    pub fn new(service: Arc<dyn ReasoningService>) -> Self {
        Self { service }
    }

    /// Asks the reasoning service to assess the résumé against the posting.
    pub async fn analyze(
        &self,
        cv: &StructuredCv,
        posting: &ParsedPosting,
        ats_tips: &str,
        best_practices: &str,
    ) -> Option<AnalysisPayload> {
        let prompt = build_analysis_prompt(cv, posting, ats_tips, best_practices);
        self.request("analysis", prompt).await
    }

    /// Asks the reasoning service for before/after rewrites.
    pub async fn rewrite(
        &self,
        cv: &StructuredCv,
        posting: &ParsedPosting,
        analysis: &AnalysisReport,
        bullet_examples: &str,
    ) -> Option<RewritePayload> {
        let prompt = build_rewrite_prompt(cv, posting, analysis, bullet_examples);
        self.request("rewrite", prompt).await
    }

    async fn request<T: DeserializeOwned>(&self, capability: &str, prompt: Prompt) -> Option<T> {
        let raw = match self.service.invoke(&prompt.user, &prompt.system).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(capability, "Reasoning call failed, using heuristic output: {e}");
                return None;
            }
        };

        match decode::<T>(&raw) {
            Ok(payload) => {
                debug!(capability, "Reasoning payload decoded");
                Some(payload)
            }
            Err(e) => {
                warn!(
                    capability,
                    "Reasoning response unusable ({e}), using heuristic output: {}",
                    snippet(&raw)
                );
                None
            }
        }
    }
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, MalformedResponse> {
    let map = extract_payload(raw)?;
    Ok(serde_json::from_value(Value::Object(map))?)
}
