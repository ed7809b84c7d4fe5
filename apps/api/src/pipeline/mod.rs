//! Pipeline Orchestrator: extraction → analysis → rewriting → report.
//!
//! Stages run strictly in sequence and never fail: every stage that cannot use
//! the reasoning service falls back to deterministic output, so a run always
//! reaches `Phase::Done`.

pub mod analysis;
pub mod report;
pub mod rewriting;
pub mod state;

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::extraction::document::extract_text;
use crate::extraction::posting_parser::parse_posting;
use crate::extraction::resume_parser::parse_resume;
use crate::gateway::ReasoningGateway;
use crate::knowledge::KnowledgeBase;
use crate::pipeline::state::PipelineState;

#[derive(Clone)]
pub struct Pipeline {
    knowledge: Arc<KnowledgeBase>,
    gateway: ReasoningGateway,
}

impl Pipeline {
    pub fn new(knowledge: Arc<KnowledgeBase>, gateway: ReasoningGateway) -> Self {
        Self { knowledge, gateway }
    }

    pub async fn run(&self, cv_bytes: Bytes, job_text: &str) -> PipelineState {
        let mut state = PipelineState::new();

        let raw_text = extract_text(cv_bytes).await;
        let cv = parse_resume(&raw_text);
        let posting = parse_posting(job_text);
        info!(
            skills = cv.skills.len(),
            experience = cv.experience.len(),
            required_skills = posting.required_skills.len(),
            "Inputs parsed"
        );
        state.record_parsed(cv, posting);

        let (report, source) =
            analysis::analyze(&self.knowledge, &self.gateway, &state.cv, &state.posting).await;
        info!(match_level = %report.match_level, ?source, "Analysis complete");
        state.record_analysis(report, source);

        let (sections, source) = rewriting::rewrite(
            &self.knowledge,
            &self.gateway,
            &state.cv,
            &state.posting,
            &state.analysis,
        )
        .await;
        info!(?source, "Rewriting complete");
        state.record_rewrites(sections, source);

        state.finish();
        state
    }
}
