//! Rewriting stage: before/after rewrites from the reasoning service, or a
//! pass-through of the original sections when it is unavailable.

use tracing::info;

use crate::gateway::payload::RewritePayload;
use crate::gateway::prompts::REWRITE_EXPERIENCE_LIMIT;
use crate::gateway::ReasoningGateway;
use crate::knowledge::{KbTopic, KnowledgeBase};
use crate::models::{AnalysisReport, ParsedPosting, RewrittenSections, SectionRewrite, StructuredCv};
use crate::pipeline::report::render_report;
use crate::pipeline::state::StageSource;

const UNAVAILABLE: &str = "Rewriting unavailable.";

/// Runs the rewriting stage and renders the final report onto the result.
pub async fn rewrite(
    knowledge: &KnowledgeBase,
    gateway: &ReasoningGateway,
    cv: &StructuredCv,
    posting: &ParsedPosting,
    analysis: &AnalysisReport,
) -> (RewrittenSections, StageSource) {
    let bullet_examples = knowledge.get_text(KbTopic::BulletExamples).await;

    let (mut sections, source) = match gateway
        .rewrite(cv, posting, analysis, &bullet_examples)
        .await
    {
        Some(payload) => (sections_from_payload(payload), StageSource::Reasoning),
        None => {
            info!("Rewriting falling back to pass-through sections");
            (fallback_sections(cv), StageSource::Heuristic)
        }
    };

    sections.final_markdown = render_report(analysis, &sections);
    (sections, source)
}

/// Original sections on both sides, flagged as not rewritten.
pub fn fallback_sections(cv: &StructuredCv) -> RewrittenSections {
    let pass_through = |text: Option<String>| SectionRewrite {
        before: text.clone(),
        after: text,
        explanation: Some(UNAVAILABLE.to_string()),
    };

    RewrittenSections {
        summary: pass_through(cv.summary.clone()),
        skills: pass_through(cv.skills_line()),
        experience: cv
            .experience
            .iter()
            .take(REWRITE_EXPERIENCE_LIMIT)
            .map(|entry| pass_through(Some(entry.raw_text.clone())))
            .collect(),
        final_markdown: String::new(),
    }
}

/// Absent sections become empty rewrites; absent experience becomes none.
pub fn sections_from_payload(payload: RewritePayload) -> RewrittenSections {
    let mut experience = payload.experience.unwrap_or_default();
    experience.truncate(REWRITE_EXPERIENCE_LIMIT);

    RewrittenSections {
        summary: payload.summary.unwrap_or_default(),
        skills: payload.skills.unwrap_or_default(),
        experience,
        final_markdown: String::new(),
    }
}
