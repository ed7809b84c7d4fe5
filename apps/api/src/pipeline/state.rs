//! The record threaded through one pipeline run.
//!
//! Each stage writes its own fields exactly once through a `record_*` method,
//! which also advances `phase`. Earlier fields are never touched again.

use serde::Serialize;

use crate::models::{AnalysisReport, ParsedPosting, RewrittenSections, StructuredCv};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Start,
    Parsed,
    Analyzed,
    Rewritten,
    Done,
}

/// Which path a stage took to produce its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageSource {
    Reasoning,
    Heuristic,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineState {
    pub phase: Phase,
    pub cv: StructuredCv,
    pub posting: ParsedPosting,
    pub analysis: AnalysisReport,
    pub analysis_source: Option<StageSource>,
    pub rewritten: RewrittenSections,
    pub rewrite_source: Option<StageSource>,
    pub report: String,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_parsed(&mut self, cv: StructuredCv, posting: ParsedPosting) {
        debug_assert_eq!(self.phase, Phase::Start);
        self.cv = cv;
        self.posting = posting;
        self.phase = Phase::Parsed;
    }

    pub fn record_analysis(&mut self, analysis: AnalysisReport, source: StageSource) {
        debug_assert_eq!(self.phase, Phase::Parsed);
        self.analysis = analysis;
        self.analysis_source = Some(source);
        self.phase = Phase::Analyzed;
    }

    pub fn record_rewrites(&mut self, rewritten: RewrittenSections, source: StageSource) {
        debug_assert_eq!(self.phase, Phase::Analyzed);
        self.rewritten = rewritten;
        self.rewrite_source = Some(source);
        self.phase = Phase::Rewritten;
    }

    /// Stores the rendered report. The report text is also kept on the
    /// rewritten sections, where it was assembled.
    pub fn finish(&mut self) {
        debug_assert_eq!(self.phase, Phase::Rewritten);
        self.report = self.rewritten.final_markdown.clone();
        self.phase = Phase::Done;
    }
}
