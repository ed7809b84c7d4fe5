//! Typed payloads expected back from the reasoning service.
//!
//! Every field is optional: the model may omit any of them. The substitution
//! rules for absent fields live with the stage that consumes the payload.

use serde::Deserialize;

use crate::models::SectionRewrite;

/// Analysis capability payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisPayload {
    pub match_level: Option<String>,
    pub ats_readiness: Option<String>,
    pub strengths: Option<Vec<String>>,
    pub issues: Option<Vec<String>>,
    pub missing_keywords: Option<Vec<String>>,
    pub improvement_opportunities: Option<Vec<String>>,
}

/// Rewrite capability payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RewritePayload {
    pub summary: Option<SectionRewrite>,
    pub skills: Option<SectionRewrite>,
    pub experience: Option<Vec<SectionRewrite>>,
}
