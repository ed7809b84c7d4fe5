//! Analysis stage: reasoning-service assessment with a deterministic heuristic
//! underneath it.
//!
//! The heuristic report is always computed. A reasoning payload overrides it
//! field by field; any field the payload leaves out keeps the heuristic value.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::gateway::payload::AnalysisPayload;
use crate::gateway::ReasoningGateway;
use crate::knowledge::{KbTopic, KnowledgeBase};
use crate::models::{AnalysisReport, MatchLevel, ParsedPosting, StructuredCv};
use crate::pipeline::state::StageSource;

const HIGH_COVERAGE: f64 = 0.75;
const MEDIUM_COVERAGE: f64 = 0.4;

const GENERIC_TIPS: [&str; 2] = [
    "Tailor skills to highlight JD keywords.",
    "Add ATS-friendly headings and bullet points.",
];

/// Runs the analysis stage. Always produces a report.
pub async fn analyze(
    knowledge: &KnowledgeBase,
    gateway: &ReasoningGateway,
    cv: &StructuredCv,
    posting: &ParsedPosting,
) -> (AnalysisReport, StageSource) {
    let (ats_tips, best_practices) = tokio::join!(
        knowledge.get_text(KbTopic::AtsTips),
        knowledge.get_text(KbTopic::CvBestPractices)
    );

    let missing = detect_missing_keywords(&cv.skills, &posting.required_skills);
    let heuristic = heuristic_report(cv, posting, missing);

    match gateway
        .analyze(cv, posting, &ats_tips, &best_practices)
        .await
    {
        Some(payload) => (merge_payload(payload, heuristic), StageSource::Reasoning),
        None => {
            info!("Analysis falling back to heuristic report");
            (heuristic, StageSource::Heuristic)
        }
    }
}

/// Required skills with no case-insensitive match among the résumé skills,
/// in posting order.
pub fn detect_missing_keywords(cv_skills: &[String], required: &[String]) -> Vec<String> {
    let have: HashSet<String> = cv_skills.iter().map(|s| s.to_lowercase()).collect();
    required
        .iter()
        .filter(|skill| !have.contains(&skill.to_lowercase()))
        .cloned()
        .collect()
}

pub fn estimate_match_level(required: &[String], missing: &[String]) -> MatchLevel {
    if required.is_empty() {
        return MatchLevel::Unknown;
    }
    let coverage = 1.0 - missing.len() as f64 / required.len() as f64;
    if coverage >= HIGH_COVERAGE {
        MatchLevel::High
    } else if coverage >= MEDIUM_COVERAGE {
        MatchLevel::Medium
    } else {
        MatchLevel::Low
    }
}

pub fn heuristic_report(
    cv: &StructuredCv,
    posting: &ParsedPosting,
    missing_keywords: Vec<String>,
) -> AnalysisReport {
    let mut strengths = Vec::new();
    let mut issues = Vec::new();

    let checks = [
        (
            cv.summary.as_deref().is_some_and(|s| !s.trim().is_empty()),
            "Summary present",
            "Summary section missing or empty.",
        ),
        (
            !cv.skills.is_empty(),
            "Skills detected",
            "Skills section missing.",
        ),
        (
            !cv.experience.is_empty(),
            "Experience entries detected",
            "Could not identify experience bullets.",
        ),
    ];
    for (present, strength, issue) in checks {
        if present {
            strengths.push(strength.to_string());
        } else {
            issues.push(issue.to_string());
        }
    }
    if !missing_keywords.is_empty() {
        issues.push("Some required skills are not reflected in the CV.".to_string());
    }

    AnalysisReport {
        match_level: estimate_match_level(&posting.required_skills, &missing_keywords),
        ats_readiness: if issues.is_empty() { "Basic" } else { "Needs work" }.to_string(),
        missing_keywords,
        strengths,
        issues,
        improvement_opportunities: GENERIC_TIPS.iter().map(|t| t.to_string()).collect(),
    }
}

/// Overlays a reasoning payload on the heuristic report.
///
/// Absent fields, a blank readiness label and an unrecognised match level all
/// keep the heuristic value.
pub fn merge_payload(payload: AnalysisPayload, heuristic: AnalysisReport) -> AnalysisReport {
    let match_level = match payload.match_level.as_deref().map(str::parse::<MatchLevel>) {
        Some(Ok(level)) => level,
        Some(Err(e)) => {
            warn!("Ignoring reasoning match level: {e}");
            heuristic.match_level
        }
        None => heuristic.match_level,
    };

    AnalysisReport {
        match_level,
        ats_readiness: payload
            .ats_readiness
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(heuristic.ats_readiness),
        missing_keywords: payload
            .missing_keywords
            .unwrap_or(heuristic.missing_keywords),
        strengths: payload.strengths.unwrap_or(heuristic.strengths),
        issues: payload.issues.unwrap_or(heuristic.issues),
        improvement_opportunities: payload
            .improvement_opportunities
            .unwrap_or(heuristic.improvement_opportunities),
    }
}
