// Prompt templates for the two gateway capabilities, and the builders that fill them.

use serde_json::json;

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::models::{AnalysisReport, ExperienceEntry, ParsedPosting, StructuredCv};

/// Entries summarised in the analysis prompt.
const ANALYSIS_EXPERIENCE_LIMIT: usize = 5;
/// Entries sent for rewriting.
pub const REWRITE_EXPERIENCE_LIMIT: usize = 3;
/// Characters of raw résumé text used when no experience entry was found.
const SYNTHETIC_ENTRY_CHARS: usize = 500;

/// System prompt for the analysis capability. Replace `{json_only}`.
pub const ANALYSIS_SYSTEM_TEMPLATE: &str = "You are an ATS expert. Use the provided CV summary, \
    skills, experience, job description details, and knowledge base tips to evaluate alignment. \
    Respond with valid JSON matching the schema provided. {json_only}";

/// Analysis prompt template.
/// Replace: {cv_summary}, {cv_skills}, {cv_experience}, {jd_responsibilities},
///          {jd_required_skills}, {ats_tips}, {cv_best_practices}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"CV summary: {cv_summary}

CV skills: {cv_skills}

CV experience: {cv_experience}

Job responsibilities: {jd_responsibilities}

Job required skills: {jd_required_skills}

ATS tips: {ats_tips}

CV best practices: {cv_best_practices}

Return JSON with keys match_level ("High", "Medium", "Low" or "Unknown"), ats_readiness (string),
strengths, issues, missing_keywords, improvement_opportunities (each a list of strings)."#;

/// System prompt for the rewrite capability. Replace `{no_invention}`, `{json_only}`.
pub const REWRITE_SYSTEM_TEMPLATE: &str =
    "You rewrite CV sections for ATS. {no_invention} {json_only}";

/// Rewrite prompt template.
/// Replace: {cv_summary}, {cv_skills}, {experience_blocks}, {job_focus},
///          {analysis_points}, {bullet_examples}
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"CV summary: {cv_summary}

CV skills: {cv_skills}

Experience blocks (JSON): {experience_blocks}

Job description focus: {job_focus}

Analysis focal points: {analysis_points}

Bullet style inspiration: {bullet_examples}

Return JSON with keys summary (before, after, explanation), skills (before, after, explanation),
experience (list of objects with before, after, explanation)."#;

/// A filled-in prompt ready for the reasoning service.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn build_analysis_prompt(
    cv: &StructuredCv,
    posting: &ParsedPosting,
    ats_tips: &str,
    best_practices: &str,
) -> Prompt {
    let user = fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("cv_summary", cv.summary.as_deref().unwrap_or_default()),
            ("cv_skills", &cv.skills.join(", ")),
            ("cv_experience", &summarize_experience(&cv.experience)),
            ("jd_responsibilities", &posting.responsibilities.join("\n")),
            ("jd_required_skills", &posting.required_skills.join(", ")),
            ("ats_tips", ats_tips),
            ("cv_best_practices", best_practices),
        ],
    );

    Prompt {
        system: fill_template(ANALYSIS_SYSTEM_TEMPLATE, &[("json_only", JSON_ONLY_SYSTEM)]),
        user,
    }
}

pub fn build_rewrite_prompt(
    cv: &StructuredCv,
    posting: &ParsedPosting,
    analysis: &AnalysisReport,
    bullet_examples: &str,
) -> Prompt {
    let job_focus = json!({
        "role": posting.role_title,
        "required_skills": posting.required_skills,
        "responsibilities": posting.responsibilities,
    });
    let analysis_points = json!({
        "strengths": analysis.strengths,
        "issues": analysis.issues,
        "missing_keywords": analysis.missing_keywords,
    });

    let user = fill_template(
        REWRITE_PROMPT_TEMPLATE,
        &[
            ("cv_summary", cv.summary.as_deref().unwrap_or_default()),
            ("cv_skills", &cv.skills.join(", ")),
            ("experience_blocks", &experience_blocks(cv).to_string()),
            ("job_focus", &job_focus.to_string()),
            ("analysis_points", &analysis_points.to_string()),
            ("bullet_examples", bullet_examples),
        ],
    );

    Prompt {
        system: fill_template(
            REWRITE_SYSTEM_TEMPLATE,
            &[
                ("no_invention", NO_INVENTION_INSTRUCTION),
                ("json_only", JSON_ONLY_SYSTEM),
            ],
        ),
        user,
    }
}

/// Substitutes `{name}` placeholders in one left-to-right pass. Inserted values
/// are never scanned again; unknown placeholders are kept as written.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn summarize_experience(entries: &[ExperienceEntry]) -> String {
    entries
        .iter()
        .take(ANALYSIS_EXPERIENCE_LIMIT)
        .map(|entry| {
            let bullets = entry.bullets.join(" | ");
            let detail = if bullets.is_empty() {
                entry.raw_text.as_str()
            } else {
                bullets.as_str()
            };
            format!(
                "Role: {} - bullets: {}",
                entry.role.as_deref().unwrap_or("N/A"),
                detail
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Experience entries sent for rewriting, as a JSON array.
///
/// At most `REWRITE_EXPERIENCE_LIMIT` entries. With none extracted, a single
/// synthetic entry carries the start of the raw résumé text.
fn experience_blocks(cv: &StructuredCv) -> serde_json::Value {
    let mut blocks: Vec<serde_json::Value> = cv
        .experience
        .iter()
        .take(REWRITE_EXPERIENCE_LIMIT)
        .map(|entry| {
            let bullets = if entry.bullets.is_empty() && !entry.raw_text.is_empty() {
                vec![entry.raw_text.clone()]
            } else {
                entry.bullets.clone()
            };
            json!({
                "role": entry.role,
                "raw_text": entry.raw_text,
                "bullets": bullets,
            })
        })
        .collect();

    if blocks.is_empty() && !cv.raw_text.is_empty() {
        let head: String = cv.raw_text.chars().take(SYNTHETIC_ENTRY_CHARS).collect();
        blocks.push(json!({ "role": null, "raw_text": head, "bullets": [] }));
    }

    serde_json::Value::Array(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::resume_parser::parse_resume;

    fn entry(role: &str, bullets: &[&str]) -> ExperienceEntry {
        ExperienceEntry {
            role: Some(role.to_string()),
            bullets: bullets.iter().map(|b| b.to_string()).collect(),
            raw_text: format!("{role} raw"),
        }
    }

    #[test]
    fn test_analysis_prompt_fills_every_placeholder() {
        let cv = parse_resume("Jane Doe\n\nSkills: Python, Go\n\nAcme 2020\n- Built ETL");
        let posting = ParsedPosting {
            responsibilities: vec!["Ship APIs".into(), "Review code".into()],
            required_skills: vec!["Python".into(), "Kubernetes".into()],
            ..Default::default()
        };
        let prompt = build_analysis_prompt(&cv, &posting, "TIPS-DOC", "BEST-DOC");

        assert!(prompt.user.contains("CV summary: Jane Doe"));
        assert!(prompt.user.contains("CV skills: Python, Go"));
        assert!(prompt.user.contains("Role: Acme 2020 - bullets: Built ETL"));
        assert!(prompt.user.contains("Job responsibilities: Ship APIs\nReview code"));
        assert!(prompt.user.contains("Job required skills: Python, Kubernetes"));
        assert!(prompt.user.contains("ATS tips: TIPS-DOC"));
        assert!(prompt.user.contains("CV best practices: BEST-DOC"));
        assert!(!prompt.user.contains("{cv_") && !prompt.user.contains("{jd_"));
        assert!(prompt.system.contains("raw JSON"));
    }

    #[test]
    fn test_analysis_prompt_summarizes_at_most_five_entries() {
        let cv = StructuredCv {
            experience: (0..7).map(|i| entry(&format!("R{i}"), &[])).collect(),
            ..Default::default()
        };
        let summary = summarize_experience(&cv.experience);
        assert_eq!(summary.lines().count(), 5);
        assert!(summary.starts_with("Role: R0 - bullets: R0 raw"));
    }

    #[test]
    fn test_rewrite_blocks_capped_at_three() {
        let cv = StructuredCv {
            experience: (0..5).map(|i| entry(&format!("R{i}"), &["did x"])).collect(),
            raw_text: "ignored".into(),
            ..Default::default()
        };
        let blocks = experience_blocks(&cv);
        let blocks = blocks.as_array().unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[2]["role"], "R2");
        assert_eq!(blocks[0]["bullets"][0], "did x");
    }

    #[test]
    fn test_rewrite_blocks_default_bullets_to_raw_text() {
        let cv = StructuredCv {
            experience: vec![entry("Lead", &[])],
            ..Default::default()
        };
        let blocks = experience_blocks(&cv);
        assert_eq!(blocks[0]["bullets"][0], "Lead raw");
    }

    #[test]
    fn test_rewrite_blocks_synthesize_entry_from_raw_text() {
        let raw = "é".repeat(800);
        let cv = StructuredCv {
            raw_text: raw,
            ..Default::default()
        };
        let blocks = experience_blocks(&cv);
        let blocks = blocks.as_array().unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0]["role"].is_null());
        assert_eq!(
            blocks[0]["raw_text"].as_str().unwrap().chars().count(),
            SYNTHETIC_ENTRY_CHARS
        );
    }

    #[test]
    fn test_rewrite_blocks_empty_for_empty_resume() {
        let blocks = experience_blocks(&StructuredCv::default());
        assert_eq!(blocks, serde_json::json!([]));
    }

    #[test]
    fn test_rewrite_prompt_includes_focus_and_analysis() {
        let cv = parse_resume("Jane\n\nSkills: Rust");
        let posting = ParsedPosting {
            role_title: Some("Backend Engineer".into()),
            required_skills: vec!["Rust".into()],
            ..Default::default()
        };
        let analysis = AnalysisReport {
            missing_keywords: vec!["Kafka".into()],
            ..Default::default()
        };
        let prompt = build_rewrite_prompt(&cv, &posting, &analysis, "EXAMPLES");
        assert!(prompt.user.contains(r#""role":"Backend Engineer""#));
        assert!(prompt.user.contains(r#""missing_keywords":["Kafka"]"#));
        assert!(prompt.user.contains("Bullet style inspiration: EXAMPLES"));
        assert!(prompt.system.contains("Do NOT introduce new skills"));
    }

    #[test]
    fn test_placeholder_text_inside_values_is_kept_verbatim() {
        let cv = parse_resume("Expert in {ats_tips} and {cv_best_practices}\n\nSkills: Rust");
        let prompt = build_analysis_prompt(&cv, &ParsedPosting::default(), "TIPS-DOC", "BEST-DOC");

        assert!(prompt
            .user
            .contains("CV summary: Expert in {ats_tips} and {cv_best_practices}"));
        assert_eq!(prompt.user.matches("TIPS-DOC").count(), 1);
        assert_eq!(prompt.user.matches("BEST-DOC").count(), 1);
        assert!(prompt.user.contains("ATS tips: TIPS-DOC"));
    }

    #[test]
    fn test_fill_template_keeps_unknown_and_unclosed_braces() {
        let filled = fill_template("{a} {b} {a}{ tail {", &[("a", "{b}")]);
        assert_eq!(filled, "{b} {b} {b}{ tail {");
    }
}
