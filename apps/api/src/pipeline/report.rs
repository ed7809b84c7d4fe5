//! Markdown report assembly.

use crate::models::{AnalysisReport, RewrittenSections, SectionRewrite};

const TITLE: &str = "## CV Tailor Report";
const ATTRIBUTION: &str = "_Generated by CV Tailor._";

/// Renders the final report. Sections blank on both sides are left out.
pub fn render_report(analysis: &AnalysisReport, rewrites: &RewrittenSections) -> String {
    let mut lines: Vec<String> = vec![TITLE.to_string()];

    lines.push("### Overall Match & ATS Readiness".to_string());
    lines.push(format!("- Match level: {}", analysis.match_level));
    lines.push(format!(
        "- ATS readiness: {}",
        non_empty(&analysis.ats_readiness).unwrap_or("Unknown")
    ));
    if !analysis.missing_keywords.is_empty() {
        lines.push(format!(
            "- Missing keywords: {}",
            analysis.missing_keywords.join(", ")
        ));
    }
    if !analysis.strengths.is_empty() {
        lines.push(format!("- Strengths: {}", analysis.strengths.join("; ")));
    }
    if !analysis.issues.is_empty() {
        lines.push(format!("- Issues: {}", analysis.issues.join("; ")));
    }

    if !analysis.improvement_opportunities.is_empty() {
        lines.push(String::new());
        lines.push("**Improvement opportunities**".to_string());
        lines.extend(
            analysis
                .improvement_opportunities
                .iter()
                .map(|tip| format!("- {tip}")),
        );
    }

    for (title, section) in [("Summary", &rewrites.summary), ("Skills", &rewrites.skills)] {
        if section.is_blank() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("### {title}"));
        push_rewrite(&mut lines, section);
    }

    let experience: Vec<&SectionRewrite> =
        rewrites.experience.iter().filter(|s| !s.is_blank()).collect();
    if !experience.is_empty() {
        lines.push(String::new());
        lines.push("### Experience".to_string());
        for (idx, item) in experience.into_iter().enumerate() {
            lines.push(format!("#### Role {}", idx + 1));
            push_rewrite(&mut lines, item);
            lines.push(String::new());
        }
    }

    lines.push(ATTRIBUTION.to_string());
    lines.join("\n")
}

fn push_rewrite(lines: &mut Vec<String>, section: &SectionRewrite) {
    if let Some(before) = section.before.as_deref().and_then(non_empty) {
        lines.push("**Before**".to_string());
        lines.push(before.to_string());
    }
    if let Some(after) = section.after.as_deref().and_then(non_empty) {
        lines.push(String::new());
        lines.push("**After**".to_string());
        lines.push(after.to_string());
    }
    if let Some(why) = section.explanation.as_deref().and_then(non_empty) {
        lines.push(String::new());
        lines.push(format!("_Why:_ {why}"));
    }
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchLevel;

    fn rewrite(before: &str, after: &str) -> SectionRewrite {
        SectionRewrite {
            before: Some(before.into()),
            after: Some(after.into()),
            explanation: Some("clearer".into()),
        }
    }

    #[test]
    fn test_minimal_report_has_title_readiness_and_attribution() {
        let report = render_report(&AnalysisReport::default(), &RewrittenSections::default());
        assert_eq!(
            report,
            "## CV Tailor Report\n### Overall Match & ATS Readiness\n- Match level: Unknown\n- ATS readiness: Unknown\n_Generated by CV Tailor._"
        );
    }

    #[test]
    fn test_full_report_layout() {
        let analysis = AnalysisReport {
            match_level: MatchLevel::Medium,
            ats_readiness: "Needs work".into(),
            missing_keywords: vec!["Kubernetes".into(), "Helm".into()],
            strengths: vec!["Summary present".into(), "Skills detected".into()],
            issues: vec!["Skills section missing.".into()],
            improvement_opportunities: vec!["Add metrics.".into()],
        };
        let rewrites = RewrittenSections {
            summary: rewrite(" old summary ", "new summary"),
            skills: SectionRewrite::default(),
            experience: vec![SectionRewrite::default(), rewrite("did", "delivered")],
            final_markdown: String::new(),
        };

        let report = render_report(&analysis, &rewrites);
        assert!(report.contains("- Match level: Medium\n- ATS readiness: Needs work\n"));
        assert!(report.contains("- Missing keywords: Kubernetes, Helm\n"));
        assert!(report.contains("- Strengths: Summary present; Skills detected\n"));
        assert!(report.contains("\n\n**Improvement opportunities**\n- Add metrics.\n"));
        assert!(report.contains(
            "### Summary\n**Before**\nold summary\n\n**After**\nnew summary\n\n_Why:_ clearer"
        ));
        assert!(!report.contains("### Skills"));
        assert!(report.contains("### Experience\n#### Role 1\n**Before**\ndid\n"));
        assert!(!report.contains("#### Role 2"));
        assert!(report.ends_with("\n\n_Generated by CV Tailor._"));
    }

    #[test]
    fn test_blank_experience_block_is_omitted() {
        let rewrites = RewrittenSections {
            experience: vec![SectionRewrite {
                before: Some("  ".into()),
                after: None,
                explanation: Some("ignored".into()),
            }],
            ..Default::default()
        };
        let report = render_report(&AnalysisReport::default(), &rewrites);
        assert!(!report.contains("### Experience"));
        assert!(!report.contains("ignored"));
    }
}
