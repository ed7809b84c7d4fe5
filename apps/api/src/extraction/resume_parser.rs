//! Résumé parser: heuristic extraction of summary, skills, and experience blocks.
//!
//! The text is segmented on blank lines (`\n\n`). Nothing here fails: empty or
//! unrecognisable input yields an empty `StructuredCv`.

use std::collections::HashSet;

use crate::extraction::{starts_with_bullet, strip_bullet, BULLET_MARKERS};
use crate::models::{ExperienceEntry, StructuredCv};

/// Skill-section markers, tried in this order. The first marker present anywhere wins.
const SKILL_MARKERS: [&str; 4] = ["technical skills", "skills", "tech stack", "technologies"];

/// Substrings that flag a block as experience.
const EXPERIENCE_HINTS: [&str; 2] = ["experience", "responsibilities"];

/// Parses raw résumé text into a `StructuredCv`.
pub fn parse_resume(raw_text: &str) -> StructuredCv {
    let text = raw_text.replace("\r\n", "\n");
    StructuredCv {
        summary: extract_summary(&text),
        skills: extract_skills(&text),
        experience: extract_experience(&text),
        raw_text: text,
    }
}

fn blocks(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").map(str::trim).filter(|b| !b.is_empty())
}

/// First non-empty paragraph.
pub fn extract_summary(text: &str) -> Option<String> {
    blocks(text).next().map(str::to_string)
}

/// Skills listed in the first skill section, deduplicated case-insensitively in first-seen order.
pub fn extract_skills(text: &str) -> Vec<String> {
    // ASCII lowering keeps byte offsets aligned with `text`.
    let lowered = text.to_ascii_lowercase();
    let Some(start) = SKILL_MARKERS.iter().find_map(|m| lowered.find(m)) else {
        return Vec::new();
    };

    let section = text[start..].split("\n\n").next().unwrap_or_default();
    let section = section.split_once(':').map_or(section, |(_, tail)| tail);

    let mut seen = HashSet::new();
    section
        .split([',', '\n'])
        .map(|token| token.trim_matches(|c: char| c.is_whitespace() || BULLET_MARKERS.contains(&c)))
        .filter(|token| token.chars().count() > 1)
        .filter(|token| seen.insert(token.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Every block that looks like a role, with its bullet lines.
pub fn extract_experience(text: &str) -> Vec<ExperienceEntry> {
    blocks(text)
        .filter(|block| looks_like_experience(block))
        .map(|block| {
            let lines: Vec<&str> = block
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();
            let bullets = lines
                .iter()
                .skip(1)
                .filter(|l| starts_with_bullet(l))
                .map(|l| strip_bullet(l).to_string())
                .collect();
            ExperienceEntry {
                role: lines.first().map(|l| l.to_string()),
                bullets,
                raw_text: block.to_string(),
            }
        })
        .collect()
}

fn looks_like_experience(block: &str) -> bool {
    let lowered = block.to_lowercase();
    if EXPERIENCE_HINTS.iter().any(|hint| lowered.contains(hint)) {
        return true;
    }
    // digits are usually dates
    if block.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    starts_with_bullet(block.trim_start())
}
