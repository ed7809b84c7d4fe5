//! Posting parser: extracts role title and labelled sections from a job posting.
//!
//! Heuristic and deterministic. The reasoning gateway only ever sees the
//! sections recovered here.

use crate::extraction::{starts_with_bullet, strip_bullet};
use crate::models::ParsedPosting;

const RESPONSIBILITY_HEADERS: &[&str] = &["responsibilities", "what you'll do"];
const REQUIRED_HEADERS: &[&str] = &["requirements", "required", "must have"];
const NICE_TO_HAVE_HEADERS: &[&str] = &["nice to have", "preferred", "bonus"];

/// Cap on bullets collected when no responsibilities header exists.
const FALLBACK_BULLET_LIMIT: usize = 8;
/// Lines scanned for `label: a, b, c` keywords when no requirements header exists.
const FALLBACK_SCAN_LINES: usize = 20;
const FALLBACK_KEYWORD_LIMIT: usize = 10;

/// Parses a raw job posting into a `ParsedPosting`.
pub fn parse_posting(text: &str) -> ParsedPosting {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut responsibilities = extract_section_lines(text, RESPONSIBILITY_HEADERS);
    let mut required_skills = extract_section_lines(text, REQUIRED_HEADERS);
    let nice_to_have_skills = extract_section_lines(text, NICE_TO_HAVE_HEADERS);

    if responsibilities.is_empty() {
        responsibilities = fallback_bullets(&lines);
    }
    if required_skills.is_empty() {
        required_skills = fallback_keywords(&lines);
    }

    ParsedPosting {
        role_title: lines.first().map(|l| l.to_string()),
        responsibilities,
        required_skills,
        nice_to_have_skills,
        raw_text: text.to_string(),
    }
}

/// Collects the lines following a header line until the next blank line.
///
/// A header matches when the lowercased line contains any of `headers`. A later
/// header match restarts collection; blank lines before the first collected
/// line are skipped.
fn extract_section_lines(text: &str, headers: &[&str]) -> Vec<String> {
    let mut collecting = false;
    let mut collected = Vec::new();

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            if collecting && !collected.is_empty() {
                break;
            }
            continue;
        }

        let lowered = stripped.to_lowercase();
        if headers.iter().any(|h| lowered.contains(h)) {
            collecting = true;
            collected.clear();
            continue;
        }

        if collecting {
            if starts_with_bullet(stripped) {
                collected.push(strip_bullet(stripped).to_string());
            } else {
                collected.push(stripped.to_string());
            }
        }
    }

    collected
}

fn fallback_bullets(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .filter(|l| starts_with_bullet(l))
        .take(FALLBACK_BULLET_LIMIT)
        .map(|l| strip_bullet(l).to_string())
        .collect()
}

fn fallback_keywords(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .take(FALLBACK_SCAN_LINES)
        .filter_map(|l| l.split_once(':').map(|(_, tail)| tail))
        .flat_map(|tail| tail.split(','))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .take(FALLBACK_KEYWORD_LIMIT)
        .map(str::to_string)
        .collect()
}
