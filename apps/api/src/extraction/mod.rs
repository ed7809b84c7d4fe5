// Extraction engine: turns raw résumé bytes and posting text into typed records.
// Everything here is deterministic and makes no network calls.

pub mod document;
pub mod posting_parser;
pub mod resume_parser;

/// Characters that open a bullet line.
pub(crate) const BULLET_MARKERS: [char; 3] = ['-', '•', '*'];

pub(crate) fn starts_with_bullet(line: &str) -> bool {
    line.starts_with(BULLET_MARKERS)
}

/// Strips leading bullet markers and spaces, then trims the remainder.
pub(crate) fn strip_bullet(line: &str) -> &str {
    line.trim_start_matches(|c: char| BULLET_MARKERS.contains(&c) || c == ' ')
        .trim()
}
