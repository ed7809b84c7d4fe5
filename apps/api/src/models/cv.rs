use serde::{Deserialize, Serialize};

/// A single role or position block recovered from the résumé text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub role: Option<String>,
    pub bullets: Vec<String>,
    pub raw_text: String,
}

/// Structured view of a résumé.
///
/// `skills` never holds two entries that are equal under case-folding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredCv {
    pub summary: Option<String>,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub raw_text: String,
}

impl StructuredCv {
    /// Skills joined for display, `None` when no skills were found.
    pub fn skills_line(&self) -> Option<String> {
        if self.skills.is_empty() {
            None
        } else {
            Some(self.skills.join(", "))
        }
    }
}
