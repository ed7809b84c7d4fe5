use serde::{Deserialize, Serialize};

/// Before/after pair for one rewritten section, with the rationale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionRewrite {
    pub before: Option<String>,
    pub after: Option<String>,
    pub explanation: Option<String>,
}

impl SectionRewrite {
    /// True when neither side carries any text.
    pub fn is_blank(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().map_or(true, |t| t.trim().is_empty());
        blank(&self.before) && blank(&self.after)
    }
}

/// Output of the rewriting stage. Built once, never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewrittenSections {
    pub summary: SectionRewrite,
    pub skills: SectionRewrite,
    pub experience: Vec<SectionRewrite>,
    pub final_markdown: String,
}
