pub mod analysis;
pub mod cv;
pub mod posting;
pub mod rewrite;

pub use analysis::{AnalysisReport, MatchLevel};
pub use cv::{ExperienceEntry, StructuredCv};
pub use posting::ParsedPosting;
pub use rewrite::{RewrittenSections, SectionRewrite};
