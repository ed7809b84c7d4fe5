use serde::{Deserialize, Serialize};

/// Structured view of a job posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedPosting {
    pub role_title: Option<String>,
    pub responsibilities: Vec<String>,
    pub required_skills: Vec<String>,
    pub nice_to_have_skills: Vec<String>,
    pub raw_text: String,
}
