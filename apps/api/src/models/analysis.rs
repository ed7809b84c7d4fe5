use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How well the résumé covers the posting's required skills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchLevel {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl MatchLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLevel::High => "High",
            MatchLevel::Medium => "Medium",
            MatchLevel::Low => "Low",
            MatchLevel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MatchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(MatchLevel::High),
            "medium" => Ok(MatchLevel::Medium),
            "low" => Ok(MatchLevel::Low),
            "unknown" => Ok(MatchLevel::Unknown),
            other => Err(format!("unrecognised match level '{other}'")),
        }
    }
}

/// Findings of the analysis stage, produced once per pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub match_level: MatchLevel,
    pub ats_readiness: String,
    pub missing_keywords: Vec<String>,
    pub strengths: Vec<String>,
    pub issues: Vec<String>,
    pub improvement_opportunities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_level_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<MatchLevel>().unwrap(), MatchLevel::High);
        assert_eq!(" medium ".parse::<MatchLevel>().unwrap(), MatchLevel::Medium);
        assert_eq!("Low".parse::<MatchLevel>().unwrap(), MatchLevel::Low);
        assert!("Medium-High".parse::<MatchLevel>().is_err());
    }

    #[test]
    fn test_match_level_serializes_as_label() {
        let json = serde_json::to_string(&MatchLevel::Medium).unwrap();
        assert_eq!(json, r#""Medium""#);
        assert_eq!(MatchLevel::default(), MatchLevel::Unknown);
    }
}
