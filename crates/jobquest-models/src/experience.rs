//! Experience levels for job postings.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ModelError;

/// Seniority required for a job.
///
/// Stored and serialized in long form ("Entry Level"); facets use the short
/// form ("Entry").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ExperienceLevel {
    #[default]
    #[serde(rename = "Entry Level")]
    Entry,
    #[serde(rename = "Mid Level")]
    Mid,
    #[serde(rename = "Senior Level")]
    Senior,
    #[serde(rename = "Executive")]
    Executive,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::Entry,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
        ExperienceLevel::Executive,
    ];

    /// Long form, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry Level",
            ExperienceLevel::Mid => "Mid Level",
            ExperienceLevel::Senior => "Senior Level",
            ExperienceLevel::Executive => "Executive",
        }
    }

    /// Short form used for filter facets.
    pub fn short_form(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Executive => "Executive",
        }
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = ModelError;

    /// Accepts long or short form, case-insensitively ("Mid Level", "mid", "mid-level").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', " ");
        let normalized = normalized.trim_end_matches(" level");
        match normalized {
            "entry" => Ok(ExperienceLevel::Entry),
            "mid" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            "executive" => Ok(ExperienceLevel::Executive),
            _ => Err(ModelError::InvalidExperience(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_form_table() {
        let pairs: Vec<_> = ExperienceLevel::ALL
            .iter()
            .map(|l| (l.as_str(), l.short_form()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Entry Level", "Entry"),
                ("Mid Level", "Mid"),
                ("Senior Level", "Senior"),
                ("Executive", "Executive"),
            ]
        );
    }

    #[test]
    fn test_parse_accepts_both_forms() {
        assert_eq!("Senior Level".parse(), Ok(ExperienceLevel::Senior));
        assert_eq!("senior".parse(), Ok(ExperienceLevel::Senior));
        assert_eq!("entry-level".parse(), Ok(ExperienceLevel::Entry));
        assert_eq!("Executive".parse(), Ok(ExperienceLevel::Executive));
        assert!("Intern".parse::<ExperienceLevel>().is_err());
        assert!("".parse::<ExperienceLevel>().is_err());
    }
}
