//! Job posting status.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ModelError;

/// Whether a posting is open to applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum JobStatus {
    /// Visible and accepting applications
    #[default]
    Active,
    /// Closed by the recruiter or an admin
    Inactive,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "Active",
            JobStatus::Inactive => "Inactive",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(JobStatus::Active),
            "inactive" | "closed" => Ok(JobStatus::Inactive),
            _ => Err(ModelError::InvalidJobStatus(s.to_string())),
        }
    }
}
