//! Recruiter company profile.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ModelError;

/// Logo used when a company has not uploaded one.
pub const DEFAULT_COMPANY_LOGO: &str = "/uploads/profiles/default-company.jpg";

/// Listing state of a company, managed from the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CompanyStatus {
    #[default]
    Active,
    Inactive,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Active => "Active",
            CompanyStatus::Inactive => "Inactive",
        }
    }
}

impl FromStr for CompanyStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(CompanyStatus::Active),
            "Inactive" => Ok(CompanyStatus::Inactive),
            other => Err(ModelError::InvalidCompanyStatus(other.to_string())),
        }
    }
}

/// Company attached to a recruiter account. `name` and `description` are mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub employees: Option<u32>,
    #[serde(default = "default_logo")]
    pub logo: String,
    #[serde(default)]
    pub status: CompanyStatus,
}

fn default_logo() -> String {
    DEFAULT_COMPANY_LOGO.to_string()
}

impl Company {
    /// Create a company with only the mandatory fields set.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            location: None,
            website: None,
            industry: None,
            size: None,
            employees: None,
            logo: default_logo(),
            status: CompanyStatus::Active,
        }
    }

    /// Mandatory fields are present and non-blank.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.description.trim().is_empty()
    }
}
