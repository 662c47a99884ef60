//! Job seeker résumé.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One education entry. Degree and institution are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year: Option<String>,
}

impl Education {
    pub fn is_valid(&self) -> bool {
        !self.degree.trim().is_empty() && !self.institution.trim().is_empty()
    }
}

/// One work experience entry. Title and company are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default, alias = "jobTitle")]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub duration: Option<String>,
}

impl Experience {
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.company.trim().is_empty()
    }
}

/// A résumé. Every save replaces the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Resume {
    /// Empty résumé seeded with the contact details from signup.
    pub fn seeded(full_name: &str, email: &str, phone_number: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone_number: phone_number.to_string(),
            ..Default::default()
        }
    }

    /// A profile counts as complete once at least one skill is listed.
    pub fn is_complete(&self) -> bool {
        self.skills.iter().any(|s| !s.trim().is_empty())
    }

    /// Per-field problems that block saving from the résumé builder.
    ///
    /// Empty map means the résumé is acceptable.
    pub fn validation_errors(&self) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();

        if self.full_name.trim().is_empty() {
            errors.insert("fullName".to_string(), "Full name is required".to_string());
        }
        if self.email.trim().is_empty() {
            errors.insert("email".to_string(), "Email is required".to_string());
        }
        if self.education.is_empty() {
            errors.insert(
                "education".to_string(),
                "At least one education entry is required".to_string(),
            );
        } else if let Some(i) = self.education.iter().position(|e| !e.is_valid()) {
            errors.insert(
                "education".to_string(),
                format!("Education entry {} needs a degree and an institution", i + 1),
            );
        }
        if self.experience.is_empty() {
            errors.insert(
                "experience".to_string(),
                "At least one experience entry is required".to_string(),
            );
        } else if let Some(i) = self.experience.iter().position(|e| !e.is_valid()) {
            errors.insert(
                "experience".to_string(),
                format!("Experience entry {} needs a title and a company", i + 1),
            );
        }
        if !self.is_complete() {
            errors.insert("skills".to_string(), "At least one skill is required".to_string());
        }

        errors
    }

    /// Drop incomplete entries and blank skills, trimming what remains.
    ///
    /// Used by the profile editor, which saves partial résumés.
    pub fn sanitized(mut self) -> Self {
        self.education.retain(Education::is_valid);
        self.experience.retain(Experience::is_valid);
        self.skills = self
            .skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Resume {
        Resume {
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone_number: "+44 1234 5678".into(),
            education: vec![Education {
                degree: "BSc".into(),
                institution: "London".into(),
                year: Some("1835".into()),
            }],
            experience: vec![Experience {
                title: "Analyst".into(),
                company: "Engines Ltd".into(),
                duration: None,
            }],
            skills: vec!["math".into()],
            updated_at: None,
        }
    }

    #[test]
    fn test_complete_resume_has_no_errors() {
        assert!(complete().validation_errors().is_empty());
    }

    #[test]
    fn test_missing_sections_are_reported_per_field() {
        let resume = Resume {
            full_name: " ".into(),
            ..Default::default()
        };
        let errors = resume.validation_errors();
        for field in ["fullName", "email", "education", "experience", "skills"] {
            assert!(errors.contains_key(field), "missing {}", field);
        }
    }

    #[test]
    fn test_invalid_entry_is_reported() {
        let mut resume = complete();
        resume.experience.push(Experience {
            title: "".into(),
            company: "Nowhere".into(),
            duration: None,
        });
        let errors = resume.validation_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors["experience"].contains("entry 2"));
    }

    #[test]
    fn test_sanitized_drops_incomplete_entries() {
        let mut resume = complete();
        resume.education.push(Education::default());
        resume.skills.push("   ".into());
        resume.skills.push(" sql ".into());

        let clean = resume.sanitized();
        assert_eq!(clean.education.len(), 1);
        assert_eq!(clean.skills, vec!["math".to_string(), "sql".to_string()]);
    }

    #[test]
    fn test_experience_accepts_job_title_alias() {
        let exp: Experience =
            serde_json::from_str(r#"{"jobTitle":"Dev","company":"Acme"}"#).unwrap();
        assert_eq!(exp.title, "Dev");
    }
}
