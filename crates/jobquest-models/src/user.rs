//! User accounts and role-specific profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ModelError;
use crate::{Company, JobId, Resume, UserId};

/// Picture used when a user has not uploaded one.
pub const DEFAULT_PROFILE_PICTURE: &str = "/uploads/profiles/default-profile.jpg";

/// Account role, fixed at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Job Seeker")]
    JobSeeker,
    #[serde(rename = "Recruiter")]
    Recruiter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::JobSeeker => "Job Seeker",
            Role::Recruiter => "Recruiter",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "job seeker" | "jobseeker" => Ok(Role::JobSeeker),
            "recruiter" => Ok(Role::Recruiter),
            _ => Err(ModelError::InvalidRole(s.to_string())),
        }
    }
}

/// Admin review state of a job seeker account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CandidateStatus {
    #[default]
    Reviewing,
    Approved,
    Rejected,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Reviewing => "Reviewing",
            CandidateStatus::Approved => "Approved",
            CandidateStatus::Rejected => "Rejected",
        }
    }
}

impl FromStr for CandidateStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Reviewing" => Ok(CandidateStatus::Reviewing),
            "Approved" => Ok(CandidateStatus::Approved),
            "Rejected" => Ok(CandidateStatus::Rejected),
            other => Err(ModelError::InvalidCandidateStatus(other.to_string())),
        }
    }
}

/// Role-specific part of a user. The variant is the role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum Profile {
    #[serde(rename = "Job Seeker")]
    JobSeeker {
        #[serde(default)]
        resume: Option<Resume>,
    },
    #[serde(rename = "Recruiter")]
    Recruiter {
        #[serde(default)]
        company: Option<Company>,
    },
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::JobSeeker { .. } => Role::JobSeeker,
            Profile::Recruiter { .. } => Role::Recruiter,
        }
    }

    /// Where the client should land after login, and whether setup is done.
    pub fn landing(&self) -> (bool, &'static str) {
        match self {
            Profile::JobSeeker { resume } => {
                if resume.as_ref().is_some_and(Resume::is_complete) {
                    (true, "/jobs")
                } else {
                    (false, "/resume-builder")
                }
            }
            Profile::Recruiter { company } => {
                if company.as_ref().is_some_and(Company::is_complete) {
                    (true, "/recruiter-dashboard")
                } else {
                    (false, "/company-setup")
                }
            }
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Normalized (trimmed, lower-case).
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub phone_number: String,
    pub profile_picture: String,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub saved_jobs: Vec<JobId>,
    #[serde(skip_serializing, default)]
    pub reset_password_expiry: Option<DateTime<Utc>>,
    /// Only meaningful for job seekers; set from the admin panel.
    #[serde(skip_serializing, default)]
    pub review_status: CandidateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new account with the given profile.
    pub fn new(
        email: &str,
        password_hash: impl Into<String>,
        full_name: impl Into<String>,
        phone_number: impl Into<String>,
        profile: Profile,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email: normalize_email(email),
            password_hash: password_hash.into(),
            full_name: full_name.into(),
            phone_number: phone_number.into(),
            profile_picture: DEFAULT_PROFILE_PICTURE.to_string(),
            profile,
            saved_jobs: Vec::new(),
            reset_password_expiry: None,
            review_status: CandidateStatus::Reviewing,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn resume(&self) -> Option<&Resume> {
        match &self.profile {
            Profile::JobSeeker { resume } => resume.as_ref(),
            Profile::Recruiter { .. } => None,
        }
    }

    pub fn company(&self) -> Option<&Company> {
        match &self.profile {
            Profile::Recruiter { company } => company.as_ref(),
            Profile::JobSeeker { .. } => None,
        }
    }

    /// A temporary password issued by a reset is only valid until its expiry.
    pub fn password_expired(&self, now: DateTime<Utc>) -> bool {
        self.reset_password_expiry.is_some_and(|expiry| now >= expiry)
    }

    /// Add a job to the saved set. Returns false if it was already saved.
    pub fn save_job(&mut self, job_id: JobId) -> bool {
        if self.saved_jobs.contains(&job_id) {
            return false;
        }
        self.saved_jobs.push(job_id);
        true
    }

    /// Remove a job from the saved set. Returns false if it was not saved.
    pub fn unsave_job(&mut self, job_id: &JobId) -> bool {
        let before = self.saved_jobs.len();
        self.saved_jobs.retain(|id| id != job_id);
        self.saved_jobs.len() != before
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn seeker() -> User {
        User::new(
            "  Ada@Example.COM ",
            "hash",
            "Ada",
            "+1 555 0100",
            Profile::JobSeeker { resume: None },
        )
    }

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(seeker().email, "ada@example.com");
        assert_eq!(normalize_email("\tBob@X.io"), "bob@x.io");
    }

    #[test]
    fn test_role_follows_profile() {
        assert_eq!(seeker().role(), Role::JobSeeker);
        let recruiter = User::new(
            "r@x.io",
            "hash",
            "Rita",
            "555",
            Profile::Recruiter {
                company: Some(Company::new("Acme", "Rockets")),
            },
        );
        assert_eq!(recruiter.role(), Role::Recruiter);
        assert_eq!(recruiter.company().map(|c| c.name.as_str()), Some("Acme"));
        assert!(recruiter.resume().is_none());
    }

    #[test]
    fn test_landing_paths() {
        assert_eq!(
            Profile::JobSeeker { resume: None }.landing(),
            (false, "/resume-builder")
        );
        let mut resume = Resume::default();
        resume.skills.push("rust".into());
        assert_eq!(
            Profile::JobSeeker {
                resume: Some(resume)
            }
            .landing(),
            (true, "/jobs")
        );
        assert_eq!(
            Profile::Recruiter { company: None }.landing(),
            (false, "/company-setup")
        );
        assert_eq!(
            Profile::Recruiter {
                company: Some(Company::new("Acme", "Rockets"))
            }
            .landing(),
            (true, "/recruiter-dashboard")
        );
    }

    #[test]
    fn test_serialized_user_hides_secrets_and_tags_role() {
        let mut user = seeker();
        user.reset_password_expiry = Some(Utc::now());
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["role"], "Job Seeker");
        assert_eq!(json["fullName"], "Ada");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("resetPasswordExpiry").is_none());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Job Seeker".parse(), Ok(Role::JobSeeker));
        assert_eq!("job_seeker".parse(), Ok(Role::JobSeeker));
        assert_eq!("Recruiter".parse(), Ok(Role::Recruiter));
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_candidate_status_defaults_to_reviewing() {
        let user = seeker();
        assert_eq!(user.review_status, CandidateStatus::Reviewing);
        assert_eq!("Approved".parse(), Ok(CandidateStatus::Approved));
        assert_eq!(
            "Hired".parse::<CandidateStatus>(),
            Err(ModelError::InvalidCandidateStatus("Hired".into()))
        );
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("reviewStatus").is_none());
    }

    #[test]
    fn test_saved_jobs_have_set_semantics() {
        let mut user = seeker();
        assert!(user.save_job(JobId::from("a")));
        assert!(!user.save_job(JobId::from("a")));
        assert_eq!(user.saved_jobs.len(), 1);
        assert!(user.unsave_job(&JobId::from("a")));
        assert!(!user.unsave_job(&JobId::from("a")));
    }

    #[test]
    fn test_password_expiry() {
        let now = Utc::now();
        let mut user = seeker();
        assert!(!user.password_expired(now));
        user.reset_password_expiry = Some(now + Duration::minutes(10));
        assert!(!user.password_expired(now));
        assert!(user.password_expired(now + Duration::minutes(11)));
    }
}
