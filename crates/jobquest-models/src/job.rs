//! Job postings.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{ExperienceLevel, JobId, JobStatus, UserId};

/// Days a posting stays open when no deadline is given.
pub const DEFAULT_DEADLINE_DAYS: i64 = 30;

/// A job posting owned by a recruiter.
///
/// The company name and logo are not stored here; they are resolved from the
/// owning recruiter's company when the job is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub recruiter_id: UserId,
    pub title: String,
    pub industry: String,
    pub job_type: String,
    pub experience: ExperienceLevel,
    /// Free text, e.g. "$40,000 - $50,000" or "Not specified".
    pub salary: String,
    pub location: String,
    pub description: String,
    pub status: JobStatus,
    pub application_deadline: DateTime<Utc>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Default deadline for a posting created at `now`.
    pub fn default_deadline(now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(DEFAULT_DEADLINE_DAYS)
    }

    /// Open for applications: active and the deadline has not passed.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Active && now < self.application_deadline
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.recruiter_id == user_id
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn job(title: &str) -> Job {
        let now = Utc::now();
        Job {
            id: JobId::new(),
            recruiter_id: UserId::from("recruiter-1"),
            title: title.to_string(),
            industry: "Technology".to_string(),
            job_type: "full-time".to_string(),
            experience: ExperienceLevel::Entry,
            salary: "$40,000 - $50,000".to_string(),
            location: "Remote".to_string(),
            description: format!("{} role", title),
            status: JobStatus::Active,
            application_deadline: Job::default_deadline(now),
            skills: vec!["rust".to_string()],
            requirements: vec!["2 years".to_string()],
            responsibilities: vec!["ship".to_string()],
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::job;
    use super::*;

    #[test]
    fn test_availability_requires_active_and_future_deadline() {
        let now = Utc::now();
        let mut j = job("Backend Engineer");
        assert!(j.is_available(now));

        j.status = JobStatus::Inactive;
        assert!(!j.is_available(now));

        j.status = JobStatus::Active;
        j.application_deadline = now - Duration::seconds(1);
        assert!(!j.is_available(now));

        j.application_deadline = now;
        assert!(!j.is_available(now));
    }

    #[test]
    fn test_default_deadline_is_thirty_days_out() {
        let now = Utc::now();
        assert_eq!(Job::default_deadline(now) - now, Duration::days(30));
    }
}
