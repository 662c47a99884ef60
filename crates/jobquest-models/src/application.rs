//! Applications and the review status workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ModelError;
use crate::{ApplicationId, JobId, UserId};

/// Review status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ApplicationStatus {
    /// Waiting for the recruiter
    #[default]
    Pending,
    /// Recruiter is working on it
    Processing,
    /// Candidate accepted
    Approved,
    /// Candidate rejected
    #[serde(rename = "Not Hired")]
    NotHired,
}

impl ApplicationStatus {
    /// All statuses, in workflow order.
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Processing,
        ApplicationStatus::Approved,
        ApplicationStatus::NotHired,
    ];

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Processing => "Processing",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::NotHired => "Not Hired",
        }
    }

    /// Human-readable message shown to the job seeker.
    pub fn message(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Your application is being reviewed.",
            ApplicationStatus::Approved => "Congratulations! Your application has been approved.",
            ApplicationStatus::NotHired => {
                "Thank you for your interest. Unfortunately, we have decided to move forward with other candidates."
            }
            ApplicationStatus::Processing => {
                "Your application is currently being processed. We will update you soon."
            }
        }
    }

    /// Approved and Not Hired end the review by convention.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::NotHired)
    }

    /// Comma-separated list of accepted values, for error messages.
    pub fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| ModelError::InvalidApplicationStatus(s.to_string()))
    }
}

/// Which status changes a recruiter may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may be reassigned to any other.
    #[default]
    Permissive,
    /// Approved and Not Hired are final.
    Strict,
}

impl TransitionPolicy {
    /// Check whether moving from `from` to `to` is allowed.
    pub fn allows(&self, from: ApplicationStatus, to: ApplicationStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => !from.is_terminal() || from == to,
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" | "terminal-locked" => Ok(TransitionPolicy::Strict),
            other => Err(format!("unknown transition policy: {}", other)),
        }
    }
}

/// A job seeker's application to a job, reviewed by the job's recruiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub job_seeker_id: UserId,
    pub recruiter_id: UserId,
    pub job_id: JobId,
    pub status: ApplicationStatus,
    pub status_message: String,
    pub notification_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Create a pending application. The recruiter is copied from the job owner.
    pub fn new(job_seeker_id: UserId, job_id: JobId, recruiter_id: UserId) -> Self {
        let now = Utc::now();
        let status = ApplicationStatus::Pending;
        Self {
            id: ApplicationId::for_pair(&job_seeker_id, &job_id),
            job_seeker_id,
            recruiter_id,
            job_id,
            status,
            status_message: status.message().to_string(),
            notification_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status change: recompute the message, clear the notification
    /// flag and bump `updated_at`.
    pub fn set_status(&mut self, status: ApplicationStatus) {
        self.status = status;
        self.status_message = status.message().to_string();
        self.notification_sent = false;
        self.updated_at = Utc::now();
    }
}
