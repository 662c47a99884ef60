//! Storage contracts used by the API.
//!
//! Two implementations exist: [`crate::FirestoreStore`] for deployments and
//! [`crate::MemoryStore`] for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use jobquest_models::{
    AdminSettings, Application, ApplicationId, Job, JobId, JobStatus, Resume, Role, User, UserId,
};

use crate::error::FirestoreError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (email taken, duplicate application).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored record could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Firestore(FirestoreError),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl From<FirestoreError> for StoreError {
    fn from(e: FirestoreError) -> Self {
        match e {
            FirestoreError::AlreadyExists(msg) | FirestoreError::PreconditionFailed(msg) => {
                StoreError::Conflict(msg)
            }
            FirestoreError::NotFound(msg) => StoreError::NotFound(msg),
            FirestoreError::InvalidResponse(msg) => StoreError::Corrupt(msg),
            other => StoreError::Firestore(other),
        }
    }
}

/// Which applications to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationFilter {
    All,
    BySeeker(UserId),
    ByRecruiter(UserId),
    ByJob(JobId),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. `Conflict` if the email is already registered.
    async fn create_user(&self, user: &User) -> StoreResult<()>;

    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Look up by normalized email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Overwrite an existing user. `NotFound` if absent, `Conflict` if a
    /// changed email belongs to someone else.
    async fn update_user(&self, user: &User) -> StoreResult<()>;

    /// All users, optionally restricted to one role.
    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>>;

    /// Users for the given ids, skipping unknown ones.
    async fn get_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>>;
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Store the résumé record and the copy embedded in the owner's profile
    /// together. `NotFound` if the user does not exist.
    async fn save_resume(&self, user_id: &UserId, resume: &Resume) -> StoreResult<()>;

    async fn get_resume(&self, user_id: &UserId) -> StoreResult<Option<Resume>>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: &Job) -> StoreResult<()>;

    async fn get_job(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// Overwrite an existing job. `NotFound` if absent.
    async fn update_job(&self, job: &Job) -> StoreResult<()>;

    /// All jobs, optionally restricted to one listing status.
    async fn list_jobs(&self, status: Option<JobStatus>) -> StoreResult<Vec<Job>>;

    async fn list_jobs_by_recruiter(&self, recruiter_id: &UserId) -> StoreResult<Vec<Job>>;

    /// Jobs for the given ids, skipping unknown ones.
    async fn get_jobs(&self, ids: &[JobId]) -> StoreResult<Vec<Job>>;

    /// The `limit` most recently created jobs, newest first.
    async fn recent_jobs(&self, limit: usize) -> StoreResult<Vec<Job>>;

    /// Set the listing status of every given job in one atomic write,
    /// touching only `status` and `updated_at`. `NotFound` if any is absent.
    async fn set_jobs_status(
        &self,
        ids: &[JobId],
        status: JobStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Delete a job together with its applications. `NotFound` if absent.
    async fn delete_job(&self, id: &JobId) -> StoreResult<()>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert a new application. `Conflict` if the seeker already applied.
    async fn create_application(&self, application: &Application) -> StoreResult<()>;

    async fn get_application(&self, id: &ApplicationId) -> StoreResult<Option<Application>>;

    /// Overwrite an existing application. `NotFound` if absent.
    async fn update_application(&self, application: &Application) -> StoreResult<()>;

    async fn list_applications(&self, filter: ApplicationFilter) -> StoreResult<Vec<Application>>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// `None` until the admin first saves settings.
    async fn get_admin_settings(&self) -> StoreResult<Option<AdminSettings>>;

    async fn save_admin_settings(&self, settings: &AdminSettings) -> StoreResult<()>;
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait DataStore: UserStore + ResumeStore + JobStore + ApplicationStore + SettingsStore {
    /// Readiness check.
    async fn ping(&self) -> StoreResult<()>;

    /// Backend name for logs.
    fn backend(&self) -> &'static str;
}
