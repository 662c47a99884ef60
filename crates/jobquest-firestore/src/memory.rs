//! In-memory [`DataStore`] for tests and local development.
//!
//! Enforces the same uniqueness rules as the Firestore store: one account
//! per email and one application per seeker and job.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use chrono::{DateTime, Utc};
use jobquest_models::{
    normalize_email, AdminSettings, Application, ApplicationId, Job, JobId, JobStatus, Profile,
    Resume, Role, User, UserId,
};

use crate::store::{
    ApplicationFilter, ApplicationStore, DataStore, JobStore, ResumeStore, SettingsStore,
    StoreError, StoreResult, UserStore,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    emails: HashMap<String, UserId>,
    resumes: HashMap<UserId, Resume>,
    jobs: HashMap<JobId, Job>,
    applications: HashMap<ApplicationId, Application>,
    admin_settings: Option<AdminSettings>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let email = normalize_email(&user.email);
        if tables.emails.contains_key(&email) {
            return Err(StoreError::conflict(format!("email {} already registered", email)));
        }
        if tables.users.contains_key(&user.id) {
            return Err(StoreError::conflict(format!("user {} exists", user.id)));
        }
        tables.emails.insert(email, user.id.clone());
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .get(&normalize_email(email))
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let current_email = tables
            .users
            .get(&user.id)
            .map(|u| u.email.clone())
            .ok_or_else(|| StoreError::not_found(format!("user {}", user.id)))?;

        let email = normalize_email(&user.email);
        if email != current_email {
            if tables.emails.contains_key(&email) {
                return Err(StoreError::conflict(format!("email {} already registered", email)));
            }
            tables.emails.remove(&current_email);
            tables.emails.insert(email, user.id.clone());
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        let users = tables
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role() == r))
            .cloned()
            .collect();
        Ok(newest_first(users, |u: &User| u.created_at))
    }

    async fn get_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.users.get(id).cloned()).collect())
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn save_resume(&self, user_id: &UserId, resume: &Resume) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::not_found(format!("user {}", user_id)))?;
        user.profile = Profile::JobSeeker {
            resume: Some(resume.clone()),
        };
        user.updated_at = resume.updated_at.unwrap_or(user.updated_at);
        tables.resumes.insert(user_id.clone(), resume.clone());
        Ok(())
    }

    async fn get_resume(&self, user_id: &UserId) -> StoreResult<Option<Resume>> {
        Ok(self.tables.read().await.resumes.get(user_id).cloned())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, job: &Job) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.jobs.contains_key(&job.id) {
            return Err(StoreError::conflict(format!("job {} exists", job.id)));
        }
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Option<Job>> {
        Ok(self.tables.read().await.jobs.get(id).cloned())
    }

    async fn update_job(&self, job: &Job) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.jobs.get_mut(&job.id) {
            Some(existing) => {
                *existing = job.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(format!("job {}", job.id))),
        }
    }

    async fn list_jobs(&self, status: Option<JobStatus>) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read().await;
        let jobs = tables
            .jobs
            .values()
            .filter(|j| status.map_or(true, |s| j.status == s))
            .cloned()
            .collect();
        Ok(newest_first(jobs, |j: &Job| j.created_at))
    }

    async fn list_jobs_by_recruiter(&self, recruiter_id: &UserId) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read().await;
        let jobs = tables
            .jobs
            .values()
            .filter(|j| &j.recruiter_id == recruiter_id)
            .cloned()
            .collect();
        Ok(newest_first(jobs, |j: &Job| j.created_at))
    }

    async fn get_jobs(&self, ids: &[JobId]) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.jobs.get(id).cloned()).collect())
    }

    async fn recent_jobs(&self, limit: usize) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read().await;
        let jobs = tables.jobs.values().cloned().collect();
        let mut jobs = newest_first(jobs, |j: &Job| j.created_at);
        jobs.truncate(limit);
        Ok(jobs)
    }

    async fn set_jobs_status(
        &self,
        ids: &[JobId],
        status: JobStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(missing) = ids.iter().find(|id| !tables.jobs.contains_key(*id)) {
            return Err(StoreError::not_found(format!("job {}", missing)));
        }
        for id in ids {
            if let Some(job) = tables.jobs.get_mut(id) {
                job.status = status;
                job.updated_at = at;
            }
        }
        Ok(())
    }

    async fn delete_job(&self, id: &JobId) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.jobs.remove(id).is_none() {
            return Err(StoreError::not_found(format!("job {}", id)));
        }
        tables.applications.retain(|_, a| &a.job_id != id);
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn create_application(&self, application: &Application) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.applications.contains_key(&application.id) {
            return Err(StoreError::conflict(format!(
                "application {} exists",
                application.id
            )));
        }
        tables
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(())
    }

    async fn get_application(&self, id: &ApplicationId) -> StoreResult<Option<Application>> {
        Ok(self.tables.read().await.applications.get(id).cloned())
    }

    async fn update_application(&self, application: &Application) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.applications.get_mut(&application.id) {
            Some(existing) => {
                *existing = application.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(format!(
                "application {}",
                application.id
            ))),
        }
    }

    async fn list_applications(&self, filter: ApplicationFilter) -> StoreResult<Vec<Application>> {
        let tables = self.tables.read().await;
        let applications = tables
            .applications
            .values()
            .filter(|a| match &filter {
                ApplicationFilter::All => true,
                ApplicationFilter::BySeeker(id) => &a.job_seeker_id == id,
                ApplicationFilter::ByRecruiter(id) => &a.recruiter_id == id,
                ApplicationFilter::ByJob(id) => &a.job_id == id,
            })
            .cloned()
            .collect();
        Ok(newest_first(applications, |a: &Application| a.created_at))
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_admin_settings(&self) -> StoreResult<Option<AdminSettings>> {
        Ok(self.tables.read().await.admin_settings.clone())
    }

    async fn save_admin_settings(&self, settings: &AdminSettings) -> StoreResult<()> {
        self.tables.write().await.admin_settings = Some(settings.clone());
        Ok(())
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
