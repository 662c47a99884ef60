//! [`DataStore`] backed by Firestore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use jobquest_models::{
    AdminSettings, Application, ApplicationId, Job, JobId, JobStatus, Resume, Role, User, UserId,
};

use crate::application_repo::ApplicationRepository;
use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::job_repo::JobRepository;
use crate::settings_repo::SettingsRepository;
use crate::store::{
    ApplicationFilter, ApplicationStore, DataStore, JobStore, ResumeStore, SettingsStore,
    StoreResult, UserStore,
};
use crate::user_repo::UserRepository;

#[derive(Clone)]
pub struct FirestoreStore {
    client: FirestoreClient,
    users: UserRepository,
    jobs: JobRepository,
    applications: ApplicationRepository,
    settings: SettingsRepository,
}

impl FirestoreStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            users: UserRepository::new(client.clone()),
            jobs: JobRepository::new(client.clone()),
            applications: ApplicationRepository::new(client.clone()),
            settings: SettingsRepository::new(client.clone()),
            client,
        }
    }

    /// Connect using `GCP_PROJECT_ID` and service-account credentials from the environment.
    pub async fn from_env() -> FirestoreResult<Self> {
        Ok(Self::new(FirestoreClient::from_env().await?))
    }
}

#[async_trait]
impl UserStore for FirestoreStore {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        Ok(self.users.create(user).await?)
    }

    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.users.get(id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.find_by_email(email).await?)
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        Ok(self.users.update(user).await?)
    }

    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        Ok(self.users.list(role).await?)
    }

    async fn get_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>> {
        Ok(self.users.get_many(ids).await?)
    }
}

#[async_trait]
impl ResumeStore for FirestoreStore {
    async fn save_resume(&self, user_id: &UserId, resume: &Resume) -> StoreResult<()> {
        Ok(self.users.save_resume(user_id, resume).await?)
    }

    async fn get_resume(&self, user_id: &UserId) -> StoreResult<Option<Resume>> {
        Ok(self.users.get_resume(user_id).await?)
    }
}

#[async_trait]
impl JobStore for FirestoreStore {
    async fn create_job(&self, job: &Job) -> StoreResult<()> {
        Ok(self.jobs.create(job).await?)
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Option<Job>> {
        Ok(self.jobs.get(id).await?)
    }

    async fn update_job(&self, job: &Job) -> StoreResult<()> {
        Ok(self.jobs.update(job).await?)
    }

    async fn list_jobs(&self, status: Option<JobStatus>) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.list(status).await?)
    }

    async fn list_jobs_by_recruiter(&self, recruiter_id: &UserId) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.list_by_recruiter(recruiter_id).await?)
    }

    async fn get_jobs(&self, ids: &[JobId]) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.get_many(ids).await?)
    }

    async fn recent_jobs(&self, limit: usize) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.recent(limit).await?)
    }

    async fn set_jobs_status(
        &self,
        ids: &[JobId],
        status: JobStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        Ok(self.jobs.set_status(ids, status, at).await?)
    }

    async fn delete_job(&self, id: &JobId) -> StoreResult<()> {
        let applications = self
            .applications
            .list(&ApplicationFilter::ByJob(id.clone()))
            .await?;
        let dependents = applications
            .iter()
            .map(|a| self.applications.delete_write(&a.id))
            .collect();
        Ok(self.jobs.delete(id, dependents).await?)
    }
}

#[async_trait]
impl ApplicationStore for FirestoreStore {
    async fn create_application(&self, application: &Application) -> StoreResult<()> {
        Ok(self.applications.create(application).await?)
    }

    async fn get_application(&self, id: &ApplicationId) -> StoreResult<Option<Application>> {
        Ok(self.applications.get(id).await?)
    }

    async fn update_application(&self, application: &Application) -> StoreResult<()> {
        Ok(self.applications.update(application).await?)
    }

    async fn list_applications(&self, filter: ApplicationFilter) -> StoreResult<Vec<Application>> {
        Ok(self.applications.list(&filter).await?)
    }
}

#[async_trait]
impl SettingsStore for FirestoreStore {
    async fn get_admin_settings(&self) -> StoreResult<Option<AdminSettings>> {
        Ok(self.settings.get().await?)
    }

    async fn save_admin_settings(&self, settings: &AdminSettings) -> StoreResult<()> {
        Ok(self.settings.save(settings).await?)
    }
}

#[async_trait]
impl DataStore for FirestoreStore {
    async fn ping(&self) -> StoreResult<()> {
        self.client.list_documents("jobs", Some(1), None).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}
