//! Admin panel: platform counters, moderation of companies, jobs and
//! candidates, and the admin account's own settings.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use jobquest_firestore::{
    ApplicationFilter, ApplicationStore, DataStore, JobStore, SettingsStore, StoreError, UserStore,
};
use jobquest_models::{
    normalize_email, AdminSettings, ApplicationStatus, CandidateStatus, Company, CompanyStatus,
    Job, JobId, JobListing, JobStatus, Profile, Role, User, UserId,
};

use crate::config::AdminConfig;
use crate::error::{ApiError, ApiResult};
use crate::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::security::{is_valid_email, sanitize_text, MAX_SHORT_TEXT};
use crate::services::jobs::{JobPatch, JobService};
use crate::services::profile::CompanyUpdate;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounters {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub total_applications: usize,
    pub pending_applications: usize,
    pub hired_candidates: usize,
    pub total_companies: usize,
    pub total_candidates: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardCounters,
    pub recent_jobs: Vec<JobListing>,
}

/// A recruiter's company as listed in the admin panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRow {
    /// Owning recruiter
    pub id: UserId,
    #[serde(flatten)]
    pub company: Company,
    pub recruiter_name: String,
    pub recruiter_email: String,
    pub jobs_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRow {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub profile_picture: String,
    pub skills: Vec<String>,
    pub applications_count: usize,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
}

impl CandidateRow {
    fn of(seeker: &User, applications_count: usize) -> Self {
        Self {
            id: seeker.id.clone(),
            full_name: seeker.full_name.clone(),
            email: seeker.email.clone(),
            phone_number: seeker.phone_number.clone(),
            profile_picture: seeker.profile_picture.clone(),
            skills: seeker.resume().map(|r| r.skills.clone()).unwrap_or_default(),
            applications_count,
            status: seeker.review_status,
            created_at: seeker.created_at,
        }
    }
}

/// Body of `PUT /api/admin/companies/:id`: the company form plus an optional status.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCompanyUpdate {
    #[serde(flatten)]
    pub details: CompanyUpdate,
    pub status: Option<String>,
}

/// Body of `PUT /api/admin/settings`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub company: Option<String>,
    pub email: Option<String>,
    pub email_notifications: Option<bool>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// The admin account: saved settings, else the configured credentials.
pub(crate) async fn admin_account(
    store: &dyn DataStore,
    configured: Option<&AdminConfig>,
) -> ApiResult<Option<AdminSettings>> {
    if let Some(settings) = store.get_admin_settings().await? {
        return Ok(Some(settings));
    }
    Ok(configured.map(|c| AdminSettings::new(normalize_email(&c.email), c.password_hash.clone())))
}

fn company_status(raw: Option<&str>) -> ApiResult<CompanyStatus> {
    raw.ok_or_else(|| ApiError::bad_request("Status is required"))?
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid status value. Must be one of: Active, Inactive"))
}

fn invalid_field(field: &str, message: &str) -> ApiError {
    let mut details = BTreeMap::new();
    details.insert(field.to_string(), message.to_string());
    ApiError::validation(message, details)
}

fn count_by<K: std::hash::Hash + Eq>(keys: impl Iterator<Item = K>) -> HashMap<K, usize> {
    let mut counts = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Admin panel operations. Callers are authenticated as admin by the handler.
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn DataStore>,
    jobs: JobService,
    admin: Option<AdminConfig>,
}

impl AdminService {
    pub fn new(store: Arc<dyn DataStore>, jobs: JobService, admin: Option<AdminConfig>) -> Self {
        Self { store, jobs, admin }
    }

    async fn recruiter_with_company(&self, recruiter_id: &UserId) -> ApiResult<(User, Company)> {
        let recruiter = self
            .store
            .get_user(recruiter_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Company not found"))?;
        let company = recruiter
            .company()
            .cloned()
            .ok_or_else(|| ApiError::not_found("Company not found"))?;
        Ok((recruiter, company))
    }

    async fn save_company(&self, mut recruiter: User, company: Option<Company>) -> ApiResult<()> {
        recruiter.profile = Profile::Recruiter { company };
        recruiter.updated_at = Utc::now();
        self.store.update_user(&recruiter).await?;
        Ok(())
    }

    pub async fn dashboard(&self) -> ApiResult<Dashboard> {
        let jobs = self.store.list_jobs(None).await?;
        let applications = self.store.list_applications(ApplicationFilter::All).await?;
        let recruiters = self.store.list_users(Some(Role::Recruiter)).await?;
        let seekers = self.store.list_users(Some(Role::JobSeeker)).await?;

        let stats = DashboardCounters {
            total_jobs: jobs.len(),
            active_jobs: jobs.iter().filter(|j| j.status == JobStatus::Active).count(),
            total_applications: applications.len(),
            pending_applications: applications
                .iter()
                .filter(|a| a.status == ApplicationStatus::Pending)
                .count(),
            hired_candidates: applications
                .iter()
                .filter(|a| a.status == ApplicationStatus::Approved)
                .count(),
            total_companies: recruiters.iter().filter(|r| r.company().is_some()).count(),
            total_candidates: seekers.len(),
        };

        let recent = self.store.recent_jobs(3).await?;
        let recent_jobs = self.jobs.listings(recent, ApplicationFilter::All).await?;
        Ok(Dashboard { stats, recent_jobs })
    }

    pub async fn companies(&self) -> ApiResult<Vec<CompanyRow>> {
        let recruiters = self.store.list_users(Some(Role::Recruiter)).await?;
        let jobs = self.store.list_jobs(None).await?;
        let job_counts = count_by(jobs.iter().map(|j| &j.recruiter_id));

        Ok(recruiters
            .iter()
            .filter_map(|r| {
                r.company().map(|company| CompanyRow {
                    id: r.id.clone(),
                    company: company.clone(),
                    recruiter_name: r.full_name.clone(),
                    recruiter_email: r.email.clone(),
                    jobs_count: job_counts.get(&r.id).copied().unwrap_or(0),
                })
            })
            .collect())
    }

    /// Activate or deactivate a recruiter's company.
    pub async fn set_company_status(&self, recruiter_id: &UserId, status: Option<&str>) -> ApiResult<Company> {
        let status = company_status(status)?;
        let (recruiter, mut company) = self.recruiter_with_company(recruiter_id).await?;
        company.status = status;
        self.save_company(recruiter, Some(company.clone())).await?;
        info!(recruiter_id = %recruiter_id, status = company.status.as_str(), "Company status changed");
        Ok(company)
    }

    /// Replace a company's details, keeping its logo. The status changes only if given.
    pub async fn update_company(
        &self,
        recruiter_id: &UserId,
        update: AdminCompanyUpdate,
    ) -> ApiResult<Company> {
        let status = update
            .status
            .as_deref()
            .map(|s| company_status(Some(s)))
            .transpose()?;
        let (recruiter, existing) = self.recruiter_with_company(recruiter_id).await?;
        let mut company = update.details.into_company(Some(&existing))?;
        if let Some(status) = status {
            company.status = status;
        }
        self.save_company(recruiter, Some(company.clone())).await?;
        info!(recruiter_id = %recruiter_id, "Company updated by admin");
        Ok(company)
    }

    /// Remove a recruiter's company and take their postings off the board.
    ///
    /// The recruiter account stays; it lands on company setup at next login.
    /// Returns how many jobs were deactivated.
    pub async fn delete_company(&self, recruiter_id: &UserId) -> ApiResult<usize> {
        let (recruiter, _) = self.recruiter_with_company(recruiter_id).await?;
        let active: Vec<JobId> = self
            .store
            .list_jobs_by_recruiter(recruiter_id)
            .await?
            .into_iter()
            .filter(|j| j.status == JobStatus::Active)
            .map(|j| j.id)
            .collect();

        self.store
            .set_jobs_status(&active, JobStatus::Inactive, Utc::now())
            .await?;
        self.save_company(recruiter, None).await?;
        info!(recruiter_id = %recruiter_id, deactivated = active.len(), "Company deleted by admin");
        Ok(active.len())
    }

    /// Every job, newest first, with company details resolved.
    pub async fn jobs(&self) -> ApiResult<Vec<JobListing>> {
        let mut jobs = self.store.list_jobs(None).await?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.jobs.listings(jobs, ApplicationFilter::All).await
    }

    pub async fn set_job_status(&self, id: &JobId, status: Option<&str>) -> ApiResult<Job> {
        let status: JobStatus = status
            .ok_or_else(|| ApiError::bad_request("Status is required"))?
            .parse()
            .map_err(|_| ApiError::bad_request("Invalid status value. Must be one of: Active, Inactive"))?;

        let mut job = self
            .store
            .get_job(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Job not found"))?;
        job.status = status;
        job.updated_at = Utc::now();
        self.store.update_job(&job).await?;
        info!(job_id = %id, status = ?status, "Job status changed by admin");
        Ok(job)
    }

    /// Edit any job. Same validation as a recruiter's edit, without the ownership check.
    pub async fn update_job(&self, id: &JobId, patch: JobPatch) -> ApiResult<Job> {
        let mut job = self
            .store
            .get_job(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Job not found"))?;
        patch.apply(&mut job, Utc::now())?;
        self.store.update_job(&job).await?;
        info!(job_id = %id, "Job updated by admin");
        Ok(job)
    }

    /// Delete a job and every application to it.
    pub async fn delete_job(&self, id: &JobId) -> ApiResult<()> {
        self.store.delete_job(id).await.map_err(|e| match e {
            StoreError::NotFound(_) => ApiError::not_found("Job not found"),
            e => e.into(),
        })?;
        info!(job_id = %id, "Job deleted by admin");
        Ok(())
    }

    /// Job seekers with the number of applications each has made.
    pub async fn candidates(&self) -> ApiResult<Vec<CandidateRow>> {
        let seekers = self.store.list_users(Some(Role::JobSeeker)).await?;
        let applications = self.store.list_applications(ApplicationFilter::All).await?;
        let counts = count_by(applications.iter().map(|a| &a.job_seeker_id));

        Ok(seekers
            .iter()
            .map(|s| CandidateRow::of(s, counts.get(&s.id).copied().unwrap_or(0)))
            .collect())
    }

    pub async fn set_candidate_status(
        &self,
        id: &UserId,
        status: Option<&str>,
    ) -> ApiResult<CandidateRow> {
        let status: CandidateStatus = status
            .ok_or_else(|| ApiError::bad_request("Status is required"))?
            .parse()
            .map_err(|_| {
                ApiError::bad_request("Invalid status value. Must be one of: Reviewing, Approved, Rejected")
            })?;

        let mut seeker = self
            .store
            .get_user(id)
            .await?
            .filter(|u| u.role() == Role::JobSeeker)
            .ok_or_else(|| ApiError::not_found("Candidate not found"))?;
        seeker.review_status = status;
        seeker.updated_at = Utc::now();
        self.store.update_user(&seeker).await?;

        let applications = self
            .store
            .list_applications(ApplicationFilter::BySeeker(id.clone()))
            .await?;
        info!(candidate_id = %id, status = status.as_str(), "Candidate reviewed");
        Ok(CandidateRow::of(&seeker, applications.len()))
    }

    pub async fn settings(&self) -> ApiResult<AdminSettings> {
        admin_account(self.store.as_ref(), self.admin.as_ref())
            .await?
            .ok_or_else(|| ApiError::not_found("Admin settings not found"))
    }

    /// Apply a settings change. A new password needs the current one.
    pub async fn update_settings(&self, update: SettingsUpdate) -> ApiResult<AdminSettings> {
        let mut settings = self.settings().await?;

        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        match (non_empty(update.current_password), non_empty(update.new_password)) {
            (Some(current), Some(new)) => {
                if !verify_password(&current, &settings.password_hash) {
                    return Err(ApiError::bad_request("Current password is incorrect"));
                }
                if new.len() < MIN_PASSWORD_LEN {
                    return Err(invalid_field(
                        "newPassword",
                        "Password must be at least 6 characters long",
                    ));
                }
                settings.password_hash = hash_password(&new)?;
            }
            (None, Some(_)) => return Err(ApiError::missing_fields(&["currentPassword"])),
            _ => {}
        }

        if let Some(email) = non_empty(update.email.map(|e| e.trim().to_string())) {
            if !is_valid_email(&email) {
                return Err(invalid_field("email", "Please provide a valid email address"));
            }
            settings.email = normalize_email(&email);
        }
        if let Some(company) = update.company.map(|c| sanitize_text(&c, MAX_SHORT_TEXT)) {
            if !company.is_empty() {
                settings.company = company;
            }
        }
        if let Some(enabled) = update.email_notifications {
            settings.email_notifications = enabled;
        }

        self.store.save_admin_settings(&settings).await?;
        info!(email = %settings.email, "Admin settings updated");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobquest_firestore::MemoryStore;
    use jobquest_models::{Application, User};

    async fn seeded() -> (AdminService, Arc<MemoryStore>, User, Job) {
        let store = Arc::new(MemoryStore::new());
        let rec = User::new(
            "rita@corp.example",
            "h",
            "Rita",
            "5550100",
            Profile::Recruiter {
                company: Some(Company::new("Acme", "Widgets")),
            },
        );
        let seeker = User::new("sam@x.example", "h", "Sam", "5550100", Profile::JobSeeker { resume: None });
        store.create_user(&rec).await.unwrap();
        store.create_user(&seeker).await.unwrap();

        let now = Utc::now();
        let job = Job {
            id: JobId::new(),
            recruiter_id: rec.id.clone(),
            title: "Engineer".into(),
            industry: "Technology".into(),
            job_type: "full-time".into(),
            experience: Default::default(),
            salary: "Not specified".into(),
            location: "Remote".into(),
            description: "Build".into(),
            status: JobStatus::Active,
            application_deadline: Job::default_deadline(now),
            skills: vec![],
            requirements: vec!["Rust".into()],
            responsibilities: vec!["Ship".into()],
            created_at: now,
            updated_at: now,
        };
        store.create_job(&job).await.unwrap();

        let mut application = Application::new(seeker.id.clone(), job.id.clone(), rec.id.clone());
        application.set_status(ApplicationStatus::Approved);
        store.create_application(&application).await.unwrap();

        let service = AdminService::new(store.clone(), JobService::new(store.clone(), 10), None);
        (service, store, rec, job)
    }

    #[tokio::test]
    async fn test_dashboard_counters() {
        let (service, _, _, _) = seeded().await;
        let dashboard = service.dashboard().await.unwrap();
        assert_eq!(
            dashboard.stats,
            DashboardCounters {
                total_jobs: 1,
                active_jobs: 1,
                total_applications: 1,
                pending_applications: 0,
                hired_candidates: 1,
                total_companies: 1,
                total_candidates: 1,
            }
        );
        assert_eq!(dashboard.recent_jobs[0].company, "Acme");
        assert_eq!(dashboard.recent_jobs[0].application_count, 1);
    }

    #[tokio::test]
    async fn test_moderation() {
        let (service, store, rec, job) = seeded().await;

        let company = service.set_company_status(&rec.id, Some("Inactive")).await.unwrap();
        assert_eq!(company.status, CompanyStatus::Inactive);
        let stored = store.get_user(&rec.id).await.unwrap().unwrap();
        assert_eq!(stored.company().map(|c| c.status), Some(CompanyStatus::Inactive));

        assert!(matches!(
            service.set_company_status(&rec.id, Some("Paused")).await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            service.set_company_status(&UserId::from("ghost"), Some("Active")).await,
            Err(ApiError::NotFound(_))
        ));

        let updated = service.set_job_status(&job.id, Some("Inactive")).await.unwrap();
        assert_eq!(updated.status, JobStatus::Inactive);
        assert!(matches!(
            service.set_job_status(&JobId::from("ghost"), Some("Active")).await,
            Err(ApiError::NotFound(_))
        ));

        let companies = service.companies().await.unwrap();
        assert_eq!(companies[0].jobs_count, 1);
        let candidates = service.candidates().await.unwrap();
        assert_eq!(candidates[0].applications_count, 1);
        assert_eq!(service.jobs().await.unwrap().len(), 1);
    }

    async fn seeker_id(store: &MemoryStore) -> UserId {
        store.list_users(Some(Role::JobSeeker)).await.unwrap()[0].id.clone()
    }

    #[tokio::test]
    async fn test_admin_edits_and_deletes_any_job() {
        let (service, store, _, job) = seeded().await;

        let patch = JobPatch {
            title: Some("Staff Engineer".into()),
            ..Default::default()
        };
        let updated = service.update_job(&job.id, patch).await.unwrap();
        assert_eq!(updated.title, "Staff Engineer");
        assert_eq!(updated.requirements, vec!["Rust".to_string()]);

        let blank = JobPatch {
            title: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_job(&job.id, blank).await,
            Err(ApiError::Validation { .. })
        ));

        service.delete_job(&job.id).await.unwrap();
        assert!(store.get_job(&job.id).await.unwrap().is_none());
        assert!(store
            .list_applications(ApplicationFilter::All)
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            service.delete_job(&job.id).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_company_update_keeps_logo() {
        let (service, store, rec, _) = seeded().await;
        let update = AdminCompanyUpdate {
            details: CompanyUpdate {
                name: Some("Acme Rockets".into()),
                description: Some("Rockets".into()),
                employees: Some(12),
                ..Default::default()
            },
            status: Some("Inactive".into()),
        };
        let company = service.update_company(&rec.id, update).await.unwrap();
        assert_eq!(company.name, "Acme Rockets");
        assert_eq!(company.status, CompanyStatus::Inactive);
        assert_eq!(company.logo, jobquest_models::DEFAULT_COMPANY_LOGO);
        let stored = store.get_user(&rec.id).await.unwrap().unwrap();
        assert_eq!(stored.company().map(|c| c.employees), Some(Some(12)));

        let missing_name = AdminCompanyUpdate {
            details: CompanyUpdate {
                description: Some("Rockets".into()),
                ..Default::default()
            },
            status: None,
        };
        assert!(matches!(
            service.update_company(&rec.id, missing_name).await,
            Err(ApiError::Validation { .. })
        ));
        let bad_status = AdminCompanyUpdate {
            status: Some("Paused".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_company(&rec.id, bad_status).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_deleting_company_deactivates_its_jobs() {
        let (service, store, rec, job) = seeded().await;

        assert_eq!(service.delete_company(&rec.id).await.unwrap(), 1);
        let stored = store.get_user(&rec.id).await.unwrap().unwrap();
        assert!(stored.company().is_none());
        let job = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Inactive);
        assert!(service.companies().await.unwrap().is_empty());

        assert!(matches!(
            service.delete_company(&rec.id).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_candidate_review_status() {
        let (service, store, rec, _) = seeded().await;
        let seeker = seeker_id(&store).await;

        let row = service
            .set_candidate_status(&seeker, Some("Approved"))
            .await
            .unwrap();
        assert_eq!(row.status, CandidateStatus::Approved);
        assert_eq!(row.applications_count, 1);
        assert_eq!(
            service.candidates().await.unwrap()[0].status,
            CandidateStatus::Approved
        );

        assert!(matches!(
            service.set_candidate_status(&seeker, Some("Hired")).await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            service.set_candidate_status(&rec.id, Some("Approved")).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_settings_start_from_configured_admin() {
        let store = Arc::new(MemoryStore::new());
        let admin = AdminConfig {
            email: "Admin@JobQuest.dev".into(),
            password_hash: hash_password("admin-pass").unwrap(),
        };
        let service = AdminService::new(
            store.clone(),
            JobService::new(store.clone(), 10),
            Some(admin),
        );

        let settings = service.settings().await.unwrap();
        assert_eq!(settings.email, "admin@jobquest.dev");
        assert!(settings.email_notifications);

        let wrong = SettingsUpdate {
            current_password: Some("guess".into()),
            new_password: Some("new-pass".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_settings(wrong).await,
            Err(ApiError::BadRequest(msg)) if msg == "Current password is incorrect"
        ));
        let without_current = SettingsUpdate {
            new_password: Some("new-pass".into()),
            ..Default::default()
        };
        assert!(service.update_settings(without_current).await.is_err());
        assert!(store.get_admin_settings().await.unwrap().is_none());

        let change = SettingsUpdate {
            company: Some("JobQuest".into()),
            email_notifications: Some(false),
            current_password: Some("admin-pass".into()),
            new_password: Some("new-pass".into()),
            ..Default::default()
        };
        let saved = service.update_settings(change).await.unwrap();
        assert_eq!(saved.company, "JobQuest");
        assert!(!saved.email_notifications);
        let stored = store.get_admin_settings().await.unwrap().unwrap();
        assert!(verify_password("new-pass", &stored.password_hash));

        let bad_email = SettingsUpdate {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_settings(bad_email).await,
            Err(ApiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_settings_without_any_admin() {
        let (service, _, _, _) = seeded().await;
        assert!(matches!(
            service.settings().await,
            Err(ApiError::NotFound(_))
        ));
    }
}
