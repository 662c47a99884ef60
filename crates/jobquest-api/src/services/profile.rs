//! Own profile, uploaded pictures, saved jobs and public recruiter pages.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use jobquest_firestore::{DataStore, JobStore, ResumeStore, StoreError, UserStore};
use jobquest_models::{
    normalize_email, Company, JobId, JobListing, JobStatus, Profile, Resume, Role, User, UserId,
};
use jobquest_storage::{ImageStore, ImageUpload};

use crate::error::{ApiError, ApiResult};
use crate::security::{
    is_valid_email, is_valid_phone, sanitize_text, validate_website, MAX_LONG_TEXT, MAX_SHORT_TEXT,
};
use crate::services::jobs::{JobService, JobSummary};

/// Posting statistics for a recruiter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStats {
    pub active_jobs: usize,
    pub total_applications: usize,
}

impl CompanyStats {
    fn of(jobs: &[JobListing]) -> Self {
        Self {
            active_jobs: jobs.iter().filter(|j| j.job.status == JobStatus::Active).count(),
            total_applications: jobs.iter().map(|j| j.application_count).sum(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterDashboard {
    pub posted_jobs: Vec<JobListing>,
    pub jobs_count: usize,
    pub company_stats: CompanyStats,
}

/// The caller's own profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user: User,
    #[serde(flatten)]
    pub recruiter: Option<RecruiterDashboard>,
}

/// A recruiter's public page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterProfile {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub profile_picture: String,
    pub company: Option<Company>,
    pub jobs: Vec<JobListing>,
    pub company_stats: CompanyStats,
}

/// Company fields editable by its recruiter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub employees: Option<u32>,
}

/// Body of `PUT /api/auth/profile`. Which fields apply depends on the role.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub resume: Option<Resume>,
    pub company: Option<CompanyUpdate>,
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| sanitize_text(&v, MAX_SHORT_TEXT))
        .filter(|v| !v.is_empty())
}

impl CompanyUpdate {
    /// Merge into `existing`, keeping its logo and status.
    pub(crate) fn into_company(self, existing: Option<&Company>) -> ApiResult<Company> {
        let name = optional_text(self.name);
        let description = self
            .description
            .map(|d| sanitize_text(&d, MAX_LONG_TEXT))
            .filter(|d| !d.is_empty());
        let (name, description) = match (name, description) {
            (Some(name), Some(description)) => (name, description),
            (name, description) => {
                let mut missing = Vec::new();
                if name.is_none() {
                    missing.push("company.name");
                }
                if description.is_none() {
                    missing.push("company.description");
                }
                return Err(ApiError::missing_fields(&missing));
            }
        };

        let website = match optional_text(self.website) {
            Some(url) => Some(validate_website(&url).map_err(|msg| {
                let mut details = BTreeMap::new();
                details.insert("company.website".to_string(), msg.clone());
                ApiError::validation(msg, details)
            })?),
            None => None,
        };

        let mut company = existing.cloned().unwrap_or_else(|| Company::new("", ""));
        company.name = name;
        company.description = description;
        company.location = optional_text(self.location);
        company.website = website;
        company.industry = optional_text(self.industry);
        company.size = optional_text(self.size);
        company.employees = self.employees;
        Ok(company)
    }
}

/// Profile operations for the signed-in account.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DataStore>,
    images: Arc<dyn ImageStore>,
    jobs: JobService,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DataStore>, images: Arc<dyn ImageStore>, jobs: JobService) -> Self {
        Self { store, images, jobs }
    }

    /// Job seekers see their résumé; recruiters also get their postings.
    pub async fn view(&self, user: &User) -> ApiResult<ProfileView> {
        let mut user = user.clone();
        match user.role() {
            Role::JobSeeker => {
                let resume = self.store.get_resume(&user.id).await?;
                user.profile = Profile::JobSeeker { resume };
                Ok(ProfileView {
                    user,
                    recruiter: None,
                })
            }
            Role::Recruiter => {
                let posted_jobs = self.jobs.recruiter_jobs(&user).await?;
                Ok(ProfileView {
                    recruiter: Some(RecruiterDashboard {
                        jobs_count: posted_jobs.len(),
                        company_stats: CompanyStats::of(&posted_jobs),
                        posted_jobs,
                    }),
                    user,
                })
            }
        }
    }

    /// Update contact details and résumé (job seekers) or company (recruiters).
    pub async fn update(&self, user: &User, update: ProfileUpdate) -> ApiResult<User> {
        let mut user = user.clone();
        match user.role() {
            Role::Recruiter => {
                let company_update = update
                    .company
                    .ok_or_else(|| ApiError::missing_fields(&["company"]))?;
                let company = company_update.into_company(user.company())?;
                user.profile = Profile::Recruiter {
                    company: Some(company),
                };
                user.updated_at = Utc::now();
                self.store.update_user(&user).await?;
            }
            Role::JobSeeker => {
                let full_name = optional_text(update.full_name);
                let email = update.email.map(|e| normalize_email(&e)).filter(|e| !e.is_empty());
                let phone_number = optional_text(update.phone_number);
                let (full_name, email, phone_number) = match (full_name, email, phone_number) {
                    (Some(n), Some(e), Some(p)) => (n, e, p),
                    (n, e, p) => {
                        let mut missing = Vec::new();
                        if n.is_none() {
                            missing.push("fullName");
                        }
                        if e.is_none() {
                            missing.push("email");
                        }
                        if p.is_none() {
                            missing.push("phoneNumber");
                        }
                        return Err(ApiError::missing_fields(&missing));
                    }
                };

                let mut details = BTreeMap::new();
                if !is_valid_email(&email) {
                    details.insert("email".to_string(), "Please provide a valid email address".to_string());
                }
                if !is_valid_phone(&phone_number) {
                    details.insert("phoneNumber".to_string(), "Please provide a valid phone number".to_string());
                }
                if !details.is_empty() {
                    return Err(ApiError::validation("Please correct the highlighted fields", details));
                }

                user.full_name = full_name;
                user.email = email;
                user.phone_number = phone_number;
                user.updated_at = Utc::now();
                match self.store.update_user(&user).await {
                    Ok(()) => {}
                    Err(StoreError::Conflict(_)) => {
                        return Err(ApiError::conflict("Email is already in use"))
                    }
                    Err(e) => return Err(e.into()),
                }

                if let Some(resume) = update.resume {
                    let mut resume = resume.sanitized();
                    resume.updated_at = Some(user.updated_at);
                    self.store.save_resume(&user.id, &resume).await?;
                    user.profile = Profile::JobSeeker {
                        resume: Some(resume),
                    };
                }
            }
        }

        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    async fn replace_image(&self, previous: &str, upload: &ImageUpload, label: &str) -> ApiResult<String> {
        let url = self.images.put(&upload.key(label), upload).await?;
        if let Err(e) = self.images.delete_url(previous).await {
            warn!(url = %previous, "Failed to remove replaced image: {}", e);
        }
        Ok(url)
    }

    /// Job seekers replace their profile picture, recruiters their company logo.
    pub async fn upload_picture(&self, user: &User, upload: ImageUpload) -> ApiResult<User> {
        match user.role() {
            Role::Recruiter => self.upload_company_logo(user, upload).await,
            Role::JobSeeker => {
                let mut user = user.clone();
                user.profile_picture = self
                    .replace_image(&user.profile_picture, &upload, "profile")
                    .await?;
                user.updated_at = Utc::now();
                self.store.update_user(&user).await?;
                info!(user_id = %user.id, "Profile picture updated");
                Ok(user)
            }
        }
    }

    pub async fn upload_company_logo(&self, user: &User, upload: ImageUpload) -> ApiResult<User> {
        if user.role() != Role::Recruiter {
            return Err(ApiError::forbidden("Only recruiters can upload a company logo"));
        }
        let mut user = user.clone();
        let mut company = user.company().cloned().ok_or_else(|| {
            ApiError::bad_request("Please complete your company profile before uploading a logo")
        })?;

        company.logo = self.replace_image(&company.logo, &upload, "logo").await?;
        user.profile = Profile::Recruiter {
            company: Some(company),
        };
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;
        info!(user_id = %user.id, "Company logo updated");
        Ok(user)
    }

    /// Add a job to the caller's saved set. Returns the saved ids.
    pub async fn save_job(&self, user: &User, job_id: Option<&str>) -> ApiResult<Vec<JobId>> {
        let job_id = job_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(JobId::from)
            .ok_or_else(|| ApiError::bad_request("Job ID is required"))?;
        if self.store.get_job(&job_id).await?.is_none() {
            return Err(ApiError::not_found("Job not found"));
        }

        let mut user = user.clone();
        if user.save_job(job_id) {
            user.updated_at = Utc::now();
            self.store.update_user(&user).await?;
        }
        Ok(user.saved_jobs)
    }

    pub async fn saved_jobs(&self, user: &User) -> ApiResult<Vec<JobSummary>> {
        self.jobs.summaries(&user.saved_jobs).await
    }

    /// Remove a job from the caller's saved set. Returns the saved ids.
    pub async fn unsave_job(&self, user: &User, job_id: &JobId) -> ApiResult<Vec<JobId>> {
        let mut user = user.clone();
        if !user.unsave_job(job_id) {
            return Err(ApiError::not_found("Job not found in saved jobs"));
        }
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;
        Ok(user.saved_jobs)
    }

    /// Public company page of a recruiter with their postings.
    pub async fn recruiter_profile(&self, id: &UserId) -> ApiResult<RecruiterProfile> {
        let recruiter = self
            .store
            .get_user(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Recruiter not found"))?;
        if recruiter.role() != Role::Recruiter {
            return Err(ApiError::bad_request("User is not a recruiter"));
        }

        let jobs = self.jobs.recruiter_jobs(&recruiter).await?;
        Ok(RecruiterProfile {
            company_stats: CompanyStats::of(&jobs),
            id: recruiter.id.clone(),
            full_name: recruiter.full_name.clone(),
            email: recruiter.email.clone(),
            profile_picture: recruiter.profile_picture.clone(),
            company: recruiter.company().cloned(),
            jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobquest_firestore::MemoryStore;
    use jobquest_models::{Education, Experience, Job};
    use jobquest_storage::LocalImageStore;

    struct Harness {
        service: ProfileService,
        store: Arc<MemoryStore>,
        uploads: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let uploads = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let jobs = JobService::new(store.clone(), 10);
        let service = ProfileService::new(
            store.clone(),
            Arc::new(LocalImageStore::new(uploads.path())),
            jobs,
        );
        Harness {
            service,
            store,
            uploads,
        }
    }

    async fn seeker(store: &MemoryStore) -> User {
        let user = User::new(
            "sam@example.com",
            "hash",
            "Sam",
            "5550100",
            Profile::JobSeeker { resume: None },
        );
        store.create_user(&user).await.unwrap();
        user
    }

    async fn recruiter(store: &MemoryStore, company: Option<Company>) -> User {
        let user = User::new(
            "rita@corp.example",
            "hash",
            "Rita",
            "5550100",
            Profile::Recruiter { company },
        );
        store.create_user(&user).await.unwrap();
        user
    }

    fn png() -> ImageUpload {
        ImageUpload::new(vec![0x89, b'P', b'N', b'G'], Some("image/png"), Some("me.png")).unwrap()
    }

    #[tokio::test]
    async fn test_seeker_update_replaces_resume() {
        let h = harness();
        let user = seeker(&h.store).await;

        let update = ProfileUpdate {
            full_name: Some("Samantha".into()),
            email: Some("Samantha@Example.com".into()),
            phone_number: Some("+44 20 7946 0000".into()),
            resume: Some(Resume {
                full_name: "Samantha".into(),
                education: vec![
                    Education {
                        degree: "BSc".into(),
                        institution: "MIT".into(),
                        year: None,
                    },
                    Education::default(),
                ],
                experience: vec![Experience {
                    title: "Engineer".into(),
                    company: "Acme".into(),
                    duration: None,
                }],
                skills: vec!["Rust".into(), "  ".into()],
                ..Default::default()
            }),
            company: None,
        };
        let updated = h.service.update(&user, update).await.unwrap();
        assert_eq!(updated.email, "samantha@example.com");

        let stored = h.store.get_resume(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.education.len(), 1);
        assert_eq!(stored.skills, vec!["Rust".to_string()]);

        let view = h.service.view(&updated).await.unwrap();
        assert_eq!(view.user.resume().map(|r| r.skills.len()), Some(1));
        assert!(view.recruiter.is_none());
    }

    #[tokio::test]
    async fn test_seeker_update_requires_contact_fields() {
        let h = harness();
        let user = seeker(&h.store).await;
        let update = ProfileUpdate {
            full_name: Some("Sam".into()),
            ..Default::default()
        };
        match h.service.update(&user, update).await {
            Err(ApiError::Validation { details, .. }) => {
                assert!(details.contains_key("email"));
                assert!(details.contains_key("phoneNumber"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recruiter_update_keeps_logo() {
        let h = harness();
        let mut company = Company::new("Acme", "Widgets");
        company.logo = "/uploads/profiles/logo-1.png".into();
        let user = recruiter(&h.store, Some(company)).await;

        let update = ProfileUpdate {
            company: Some(CompanyUpdate {
                name: Some("Acme Corp".into()),
                description: Some("Better widgets".into()),
                website: Some("https://acme.example".into()),
                employees: Some(40),
                ..Default::default()
            }),
            ..Default::default()
        };
        let updated = h.service.update(&user, update).await.unwrap();
        let company = updated.company().unwrap();
        assert_eq!(company.name, "Acme Corp");
        assert_eq!(company.logo, "/uploads/profiles/logo-1.png");
        assert_eq!(company.website.as_deref(), Some("https://acme.example/"));

        let bad = ProfileUpdate {
            company: Some(CompanyUpdate {
                name: Some("Acme".into()),
                description: Some("x".into()),
                website: Some("ftp://acme.example".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            h.service.update(&updated, bad).await,
            Err(ApiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_picture_upload_routes_by_role() {
        let h = harness();
        let user = seeker(&h.store).await;
        let updated = h.service.upload_picture(&user, png()).await.unwrap();
        assert!(updated.profile_picture.starts_with("/uploads/profiles/profile-"));
        let stored_file = updated.profile_picture.trim_start_matches("/uploads/");
        assert!(h.uploads.path().join(stored_file).exists());

        let rec = recruiter(&h.store, Some(Company::new("Acme", "Widgets"))).await;
        let updated = h.service.upload_picture(&rec, png()).await.unwrap();
        assert!(updated.company().unwrap().logo.starts_with("/uploads/profiles/logo-"));

        assert!(matches!(
            h.service.upload_company_logo(&user, png()).await,
            Err(ApiError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_saved_jobs_set_semantics() {
        let h = harness();
        let rec = recruiter(&h.store, Some(Company::new("Acme", "Widgets"))).await;
        let mut job = Job {
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
            application_deadline: Utc::now(),
            skills: vec![],
            requirements: vec!["Rust".into()],
            responsibilities: vec!["Ship".into()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        job.application_deadline = Job::default_deadline(job.created_at);
        h.store.create_job(&job).await.unwrap();

        let mut user = seeker(&h.store).await;
        let saved = h.service.save_job(&user, Some(job.id.as_str())).await.unwrap();
        assert_eq!(saved, vec![job.id.clone()]);
        user = h.store.get_user(&user.id).await.unwrap().unwrap();
        let again = h.service.save_job(&user, Some(job.id.as_str())).await.unwrap();
        assert_eq!(again.len(), 1);

        let summaries = h.service.saved_jobs(&user).await.unwrap();
        assert_eq!(summaries[0].company, "Acme");

        assert!(matches!(
            h.service.save_job(&user, Some("missing")).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(h.service.unsave_job(&user, &job.id).await.unwrap().is_empty());
        assert!(matches!(
            h.service.unsave_job(&user, &JobId::from("missing")).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_recruiter_profile_rules() {
        let h = harness();
        let user = seeker(&h.store).await;
        assert!(matches!(
            h.service.recruiter_profile(&user.id).await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            h.service.recruiter_profile(&UserId::from("ghost")).await,
            Err(ApiError::NotFound(_))
        ));

        let rec = recruiter(&h.store, Some(Company::new("Acme", "Widgets"))).await;
        let profile = h.service.recruiter_profile(&rec.id).await.unwrap();
        assert_eq!(profile.company.map(|c| c.name), Some("Acme".to_string()));
        assert_eq!(profile.company_stats, CompanyStats::default());
    }
}
