//! Job postings: search, facets, creation and owner updates.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use jobquest_firestore::{ApplicationFilter, ApplicationStore, DataStore, JobStore, UserStore};
use jobquest_models::{
    facets, ExperienceLevel, Facets, Job, JobId, JobListing, JobSearch, JobStatus, Role,
    SearchPage, User, UserId, DEFAULT_COMPANY_LOGO, DEFAULT_PROFILE_PICTURE,
};

use crate::error::{ApiError, ApiResult};
use crate::security::{sanitize_text, MAX_LONG_TEXT, MAX_SHORT_TEXT};
use crate::services::users_by_id;

/// Company display name and logo, resolved from the recruiter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyBadge {
    pub name: String,
    pub logo: String,
}

impl CompanyBadge {
    pub fn of(recruiter: Option<&User>) -> Self {
        match recruiter.and_then(User::company) {
            Some(company) => Self {
                name: company.name.clone(),
                logo: company.logo.clone(),
            },
            None => Self {
                name: String::new(),
                logo: DEFAULT_COMPANY_LOGO.to_string(),
            },
        }
    }
}

/// Compact job view embedded in application and saved-job listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub logo: String,
    pub industry: String,
    pub job_type: String,
    pub experience: ExperienceLevel,
    pub salary: String,
    pub location: String,
    pub status: JobStatus,
    pub application_deadline: DateTime<Utc>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl JobSummary {
    pub fn of(job: &Job, recruiter: Option<&User>, now: DateTime<Utc>) -> Self {
        let badge = CompanyBadge::of(recruiter);
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            company: badge.name,
            logo: badge.logo,
            industry: job.industry.clone(),
            job_type: job.job_type.clone(),
            experience: job.experience,
            salary: job.salary.clone(),
            location: job.location.clone(),
            status: job.status,
            application_deadline: job.application_deadline,
            is_available: job.is_available(now),
            created_at: job.created_at,
        }
    }
}

fn listing(job: Job, recruiter: Option<&User>, application_count: usize, now: DateTime<Utc>) -> JobListing {
    let badge = CompanyBadge::of(recruiter);
    JobListing {
        is_available: job.is_available(now),
        company: badge.name,
        logo: badge.logo,
        recruiter_name: recruiter
            .map(|r| r.full_name.clone())
            .unwrap_or_else(|| "Unknown Recruiter".to_string()),
        recruiter_profile_picture: recruiter
            .map(|r| r.profile_picture.clone())
            .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string()),
        application_count,
        job,
    }
}

/// Recruiter details shown on a job page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterSummary {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub profile_picture: String,
    pub company: Option<CompanyCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyCard {
    pub name: String,
    pub logo: String,
    pub description: String,
}

/// A job with its recruiter.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub listing: JobListing,
    pub recruiter: Option<RecruiterSummary>,
}

/// Company ranked by number of postings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCompany {
    pub id: UserId,
    pub name: String,
    pub logo: String,
    pub industry: Option<String>,
    pub job_count: usize,
}

/// Body of `POST /api/jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJobRequest {
    pub title: Option<String>,
    #[serde(alias = "company")]
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub job_type: Option<String>,
    pub experience: Option<String>,
    pub salary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub application_deadline: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

/// Body of `PATCH /api/jobs/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    pub title: Option<String>,
    pub industry: Option<String>,
    pub job_type: Option<String>,
    pub experience: Option<String>,
    pub salary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub application_deadline: Option<String>,
    pub skills: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub responsibilities: Option<Vec<String>>,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| sanitize_text(&s, MAX_SHORT_TEXT))
        .filter(|s| !s.is_empty())
        .collect()
}

fn required(value: Option<String>, max_len: usize) -> Option<String> {
    value
        .map(|v| sanitize_text(&v, max_len))
        .filter(|v| !v.is_empty())
}

fn parse_experience(raw: &str) -> ApiResult<ExperienceLevel> {
    raw.parse().map_err(|_| {
        let allowed: Vec<&str> = ExperienceLevel::ALL.iter().map(|l| l.as_str()).collect();
        ApiError::bad_request(format!(
            "Invalid experience level. Must be one of: {}",
            allowed.join(", ")
        ))
    })
}

fn invalid_deadline() -> ApiError {
    ApiError::bad_request("Invalid application deadline date format")
}

/// Validate a creation request into a job owned by `recruiter_id`.
pub fn build_job(recruiter_id: &UserId, request: NewJobRequest, now: DateTime<Utc>) -> ApiResult<Job> {
    let title = required(request.title, MAX_SHORT_TEXT);
    let company_name = required(request.company_name, MAX_SHORT_TEXT);
    let industry = required(request.industry, MAX_SHORT_TEXT);
    let job_type = required(request.job_type, MAX_SHORT_TEXT);
    let salary = required(request.salary, MAX_SHORT_TEXT);
    let location = required(request.location, MAX_SHORT_TEXT);
    let description = required(request.description, MAX_LONG_TEXT);
    let requirements = clean_list(request.requirements);
    let responsibilities = clean_list(request.responsibilities);

    let mut missing = Vec::new();
    let checks = [
        ("title", title.is_none()),
        ("industry", industry.is_none()),
        ("jobType", job_type.is_none()),
        ("salary", salary.is_none()),
        ("location", location.is_none()),
        ("description", description.is_none()),
        ("companyName", company_name.is_none()),
        ("requirements", requirements.is_empty()),
        ("responsibilities", responsibilities.is_empty()),
    ];
    for (field, absent) in checks {
        if absent {
            missing.push(field);
        }
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }

    let experience = match request.experience.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_experience(raw)?,
        _ => ExperienceLevel::Entry,
    };
    let application_deadline = match request.application_deadline.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_deadline(raw).ok_or_else(invalid_deadline)?,
        _ => Job::default_deadline(now),
    };

    Ok(Job {
        id: JobId::new(),
        recruiter_id: recruiter_id.clone(),
        title: title.unwrap_or_default(),
        industry: industry.unwrap_or_default(),
        job_type: job_type.unwrap_or_default(),
        experience,
        salary: salary.unwrap_or_default(),
        location: location.unwrap_or_default(),
        description: description.unwrap_or_default(),
        status: JobStatus::Active,
        application_deadline,
        skills: clean_list(request.skills),
        requirements,
        responsibilities,
        created_at: now,
        updated_at: now,
    })
}

impl JobPatch {
    /// Apply to `job`, validating every supplied field before changing anything.
    pub fn apply(self, job: &mut Job, now: DateTime<Utc>) -> ApiResult<()> {
        let text = |value: Option<String>, field: &str, max_len: usize| -> ApiResult<Option<String>> {
            match value {
                None => Ok(None),
                Some(v) => match required(Some(v), max_len) {
                    Some(v) => Ok(Some(v)),
                    None => Err(ApiError::missing_fields(&[field])),
                },
            }
        };

        let title = text(self.title, "title", MAX_SHORT_TEXT)?;
        let industry = text(self.industry, "industry", MAX_SHORT_TEXT)?;
        let job_type = text(self.job_type, "jobType", MAX_SHORT_TEXT)?;
        let salary = text(self.salary, "salary", MAX_SHORT_TEXT)?;
        let location = text(self.location, "location", MAX_SHORT_TEXT)?;
        let description = text(self.description, "description", MAX_LONG_TEXT)?;
        let experience = self.experience.as_deref().map(parse_experience).transpose()?;
        let status = self
            .status
            .as_deref()
            .map(|s| {
                s.parse::<JobStatus>()
                    .map_err(|_| ApiError::bad_request("Invalid status value. Must be one of: Active, Inactive"))
            })
            .transpose()?;
        let deadline = self
            .application_deadline
            .as_deref()
            .map(|raw| parse_deadline(raw).ok_or_else(invalid_deadline))
            .transpose()?;
        let requirements = self.requirements.map(clean_list);
        let responsibilities = self.responsibilities.map(clean_list);
        if requirements.as_ref().is_some_and(Vec::is_empty) {
            return Err(ApiError::missing_fields(&["requirements"]));
        }
        if responsibilities.as_ref().is_some_and(Vec::is_empty) {
            return Err(ApiError::missing_fields(&["responsibilities"]));
        }

        if let Some(v) = title {
            job.title = v;
        }
        if let Some(v) = industry {
            job.industry = v;
        }
        if let Some(v) = job_type {
            job.job_type = v;
        }
        if let Some(v) = salary {
            job.salary = v;
        }
        if let Some(v) = location {
            job.location = v;
        }
        if let Some(v) = description {
            job.description = v;
        }
        if let Some(v) = experience {
            job.experience = v;
        }
        if let Some(v) = status {
            job.status = v;
        }
        if let Some(v) = deadline {
            job.application_deadline = v;
        }
        if let Some(v) = self.skills {
            job.skills = clean_list(v);
        }
        if let Some(v) = requirements {
            job.requirements = v;
        }
        if let Some(v) = responsibilities {
            job.responsibilities = v;
        }
        job.updated_at = now;
        Ok(())
    }
}

/// Job posting operations.
#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn DataStore>,
    default_page_size: u32,
}

impl JobService {
    pub fn new(store: Arc<dyn DataStore>, default_page_size: u32) -> Self {
        Self {
            store,
            default_page_size,
        }
    }

    async fn recruiters_of(&self, jobs: &[Job]) -> ApiResult<HashMap<UserId, User>> {
        users_by_id(&*self.store, jobs.iter().map(|j| j.recruiter_id.clone())).await
    }

    async fn application_counts(&self, filter: ApplicationFilter) -> ApiResult<HashMap<JobId, usize>> {
        let mut counts = HashMap::new();
        for application in self.store.list_applications(filter).await? {
            *counts.entry(application.job_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Resolve company, recruiter and application counts for display.
    pub async fn listings(&self, jobs: Vec<Job>, counts: ApplicationFilter) -> ApiResult<Vec<JobListing>> {
        let recruiters = self.recruiters_of(&jobs).await?;
        let counts = self.application_counts(counts).await?;
        let now = Utc::now();
        Ok(jobs
            .into_iter()
            .map(|job| {
                let count = counts.get(&job.id).copied().unwrap_or(0);
                let recruiter = recruiters.get(&job.recruiter_id);
                listing(job, recruiter, count, now)
            })
            .collect())
    }

    /// Summaries for the given ids, in the given order. Unknown ids are skipped.
    pub async fn summaries(&self, ids: &[JobId]) -> ApiResult<Vec<JobSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let jobs = self.store.get_jobs(ids).await?;
        let recruiters = self.recruiters_of(&jobs).await?;
        let now = Utc::now();
        let by_id: HashMap<&JobId, &Job> = jobs.iter().map(|j| (&j.id, j)).collect();
        Ok(ids
            .iter()
            .filter_map(|id| by_id.get(id))
            .map(|job| JobSummary::of(job, recruiters.get(&job.recruiter_id), now))
            .collect())
    }

    /// Filter, sort and paginate postings.
    pub async fn search(&self, search: &JobSearch) -> ApiResult<SearchPage> {
        let query = search.compile(self.default_page_size);
        let jobs = match &query.recruiter_id {
            Some(recruiter_id) => self.store.list_jobs_by_recruiter(recruiter_id).await?,
            None => self.store.list_jobs(Some(query.status)).await?,
        };
        let listings = self.listings(jobs, ApplicationFilter::All).await?;
        Ok(query.run(listings))
    }

    /// Distinct job types, experience levels and skills across all postings.
    pub async fn facets(&self) -> ApiResult<Facets> {
        let jobs = self.store.list_jobs(None).await?;
        Ok(facets(&jobs))
    }

    /// The five companies with the most postings.
    pub async fn top_companies(&self) -> ApiResult<Vec<TopCompany>> {
        let recruiters = self.store.list_users(Some(Role::Recruiter)).await?;
        let jobs = self.store.list_jobs(None).await?;

        let mut job_counts: HashMap<&UserId, usize> = HashMap::new();
        for job in &jobs {
            *job_counts.entry(&job.recruiter_id).or_insert(0) += 1;
        }

        let mut companies: Vec<TopCompany> = recruiters
            .iter()
            .filter_map(|r| {
                r.company().map(|company| TopCompany {
                    id: r.id.clone(),
                    name: company.name.clone(),
                    logo: company.logo.clone(),
                    industry: company.industry.clone(),
                    job_count: job_counts.get(&r.id).copied().unwrap_or(0),
                })
            })
            .collect();
        companies.sort_by(|a, b| b.job_count.cmp(&a.job_count).then_with(|| a.name.cmp(&b.name)));
        companies.truncate(5);
        Ok(companies)
    }

    /// The caller's postings, newest first, with application counts.
    pub async fn recruiter_jobs(&self, recruiter: &User) -> ApiResult<Vec<JobListing>> {
        let mut jobs = self.store.list_jobs_by_recruiter(&recruiter.id).await?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.listings(jobs, ApplicationFilter::ByRecruiter(recruiter.id.clone()))
            .await
    }

    pub async fn detail(&self, id: &JobId) -> ApiResult<JobDetail> {
        let job = self
            .store
            .get_job(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Job not found"))?;
        let recruiter = self.store.get_user(&job.recruiter_id).await?;
        let count = self
            .store
            .list_applications(ApplicationFilter::ByJob(job.id.clone()))
            .await?
            .len();

        let summary = recruiter.as_ref().map(|r| RecruiterSummary {
            id: r.id.clone(),
            full_name: r.full_name.clone(),
            email: r.email.clone(),
            profile_picture: r.profile_picture.clone(),
            company: r.company().map(|c| CompanyCard {
                name: c.name.clone(),
                logo: c.logo.clone(),
                description: c.description.clone(),
            }),
        });

        Ok(JobDetail {
            listing: listing(job, recruiter.as_ref(), count, Utc::now()),
            recruiter: summary,
        })
    }

    /// Post a job as `recruiter`. The recruiter must have a company profile.
    pub async fn create(&self, recruiter: &User, request: NewJobRequest) -> ApiResult<Job> {
        if recruiter.role() != Role::Recruiter {
            return Err(ApiError::forbidden("Only recruiters can post jobs"));
        }
        if !recruiter.company().is_some_and(|c| c.is_complete()) {
            return Err(ApiError::bad_request(
                "Company information is required. Please complete your company profile before posting jobs",
            ));
        }

        let job = build_job(&recruiter.id, request, Utc::now())?;
        self.store.create_job(&job).await?;
        info!(job_id = %job.id, recruiter_id = %recruiter.id, "Job posted");
        Ok(job)
    }

    /// Partial update by the owning recruiter.
    pub async fn update(&self, caller: &User, id: &JobId, patch: JobPatch) -> ApiResult<Job> {
        let mut job = self
            .store
            .get_job(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Job not found"))?;
        if !job.is_owned_by(&caller.id) {
            return Err(ApiError::forbidden("Not authorized to update this job"));
        }

        patch.apply(&mut job, Utc::now())?;
        self.store.update_job(&job).await?;
        info!(job_id = %job.id, "Job updated");
        Ok(job)
    }
}
