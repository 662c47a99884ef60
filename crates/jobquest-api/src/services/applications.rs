//! Applications and the recruiter review workflow.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use jobquest_firestore::{
    ApplicationFilter, ApplicationStore, DataStore, JobStore, StoreError, UserStore,
};
use jobquest_models::{
    Application, ApplicationId, ApplicationStatus, JobId, Resume, Role, TransitionPolicy, User,
    UserId,
};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::jobs::{CompanyBadge, JobSummary};
use crate::services::{jobs_by_id, users_by_id};

/// An application as its job seeker sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekerApplication {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<JobSummary>,
    pub company: CompanyBadge,
}

/// Contact details and résumé of an applicant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub profile_picture: String,
    pub resume: Option<Resume>,
}

impl Applicant {
    fn of(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            profile_picture: user.profile_picture.clone(),
            resume: user.resume().cloned(),
        }
    }
}

/// An application as the reviewing recruiter sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterApplication {
    #[serde(flatten)]
    pub application: Application,
    pub job: Option<JobSummary>,
    pub job_seeker: Option<Applicant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJob {
    pub job_id: JobId,
    pub title: String,
    pub status: ApplicationStatus,
}

/// One applicant across all of a recruiter's jobs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSeekerSummary {
    #[serde(flatten)]
    pub applicant: Applicant,
    /// Status of the most recently updated application.
    pub status: ApplicationStatus,
    pub last_activity: DateTime<Utc>,
    pub applied_jobs: Vec<AppliedJob>,
}

/// Parse a requested status, naming the accepted values on failure.
pub fn parse_status(raw: Option<&str>) -> ApiResult<ApplicationStatus> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Status is required in request body"))?;

    raw.parse().map_err(|_| {
        let mut details = std::collections::BTreeMap::new();
        details.insert(
            "status".to_string(),
            format!("Must be one of: {}", ApplicationStatus::allowed_values()),
        );
        ApiError::validation(
            format!(
                "Invalid status value. Must be one of: {}",
                ApplicationStatus::allowed_values()
            ),
            details,
        )
    })
}

/// Application workflow operations.
#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn DataStore>,
    policy: TransitionPolicy,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn DataStore>, policy: TransitionPolicy) -> Self {
        Self { store, policy }
    }

    /// Apply to a job. At most one application exists per seeker and job.
    pub async fn apply(&self, seeker: &User, job_id: &JobId) -> ApiResult<Application> {
        if seeker.role() != Role::JobSeeker {
            return Err(ApiError::forbidden("Only job seekers can apply for jobs"));
        }

        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Job not found"))?;

        let application = Application::new(seeker.id.clone(), job.id.clone(), job.recruiter_id.clone());
        match self.store.create_application(&application).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                return Err(ApiError::conflict("You have already applied for this job"))
            }
            Err(e) => return Err(e.into()),
        }

        metrics::record_application_submitted();
        info!(
            application_id = %application.id,
            job_id = %job.id,
            job_seeker_id = %seeker.id,
            "Application submitted"
        );
        Ok(application)
    }

    /// The caller's applications, most recently updated first.
    pub async fn list_for_seeker(&self, seeker: &User) -> ApiResult<Vec<SeekerApplication>> {
        if seeker.role() != Role::JobSeeker {
            return Err(ApiError::forbidden("Only job seekers can view their applications"));
        }

        let mut applications = self
            .store
            .list_applications(ApplicationFilter::BySeeker(seeker.id.clone()))
            .await?;
        applications.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let jobs = jobs_by_id(&*self.store, applications.iter().map(|a| a.job_id.clone())).await?;
        let recruiters =
            users_by_id(&*self.store, applications.iter().map(|a| a.recruiter_id.clone())).await?;
        let now = Utc::now();

        Ok(applications
            .into_iter()
            .map(|application| {
                let recruiter = recruiters.get(&application.recruiter_id);
                SeekerApplication {
                    job: jobs
                        .get(&application.job_id)
                        .map(|job| JobSummary::of(job, recruiter, now)),
                    company: CompanyBadge::of(recruiter),
                    application,
                }
            })
            .collect())
    }

    /// Applications to jobs the caller owns, most recently updated first.
    pub async fn list_for_recruiter(&self, recruiter: &User) -> ApiResult<Vec<RecruiterApplication>> {
        if recruiter.role() != Role::Recruiter {
            return Err(ApiError::forbidden("Only recruiters can view job applications"));
        }

        let mut applications = self
            .store
            .list_applications(ApplicationFilter::ByRecruiter(recruiter.id.clone()))
            .await?;
        let jobs = jobs_by_id(&*self.store, applications.iter().map(|a| a.job_id.clone())).await?;
        // Only jobs the caller currently owns.
        applications.retain(|a| jobs.get(&a.job_id).is_some_and(|j| j.is_owned_by(&recruiter.id)));
        applications.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let seekers =
            users_by_id(&*self.store, applications.iter().map(|a| a.job_seeker_id.clone())).await?;
        let now = Utc::now();

        Ok(applications
            .into_iter()
            .map(|application| RecruiterApplication {
                job: jobs
                    .get(&application.job_id)
                    .map(|job| JobSummary::of(job, Some(recruiter), now)),
                job_seeker: seekers.get(&application.job_seeker_id).map(Applicant::of),
                application,
            })
            .collect())
    }

    /// Move an application to a new status on behalf of its recruiter.
    pub async fn update_status(
        &self,
        caller: &User,
        id: &ApplicationId,
        requested: Option<&str>,
    ) -> ApiResult<RecruiterApplication> {
        if caller.role() != Role::Recruiter {
            return Err(ApiError::forbidden("Only recruiters can update application status"));
        }
        let status = parse_status(requested)?;

        let mut application = self
            .store
            .get_application(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Application not found"))?;
        if application.recruiter_id != caller.id {
            return Err(ApiError::forbidden("Not authorized to update this application"));
        }
        if !self.policy.allows(application.status, status) {
            return Err(ApiError::conflict(format!(
                "Application is already {} and can no longer change status",
                application.status
            )));
        }

        let previous = application.status;
        application.set_status(status);
        self.store.update_application(&application).await?;
        metrics::record_status_transition(status);
        info!(
            application_id = %application.id,
            from = %previous,
            to = %status,
            "Application status updated"
        );

        let job = self.store.get_job(&application.job_id).await?;
        let seeker = self.store.get_user(&application.job_seeker_id).await?;
        Ok(RecruiterApplication {
            job: job.map(|j| JobSummary::of(&j, Some(caller), Utc::now())),
            job_seeker: seeker.as_ref().map(Applicant::of),
            application,
        })
    }

    /// Distinct applicants to the caller's jobs, most recent activity first.
    pub async fn job_seekers(&self, recruiter: &User) -> ApiResult<Vec<JobSeekerSummary>> {
        if recruiter.role() != Role::Recruiter {
            return Err(ApiError::forbidden("Only recruiters can view job seekers"));
        }

        let applications = self
            .store
            .list_applications(ApplicationFilter::ByRecruiter(recruiter.id.clone()))
            .await?;
        let jobs = jobs_by_id(&*self.store, applications.iter().map(|a| a.job_id.clone())).await?;
        let seekers =
            users_by_id(&*self.store, applications.iter().map(|a| a.job_seeker_id.clone())).await?;

        let mut grouped: HashMap<UserId, Vec<Application>> = HashMap::new();
        for application in applications {
            grouped
                .entry(application.job_seeker_id.clone())
                .or_default()
                .push(application);
        }

        let mut summaries: Vec<JobSeekerSummary> = grouped
            .into_iter()
            .filter_map(|(seeker_id, mut applications)| {
                let seeker = seekers.get(&seeker_id)?;
                applications.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                let latest = applications.first()?;
                Some(JobSeekerSummary {
                    applicant: Applicant::of(seeker),
                    status: latest.status,
                    last_activity: latest.updated_at,
                    applied_jobs: applications
                        .iter()
                        .map(|a| AppliedJob {
                            job_id: a.job_id.clone(),
                            title: jobs
                                .get(&a.job_id)
                                .map(|j| j.title.clone())
                                .unwrap_or_default(),
                            status: a.status,
                        })
                        .collect(),
                })
            })
            .collect();
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(summaries)
    }
}
