//! Job listing, search and posting handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use crate::extract::{Json, Query};
use serde::Serialize;

use jobquest_models::{Facets, Job, JobId, JobListing, JobSearch, Role, SearchPage};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::checked_id;
use crate::services::jobs::{JobDetail, JobPatch, NewJobRequest, TopCompany};
use crate::state::AppState;

#[derive(Serialize)]
pub struct JobResponse {
    pub success: bool,
    pub job: Job,
}

#[derive(Serialize)]
pub struct RecruiterJobsResponse {
    pub success: bool,
    pub jobs: Vec<JobListing>,
}

/// Search jobs with filters, sorting and pagination.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(search): Query<JobSearch>,
) -> ApiResult<Json<SearchPage>> {
    Ok(Json(state.jobs.search(&search).await?))
}

/// Values available for the search filters.
pub async fn job_filters(State(state): State<AppState>) -> ApiResult<Json<Facets>> {
    Ok(Json(state.jobs.facets().await?))
}

pub async fn top_companies(State(state): State<AppState>) -> ApiResult<Json<Vec<TopCompany>>> {
    Ok(Json(state.jobs.top_companies().await?))
}

/// The caller's own postings, newest first.
pub async fn recruiter_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<RecruiterJobsResponse>> {
    auth.require(Role::Recruiter, "Access denied: Recruiter role required")?;
    Ok(Json(RecruiterJobsResponse {
        success: true,
        jobs: state.jobs.recruiter_jobs(&auth.user).await?,
    }))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobDetail>> {
    let id = JobId::from(checked_id(&id, "job")?);
    Ok(Json(state.jobs.detail(&id).await?))
}

pub async fn create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<NewJobRequest>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    let job = state.jobs.create(&auth.user, request).await?;
    Ok((StatusCode::CREATED, Json(JobResponse { success: true, job })))
}

pub async fn update_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<JobPatch>,
) -> ApiResult<Json<JobResponse>> {
    let id = JobId::from(checked_id(&id, "job")?);
    let job = state.jobs.update(&auth.user, &id, patch).await?;
    Ok(Json(JobResponse { success: true, job }))
}
