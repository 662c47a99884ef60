//! Admin panel handlers: sign-in, platform counters, moderation and settings.

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::info;

use jobquest_models::{AdminSettings, Company, Job, JobId, JobListing, UserId};

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::extract::Json;
use crate::handlers::auth::{LoginRequest, MessageResponse};
use crate::handlers::checked_id;
use crate::services::admin::{
    AdminCompanyUpdate, CandidateRow, CompanyRow, Dashboard, SettingsUpdate,
};
use crate::services::identity::AdminLoginResponse;
use crate::services::jobs::JobPatch;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ModerationRequest {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct CompanyResponse {
    pub success: bool,
    pub company: Company,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub success: bool,
    pub job: Job,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDeletedResponse {
    pub success: bool,
    pub message: &'static str,
    pub deactivated_jobs: usize,
}

#[derive(Serialize)]
pub struct CandidateResponse {
    pub success: bool,
    pub candidate: CandidateRow,
}

pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AdminLoginResponse>> {
    let response = state
        .identity
        .admin_login(request.email.as_deref(), request.password.as_deref())
        .await?;
    Ok(Json(response))
}

pub async fn admin_dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.admin.dashboard().await?))
}

pub async fn admin_companies(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<CompanyRow>>> {
    Ok(Json(state.admin.companies().await?))
}

pub async fn admin_set_company_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(request): Json<ModerationRequest>,
) -> ApiResult<Json<CompanyResponse>> {
    let id = UserId::from(checked_id(&id, "company")?);
    let company = state
        .admin
        .set_company_status(&id, request.status.as_deref())
        .await?;
    info!(admin = %admin.email, recruiter_id = %id, "Company moderated");
    Ok(Json(CompanyResponse {
        success: true,
        company,
    }))
}

pub async fn admin_update_company(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(update): Json<AdminCompanyUpdate>,
) -> ApiResult<Json<CompanyResponse>> {
    let id = UserId::from(checked_id(&id, "company")?);
    let company = state.admin.update_company(&id, update).await?;
    info!(admin = %admin.email, recruiter_id = %id, "Company edited");
    Ok(Json(CompanyResponse {
        success: true,
        company,
    }))
}

pub async fn admin_delete_company(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<CompanyDeletedResponse>> {
    let id = UserId::from(checked_id(&id, "company")?);
    let deactivated_jobs = state.admin.delete_company(&id).await?;
    info!(admin = %admin.email, recruiter_id = %id, "Company deleted");
    Ok(Json(CompanyDeletedResponse {
        success: true,
        message: "Company deleted",
        deactivated_jobs,
    }))
}

pub async fn admin_jobs(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<JobListing>>> {
    Ok(Json(state.admin.jobs().await?))
}

pub async fn admin_set_job_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(request): Json<ModerationRequest>,
) -> ApiResult<Json<JobResponse>> {
    let id = JobId::from(checked_id(&id, "job")?);
    let job = state
        .admin
        .set_job_status(&id, request.status.as_deref())
        .await?;
    info!(admin = %admin.email, job_id = %id, "Job moderated");
    Ok(Json(JobResponse { success: true, job }))
}

pub async fn admin_update_job(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(patch): Json<JobPatch>,
) -> ApiResult<Json<JobResponse>> {
    let id = JobId::from(checked_id(&id, "job")?);
    let job = state.admin.update_job(&id, patch).await?;
    info!(admin = %admin.email, job_id = %id, "Job edited");
    Ok(Json(JobResponse { success: true, job }))
}

pub async fn admin_delete_job(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = JobId::from(checked_id(&id, "job")?);
    state.admin.delete_job(&id).await?;
    info!(admin = %admin.email, job_id = %id, "Job deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "Job deleted",
        redirect_to: None,
    }))
}

pub async fn admin_candidates(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<CandidateRow>>> {
    Ok(Json(state.admin.candidates().await?))
}

pub async fn admin_set_candidate_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(request): Json<ModerationRequest>,
) -> ApiResult<Json<CandidateResponse>> {
    let id = UserId::from(checked_id(&id, "candidate")?);
    let candidate = state
        .admin
        .set_candidate_status(&id, request.status.as_deref())
        .await?;
    info!(admin = %admin.email, candidate_id = %id, "Candidate reviewed");
    Ok(Json(CandidateResponse {
        success: true,
        candidate,
    }))
}

pub async fn admin_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<AdminSettings>> {
    Ok(Json(state.admin.settings().await?))
}

pub async fn admin_update_settings(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<Json<AdminSettings>> {
    let settings = state.admin.update_settings(update).await?;
    info!(admin = %admin.email, "Admin settings saved");
    Ok(Json(settings))
}
