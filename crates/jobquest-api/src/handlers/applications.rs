//! Application submission and review handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use crate::extract::Json;
use serde::{Deserialize, Serialize};

use jobquest_models::{Application, ApplicationId, JobId};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::checked_id;
use crate::services::applications::{RecruiterApplication, SeekerApplication};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct ApplicationCreatedResponse {
    pub success: bool,
    pub message: &'static str,
    pub application: Application,
}

#[derive(Serialize)]
pub struct ApplicationsResponse<T> {
    pub success: bool,
    pub applications: Vec<T>,
}

#[derive(Serialize)]
pub struct StatusUpdatedResponse {
    pub success: bool,
    pub message: String,
    pub application: RecruiterApplication,
}

pub async fn apply_for_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<(StatusCode, Json<ApplicationCreatedResponse>)> {
    let job_id = JobId::from(checked_id(&job_id, "job")?);
    let application = state.applications.apply(&auth.user, &job_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApplicationCreatedResponse {
            success: true,
            message: "Application submitted successfully",
            application,
        }),
    ))
}

pub async fn my_applications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApplicationsResponse<SeekerApplication>>> {
    Ok(Json(ApplicationsResponse {
        success: true,
        applications: state.applications.list_for_seeker(&auth.user).await?,
    }))
}

pub async fn recruiter_applications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApplicationsResponse<RecruiterApplication>>> {
    Ok(Json(ApplicationsResponse {
        success: true,
        applications: state.applications.list_for_recruiter(&auth.user).await?,
    }))
}

pub async fn update_application_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> ApiResult<Json<StatusUpdatedResponse>> {
    let id = ApplicationId::from(checked_id(&application_id, "application")?);
    let application = state
        .applications
        .update_status(&auth.user, &id, request.status.as_deref())
        .await?;
    Ok(Json(StatusUpdatedResponse {
        success: true,
        message: format!(
            "Application status updated to {}",
            application.application.status.as_str()
        ),
        application,
    }))
}
