//! Account, profile and saved-job handlers under `/api/auth`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use crate::extract::Json;
use serde::{Deserialize, Serialize};

use jobquest_models::{JobId, Role, User};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::form::FormData;
use crate::handlers::checked_id;
use crate::services::identity::{LoginResponse, SignupForm, SignupResponse};
use crate::services::jobs::JobSummary;
use crate::services::profile::{ProfileUpdate, ProfileView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveJobRequest {
    pub job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Plain acknowledgement.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<&'static str>,
}

#[derive(Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureResponse {
    pub success: bool,
    pub message: &'static str,
    pub profile_picture: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoResponse {
    pub success: bool,
    pub message: &'static str,
    pub company_logo: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobIdsResponse {
    pub success: bool,
    pub message: &'static str,
    pub saved_jobs: Vec<JobId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobsResponse {
    pub success: bool,
    pub saved_jobs: Vec<JobSummary>,
}

/// Register a job seeker or recruiter (multipart form).
pub async fn signup(
    State(state): State<AppState>,
    mut form: FormData,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    let picture = form.take_image("profilePicture")?;
    let logo = form.take_image("companyLogo")?;
    let signup = SignupForm {
        full_name: form.text("fullName"),
        email: form.text("email"),
        phone_number: form.text("phoneNumber"),
        password: form.raw("password"),
        role: form.text("role"),
        company_name: form.text("companyName"),
        company_description: form.text("companyDescription"),
    };

    let response = state.identity.signup(signup, picture, logo).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let response = state
        .identity
        .login(request.email.as_deref(), request.password.as_deref())
        .await?;
    Ok(Json(response))
}

/// Email a temporary password.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.identity.forgot_password(request.email.as_deref()).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Temporary password has been sent to your email",
        redirect_to: Some("/login"),
    }))
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .identity
        .change_password(
            &auth.user,
            request.current_password.as_deref(),
            request.new_password.as_deref(),
        )
        .await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Password updated successfully",
        redirect_to: None,
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ProfileView>> {
    Ok(Json(state.profiles.view(&auth.user).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<ProfileUpdatedResponse>> {
    let user = state.profiles.update(&auth.user, update).await?;
    let message = match user.role() {
        Role::Recruiter => "Company profile updated successfully",
        Role::JobSeeker => "Profile updated successfully",
    };
    Ok(Json(ProfileUpdatedResponse { message, user }))
}

/// Replace the profile picture; for recruiters this is the company logo.
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    auth: AuthUser,
    mut form: FormData,
) -> ApiResult<Json<PictureResponse>> {
    let upload = form
        .take_image("profilePicture")?
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let user = state.profiles.upload_picture(&auth.user, upload).await?;
    let profile_picture = match user.company() {
        Some(company) => company.logo.clone(),
        None => user.profile_picture.clone(),
    };
    Ok(Json(PictureResponse {
        success: true,
        message: "Profile picture updated",
        profile_picture,
    }))
}

pub async fn upload_company_logo(
    State(state): State<AppState>,
    auth: AuthUser,
    mut form: FormData,
) -> ApiResult<Json<LogoResponse>> {
    auth.require(Role::Recruiter, "Only recruiters can update company logo")?;
    let upload = form
        .take_image("companyLogo")?
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let user = state.profiles.upload_company_logo(&auth.user, upload).await?;
    Ok(Json(LogoResponse {
        success: true,
        message: "Company logo updated",
        company_logo: user.company().map(|c| c.logo.clone()).unwrap_or_default(),
    }))
}

pub async fn save_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<SaveJobRequest>,
) -> ApiResult<Json<SavedJobIdsResponse>> {
    if let Some(id) = request.job_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        checked_id(id, "job")?;
    }
    let saved_jobs = state
        .profiles
        .save_job(&auth.user, request.job_id.as_deref())
        .await?;
    Ok(Json(SavedJobIdsResponse {
        success: true,
        message: "Job saved successfully",
        saved_jobs,
    }))
}

pub async fn get_saved_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<SavedJobsResponse>> {
    Ok(Json(SavedJobsResponse {
        success: true,
        saved_jobs: state.profiles.saved_jobs(&auth.user).await?,
    }))
}

pub async fn remove_saved_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let job_id = JobId::from(checked_id(&job_id, "job")?);
    state.profiles.unsave_job(&auth.user, &job_id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Job removed from saved jobs",
        redirect_to: None,
    }))
}
