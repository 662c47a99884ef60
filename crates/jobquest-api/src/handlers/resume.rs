//! Résumé builder handlers.

use axum::extract::State;
use axum::http::StatusCode;
use crate::extract::Json;
use serde::Serialize;

use jobquest_models::Resume;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ResumeSavedResponse {
    pub message: &'static str,
    pub resume: Resume,
}

pub async fn save_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(resume): Json<Resume>,
) -> ApiResult<(StatusCode, Json<ResumeSavedResponse>)> {
    let resume = state.resumes.save(&auth.user, resume).await?;
    Ok((
        StatusCode::CREATED,
        Json(ResumeSavedResponse {
            message: "Resume saved successfully",
            resume,
        }),
    ))
}

pub async fn get_resume(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Resume>> {
    Ok(Json(state.resumes.get(&auth.user).await?))
}
