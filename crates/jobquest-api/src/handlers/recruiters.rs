//! Recruiter-facing applicant overview and public company pages.

use axum::extract::{Path, State};
use crate::extract::Json;

use jobquest_models::UserId;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::checked_id;
use crate::services::applications::JobSeekerSummary;
use crate::services::profile::RecruiterProfile;
use crate::state::AppState;

pub async fn job_seekers(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<JobSeekerSummary>>> {
    Ok(Json(state.applications.job_seekers(&auth.user).await?))
}

/// Public company profile. No authentication required.
pub async fn recruiter_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RecruiterProfile>> {
    let id = UserId::from(checked_id(&id, "profile")?);
    Ok(Json(state.profiles.recruiter_profile(&id).await?))
}
