//! Homepage statistics handler.

use axum::extract::State;
use crate::extract::Json;

use crate::error::ApiResult;
use crate::services::stats::HomeStats;
use crate::state::AppState;

pub async fn home_stats(State(state): State<AppState>) -> ApiResult<Json<HomeStats>> {
    Ok(Json(state.stats.home().await?))
}
