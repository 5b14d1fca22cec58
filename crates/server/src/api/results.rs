use axum::{Json, extract::State};
use camsight_core::MatchResult;
use camsight_shared::AppError;

use super::error::search_error;
use crate::utils::AppState;

/// Random sample of cameras with placeholder intensities (fallback mode)
#[utoipa::path(
  get,
  path = "/api/results",
  responses(
    (status = 200, description = "Fallback-mode result over a camera sample", body = MatchResult),
    (status = 404, description = "No cameras found"),
    (status = 502, description = "Camera store failed")
  )
)]
#[axum::debug_handler]
pub async fn random_results(State(state): State<AppState>) -> Result<Json<MatchResult>, AppError> {
  let result = state.search.random().await.map_err(search_error)?;
  Ok(Json(result))
}
