use axum::{
  Json,
  extract::{Query, State},
};
use camsight_core::MatchResult;
use camsight_shared::AppError;
use serde::Deserialize;
use utoipa::IntoParams;

use super::error::search_error;
use crate::utils::AppState;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
  /// Free-text description of the scene to look for
  pub q: Option<String>,
}

/// Find the camera that best matches a query, plus a heatmap over candidates
#[utoipa::path(
  get,
  path = "/api/search",
  params(SearchQuery),
  responses(
    (status = 200, description = "Best match and heatmap", body = MatchResult),
    (status = 400, description = "Query parameter is required"),
    (status = 404, description = "No cameras found"),
    (status = 502, description = "Embedding or similarity search failed")
  )
)]
#[axum::debug_handler]
pub async fn search(
  State(state): State<AppState>,
  Query(params): Query<SearchQuery>,
) -> Result<Json<MatchResult>, AppError> {
  let Some(query) = params.q.filter(|q| !q.trim().is_empty()) else {
    return Err(AppError::bad_request("Query parameter is required"));
  };

  let result = state.search.search(&query).await.map_err(search_error)?;

  Ok(Json(result))
}
