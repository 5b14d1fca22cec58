use axum::{Json, Router, routing::get};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::utils::AppState;

mod error;
mod image;
mod results;
mod search;

pub use image::ImageProxyQuery;
pub use search::SearchQuery;

#[derive(OpenApi)]
#[openapi(
  info(
    title = "camsight API",
    version = "0.0.1",
    description = "Find the traffic camera that best matches a free-text description"
  ),
  paths(
    search::search,
    results::random_results,
    image::camera_image,
    image::proxy_image,
  ),
  components(schemas(
    camsight_core::MatchResult,
    camsight_core::MatchMode,
    camsight_core::MatchWarning,
    camsight_core::HeatmapPoint,
    camsight_core::Coordinate,
  ))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
  Json(ApiDoc::openapi())
}

pub fn app() -> Router<AppState> {
  Router::new()
    .route("/api/search", get(search::search))
    .route("/api/results", get(results::random_results))
    .route("/api/cameras/{camera_id}/image", get(image::camera_image))
    .route("/api/proxy-image", get(image::proxy_image))
    .route("/openapi.json", get(openapi_json))
    .merge(Scalar::with_url("/openapi/", ApiDoc::openapi()))
}
