use axum::{
  body::Body,
  extract::{Path, Query, State},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use camsight_core::ImageUrlError;
use camsight_shared::AppError;
use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::utils::AppState;

fn image_url_error(err: ImageUrlError) -> AppError {
  AppError::bad_request(err)
}

async fn relay(http: &reqwest::Client, url: Url) -> Result<Response, AppError> {
  let upstream = http
    .get(url.clone())
    .send()
    .await
    .map_err(|err| AppError::with_status(StatusCode::BAD_GATEWAY, err))?;

  let status = upstream.status();
  if !status.is_success() {
    tracing::warn!(%url, status = status.as_u16(), "camera image fetch failed");
    return Err(AppError::with_status(
      StatusCode::BAD_GATEWAY,
      anyhow::anyhow!("Failed to fetch image: {status}"),
    ));
  }

  let content_type = upstream
    .headers()
    .get(header::CONTENT_TYPE)
    .cloned()
    .unwrap_or_else(|| HeaderValue::from_static("image/jpeg"));
  let bytes = upstream
    .bytes()
    .await
    .map_err(|err| AppError::with_status(StatusCode::BAD_GATEWAY, err))?;

  Ok(
    (
      [
        (header::CONTENT_TYPE, content_type),
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
      ],
      Body::from(bytes),
    )
      .into_response(),
  )
}

/// Latest still frame of a camera
#[utoipa::path(
  get,
  path = "/api/cameras/{camera_id}/image",
  params(("camera_id" = String, Path, description = "Camera id, e.g. a search's bestMatch")),
  responses(
    (status = 200, description = "Image bytes", content_type = "image/jpeg"),
    (status = 400, description = "Invalid camera id"),
    (status = 502, description = "Camera host failed")
  )
)]
#[axum::debug_handler]
pub async fn camera_image(
  State(state): State<AppState>,
  Path(camera_id): Path<String>,
) -> Result<Response, AppError> {
  let url = state
    .images
    .url_for(&camera_id, Utc::now().timestamp())
    .map_err(image_url_error)?;
  relay(&state.http, url).await
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageProxyQuery {
  /// Absolute image URL on the camera host
  pub url: Option<String>,
}

/// Relay an image from the camera host
#[utoipa::path(
  get,
  path = "/api/proxy-image",
  params(ImageProxyQuery),
  responses(
    (status = 200, description = "Image bytes", content_type = "image/jpeg"),
    (status = 400, description = "Missing url or url not on the camera host"),
    (status = 502, description = "Camera host failed")
  )
)]
#[axum::debug_handler]
pub async fn proxy_image(
  State(state): State<AppState>,
  Query(params): Query<ImageProxyQuery>,
) -> Result<Response, AppError> {
  let Some(raw) = params.url.filter(|u| !u.is_empty()) else {
    return Err(AppError::bad_request("Image URL is required"));
  };
  let url = state
    .images
    .check_proxy_target(&raw)
    .map_err(image_url_error)?;
  relay(&state.http, url).await
}
