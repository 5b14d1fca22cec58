use axum::http::StatusCode;
use camsight_core::SearchError;
use camsight_shared::AppError;

/// Map pipeline failures onto HTTP statuses. Upstream collaborator failures
/// are a bad gateway, not an internal error.
pub fn search_error(err: SearchError) -> AppError {
  let status = match &err {
    SearchError::EmptyQuery => StatusCode::BAD_REQUEST,
    SearchError::NoCandidates => StatusCode::NOT_FOUND,
    SearchError::Embedding(_) | SearchError::SimilaritySearch(_) | SearchError::CameraSource(_) => {
      tracing::error!(error = %err, "search collaborator failed");
      StatusCode::BAD_GATEWAY
    }
  };
  AppError::with_status(status, err)
}
