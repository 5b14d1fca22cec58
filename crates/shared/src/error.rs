use std::{
  backtrace::{Backtrace, BacktraceStatus},
  fmt::Display,
};

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub struct AppError {
  err: anyhow::Error,
  status_code: StatusCode,
}

impl AppError {
  /// Create with 500 status
  pub fn new<E: Into<anyhow::Error>>(err: E) -> Self {
    Self {
      err: err.into(),
      status_code: StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// Create with custom status
  pub fn with_status<E: Into<anyhow::Error>>(status: StatusCode, err: E) -> Self {
    Self {
      err: err.into(),
      status_code: status,
    }
  }

  pub fn bad_request(msg: impl Display) -> Self {
    Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!("{msg}"))
  }

  #[must_use]
  pub const fn status_code(&self) -> StatusCode {
    self.status_code
  }

  /// Get backtrace from anyhow (requires `RUST_BACKTRACE=1` to capture)
  pub fn backtrace(&self) -> &Backtrace {
    self.err.backtrace()
  }
}

impl IntoResponse for AppError {
  /// Always `{"error": "..."}`. Debug builds add the error chain and,
  /// when captured, the backtrace.
  fn into_response(self) -> Response {
    let message = self.err.to_string();
    let body = if cfg!(debug_assertions) {
      let chain = self
        .err
        .chain()
        .skip(1)
        .map(ToString::to_string)
        .collect::<Vec<_>>();
      let bt = self.err.backtrace();
      let backtrace = if bt.status() == BacktraceStatus::Captured {
        bt.to_string()
      } else {
        "(hint: set RUST_BACKTRACE=1 to enable backtrace)".to_owned()
      };
      json!({ "error": message, "causes": chain, "backtrace": backtrace })
    } else {
      json!({ "error": message })
    };
    (self.status_code, Json(body)).into_response()
  }
}

impl Display for AppError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "[{}] {}", self.status_code, self.err)
  }
}

impl<E> From<E> for AppError
where
  E: Into<anyhow::Error>,
{
  fn from(err: E) -> Self {
    Self::new(err)
  }
}
