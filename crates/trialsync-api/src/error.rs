//! Handler errors, rendered as `{"error": "..."}` JSON bodies.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Why a study or view query could not be answered.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No study with the requested registry key.
  #[error("no such study: {0}")]
  NotFound(String),

  /// A query parameter could not be interpreted.
  #[error("invalid query: {0}")]
  BadRequest(String),

  /// The study store failed while serving the request.
  #[error("study store unavailable: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Box a backend error from any [`StudyStore`](trialsync_core::store::StudyStore).
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    ApiError::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Store(e) => {
        tracing::error!(error = %e, "study store failed");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
