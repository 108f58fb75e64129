//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use strand_core::request::ValidationError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation error: {0}")]
  Validation(#[from] ValidationError),

  /// The body was not a JSON object.
  #[error("malformed body: {0}")]
  MalformedBody(String),

  /// Consistency and store failures. The detail is logged, never returned.
  #[error("internal error: {0}")]
  Internal(#[source] strand_core::Error),
}

impl From<strand_core::Error> for ApiError {
  fn from(e: strand_core::Error) -> Self {
    match e {
      strand_core::Error::InvalidRequest(v) => ApiError::Validation(v),
      other => ApiError::Internal(other),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Validation(v) => (
        StatusCode::BAD_REQUEST,
        Json(json!({
          "error":   "Validation Error",
          "message": v.message,
          "field":   v.field,
        })),
      )
        .into_response(),
      ApiError::MalformedBody(m) => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Validation Error", "message": m, "field": null })),
      )
        .into_response(),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({
            "error":   "Internal Server Error",
            "message": "An unexpected error occurred",
          })),
        )
          .into_response()
      }
    }
  }
}
