//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("forecast error: {0}")]
  Forecast(#[source] lustre_core::Error),
}

impl From<lustre_core::Error> for ApiError {
  fn from(e: lustre_core::Error) -> Self {
    match e {
      lustre_core::Error::MissingOrganization => ApiError::BadRequest(e.to_string()),
      other => ApiError::Forecast(other),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Forecast(e) => {
        tracing::error!(error = %e, "forecast request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
