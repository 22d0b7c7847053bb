//! Handlers for `/forecast`.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use bytes::Bytes;
use lustre_core::{
  engine::{ForecastEngine, ForecastRequest},
  insight::NarrativeService,
  report::ForecastResponse,
  store::{ForecastCache, SalesSource},
};

use crate::error::ApiError;

/// `POST /forecast` with `{ "organizationId": ..., "locationId"?: ... }`.
///
/// The body is parsed leniently: an empty or unparsable body is treated as a
/// request without an organization, which the engine rejects.
pub async fn handler<S, N>(
  State(engine): State<Arc<ForecastEngine<S, N>>>,
  body: Bytes,
) -> Result<Json<ForecastResponse>, ApiError>
where
  S: SalesSource + ForecastCache + 'static,
  N: NarrativeService + 'static,
{
  let request: ForecastRequest = if body.is_empty() {
    ForecastRequest::default()
  } else {
    serde_json::from_slice(&body).unwrap_or_else(|e| {
      tracing::debug!(error = %e, "unparsable forecast request body");
      ForecastRequest::default()
    })
  };

  let response = engine.forecast(&request).await?;
  Ok(Json(response))
}

/// `OPTIONS /forecast` outside of a CORS pre-flight.
pub async fn options() -> StatusCode { StatusCode::OK }
