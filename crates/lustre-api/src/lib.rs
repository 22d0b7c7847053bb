//! JSON HTTP API for Lustre.
//!
//! Exposes an axum [`Router`] backed by a shared [`ForecastEngine`]. TLS and
//! authentication are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = lustre_api::api_router(Arc::new(engine));
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod forecast;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use lustre_core::{
  engine::ForecastEngine,
  insight::NarrativeService,
  store::{ForecastCache, SalesSource},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::ApiError;

/// Build the API router for `engine`, with permissive CORS and request
/// tracing applied.
pub fn api_router<S, N>(engine: Arc<ForecastEngine<S, N>>) -> Router<()>
where
  S: SalesSource + ForecastCache + 'static,
  N: NarrativeService + 'static,
{
  Router::new()
    .route(
      "/forecast",
      post(forecast::handler::<S, N>).options(forecast::options),
    )
    .route("/health", get(health))
    .with_state(engine)
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
