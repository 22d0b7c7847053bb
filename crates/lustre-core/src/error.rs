//! Error types for `lustre-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("organizationId required")]
  MissingOrganization,

  #[error("failed to fetch daily sales: {0}")]
  Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("unknown scenario: {0:?}")]
  UnknownScenario(String),

  #[error("unknown momentum label: {0:?}")]
  UnknownMomentum(String),

  #[error("unknown forecast type: {0:?}")]
  UnknownForecastType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
