//! The persisted forecast row.
//!
//! A compute cycle writes one [`ForecastProjection`] per (scenario, quarter).
//! Rows are never updated: they expire, are garbage-collected, and are
//! replaced wholesale by the next cycle.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, momentum::Momentum, projection::Scenario};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastType {
  #[default]
  Quarterly,
}

impl ForecastType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Quarterly => "quarterly",
    }
  }
}

impl fmt::Display for ForecastType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ForecastType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "quarterly" => Ok(Self::Quarterly),
      other => Err(Error::UnknownForecastType(other.to_owned())),
    }
  }
}

/// One projected period under one scenario, as stored in the forecast cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastProjection {
  pub forecast_id:               Uuid,
  pub organization_id:           String,
  /// `None` for an organization-wide forecast.
  pub location_id:               Option<String>,
  pub forecast_type:             ForecastType,
  /// e.g. `Q1 2025`.
  pub period_label:              String,
  pub period_start:              NaiveDate,
  pub period_end:                NaiveDate,
  pub scenario:                  Scenario,
  pub projected_revenue:         f64,
  pub projected_service_revenue: f64,
  pub projected_product_revenue: f64,
  pub qoq_growth_rate:           f64,
  pub yoy_growth_rate:           Option<f64>,
  pub confidence_lower:          f64,
  pub confidence_upper:          f64,
  pub momentum:                  Momentum,
  pub seasonality_index:         f64,
  /// Only ever set on [`Scenario::Baseline`] rows.
  pub insights:                  Option<Vec<String>>,
  pub generated_at:              DateTime<Utc>,
  pub expires_at:                DateTime<Utc>,
}

impl ForecastProjection {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}
