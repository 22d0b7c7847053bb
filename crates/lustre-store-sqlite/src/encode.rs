//! Encoding and decoding helpers between Lustre domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical comparison in SQL is chronological.
//! Dates are `YYYY-MM-DD`. UUIDs are hyphenated lowercase strings. Insights
//! are a compact JSON array.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use lustre_core::{
  forecast::ForecastProjection,
  sales::{DailySalesFact, parse_count, parse_revenue},
};
use rusqlite::types::Value as SqlValue;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Location ────────────────────────────────────────────────────────────────

/// The non-null key column standing in for an optional location, so that
/// organization-wide rows still participate in unique constraints.
pub fn location_key(location_id: Option<&str>) -> String {
  location_id.unwrap_or_default().to_owned()
}

// ─── Loose numerics ──────────────────────────────────────────────────────────

/// Convert whatever SQLite handed back for a NUMERIC column into JSON, so the
/// core's lenient coercion applies to it.
fn sql_to_json(value: SqlValue) -> serde_json::Value {
  match value {
    SqlValue::Integer(i) => serde_json::Value::from(i),
    SqlValue::Real(f) => serde_json::Number::from_f64(f)
      .map(serde_json::Value::Number)
      .unwrap_or(serde_json::Value::Null),
    SqlValue::Text(s) => serde_json::Value::String(s),
    SqlValue::Null | SqlValue::Blob(_) => serde_json::Value::Null,
  }
}

pub fn decode_revenue(value: SqlValue) -> f64 { parse_revenue(&sql_to_json(value)) }

pub fn decode_count(value: SqlValue) -> i64 { parse_count(&sql_to_json(value)) }

// ─── Insights ────────────────────────────────────────────────────────────────

pub fn encode_insights(insights: Option<&[String]>) -> Result<Option<String>> {
  insights.map(serde_json::to_string).transpose().map_err(Error::from)
}

pub fn decode_insights(s: Option<&str>) -> Result<Option<Vec<String>>> {
  s.map(serde_json::from_str).transpose().map_err(Error::from)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `daily_sales` row.
pub struct RawDailySale {
  pub organization_id:   String,
  pub location_id:       Option<String>,
  pub date:              String,
  pub total_revenue:     SqlValue,
  pub service_revenue:   SqlValue,
  pub product_revenue:   SqlValue,
  pub transaction_count: SqlValue,
}

impl RawDailySale {
  pub fn into_fact(self) -> Result<DailySalesFact> {
    Ok(DailySalesFact {
      organization_id:   self.organization_id,
      location_id:       self.location_id,
      date:              decode_date(&self.date)?,
      total_revenue:     decode_revenue(self.total_revenue),
      service_revenue:   decode_revenue(self.service_revenue),
      product_revenue:   decode_revenue(self.product_revenue),
      transaction_count: decode_count(self.transaction_count),
    })
  }
}

/// Column values of one `forecast_projections` row, in string form where the
/// database stores text.
pub struct RawProjection {
  pub forecast_id:               String,
  pub organization_id:           String,
  pub location_id:               Option<String>,
  pub forecast_type:             String,
  pub period_label:              String,
  pub period_start:              String,
  pub period_end:                String,
  pub scenario:                  String,
  pub projected_revenue:         f64,
  pub projected_service_revenue: f64,
  pub projected_product_revenue: f64,
  pub qoq_growth_rate:           f64,
  pub yoy_growth_rate:           Option<f64>,
  pub confidence_lower:          f64,
  pub confidence_upper:          f64,
  pub momentum:                  String,
  pub seasonality_index:         f64,
  pub insights:                  Option<String>,
  pub generated_at:              String,
  pub expires_at:                String,
}

impl RawProjection {
  pub fn encode(p: &ForecastProjection) -> Result<Self> {
    Ok(Self {
      forecast_id:               encode_uuid(p.forecast_id),
      organization_id:           p.organization_id.clone(),
      location_id:               p.location_id.clone(),
      forecast_type:             p.forecast_type.as_str().to_owned(),
      period_label:              p.period_label.clone(),
      period_start:              encode_date(p.period_start),
      period_end:                encode_date(p.period_end),
      scenario:                  p.scenario.as_str().to_owned(),
      projected_revenue:         p.projected_revenue,
      projected_service_revenue: p.projected_service_revenue,
      projected_product_revenue: p.projected_product_revenue,
      qoq_growth_rate:           p.qoq_growth_rate,
      yoy_growth_rate:           p.yoy_growth_rate,
      confidence_lower:          p.confidence_lower,
      confidence_upper:          p.confidence_upper,
      momentum:                  p.momentum.as_str().to_owned(),
      seasonality_index:         p.seasonality_index,
      insights:                  encode_insights(p.insights.as_deref())?,
      generated_at:              encode_dt(p.generated_at),
      expires_at:                encode_dt(p.expires_at),
    })
  }

  pub fn into_projection(self) -> Result<ForecastProjection> {
    Ok(ForecastProjection {
      forecast_id:               decode_uuid(&self.forecast_id)?,
      organization_id:           self.organization_id,
      location_id:               self.location_id,
      forecast_type:             self.forecast_type.parse()?,
      period_label:              self.period_label,
      period_start:              decode_date(&self.period_start)?,
      period_end:                decode_date(&self.period_end)?,
      scenario:                  self.scenario.parse()?,
      projected_revenue:         self.projected_revenue,
      projected_service_revenue: self.projected_service_revenue,
      projected_product_revenue: self.projected_product_revenue,
      qoq_growth_rate:           self.qoq_growth_rate,
      yoy_growth_rate:           self.yoy_growth_rate,
      confidence_lower:          self.confidence_lower,
      confidence_upper:          self.confidence_upper,
      momentum:                  self.momentum.parse()?,
      seasonality_index:         self.seasonality_index,
      insights:                  decode_insights(self.insights.as_deref())?,
      generated_at:              decode_dt(&self.generated_at)?,
      expires_at:                decode_dt(&self.expires_at)?,
    })
  }
}
