//! Daily sales facts, the raw input of the forecast engine.
//!
//! Facts are written by an external ingestion process and never modified.
//! Revenue columns are not trusted to be numeric: anything that does not
//! coerce cleanly to a finite number counts as zero.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One day of sales for an organization at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySalesFact {
  pub organization_id:   String,
  #[serde(default)]
  pub location_id:       Option<String>,
  pub date:              NaiveDate,
  #[serde(default, deserialize_with = "lenient_revenue")]
  pub total_revenue:     f64,
  #[serde(default, deserialize_with = "lenient_revenue")]
  pub service_revenue:   f64,
  #[serde(default, deserialize_with = "lenient_revenue")]
  pub product_revenue:   f64,
  #[serde(default, deserialize_with = "lenient_count")]
  pub transaction_count: i64,
}

impl DailySalesFact {
  /// Convenience constructor with service/product revenue and transaction
  /// count zeroed.
  pub fn new(
    organization_id: impl Into<String>,
    date: NaiveDate,
    total_revenue: f64,
  ) -> Self {
    Self {
      organization_id: organization_id.into(),
      location_id: None,
      date,
      total_revenue,
      service_revenue: 0.0,
      product_revenue: 0.0,
      transaction_count: 0,
    }
  }
}

/// Coerce a loosely-typed revenue value to a number.
///
/// Numbers pass through, numeric strings are parsed, and everything else
/// (null, booleans, arrays, unparseable text, NaN, infinities) becomes `0.0`.
pub fn parse_revenue(raw: &Value) -> f64 {
  let parsed = match raw {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  finite_or_zero(parsed.unwrap_or(0.0))
}

/// Same coercion as [`parse_revenue`], truncated to a whole count.
pub fn parse_count(raw: &Value) -> i64 { parse_revenue(raw).trunc() as i64 }

pub(crate) fn finite_or_zero(v: f64) -> f64 { if v.is_finite() { v } else { 0.0 } }

fn lenient_revenue<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Value::deserialize(deserializer)?;
  Ok(parse_revenue(&raw))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Value::deserialize(deserializer)?;
  Ok(parse_count(&raw))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn parse_revenue_passes_numbers_through() {
    assert_eq!(parse_revenue(&json!(125.5)), 125.5);
    assert_eq!(parse_revenue(&json!(-40)), -40.0);
  }

  #[test]
  fn parse_revenue_parses_numeric_strings() {
    assert_eq!(parse_revenue(&json!("310.25")), 310.25);
    assert_eq!(parse_revenue(&json!("  12 ")), 12.0);
  }

  #[test]
  fn parse_revenue_zeroes_garbage() {
    assert_eq!(parse_revenue(&Value::Null), 0.0);
    assert_eq!(parse_revenue(&json!("")), 0.0);
    assert_eq!(parse_revenue(&json!("n/a")), 0.0);
    assert_eq!(parse_revenue(&json!("NaN")), 0.0);
    assert_eq!(parse_revenue(&json!("inf")), 0.0);
    assert_eq!(parse_revenue(&json!(true)), 0.0);
    assert_eq!(parse_revenue(&json!([1, 2])), 0.0);
  }

  #[test]
  fn parse_count_truncates() {
    assert_eq!(parse_count(&json!("17.9")), 17);
    assert_eq!(parse_count(&Value::Null), 0);
  }

  #[test]
  fn deserialize_tolerates_missing_and_malformed_fields() {
    let fact: DailySalesFact = serde_json::from_value(json!({
      "organization_id": "org-1",
      "date": "2024-03-02",
      "total_revenue": "820.50",
      "service_revenue": null,
      "product_revenue": "lots",
    }))
    .unwrap();

    assert_eq!(fact.total_revenue, 820.5);
    assert_eq!(fact.service_revenue, 0.0);
    assert_eq!(fact.product_revenue, 0.0);
    assert_eq!(fact.transaction_count, 0);
    assert_eq!(fact.location_id, None);
  }
}
