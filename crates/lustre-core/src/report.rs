//! The forecast response returned to callers.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  aggregate::QuarterAggregate,
  analysis::Analysis,
  forecast::ForecastProjection,
  insight::NO_DATA_INSIGHT,
  momentum::Momentum,
  projection::Scenario,
  seasonal::SeasonalIndices,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  Cache,
  Computed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
  Actual,
  Projected,
}

/// One quarter in the response, either historical or projected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
  pub period:            String,
  pub period_start:      NaiveDate,
  pub period_end:        NaiveDate,
  #[serde(rename = "type")]
  pub kind:              PeriodKind,
  pub total_revenue:     f64,
  pub service_revenue:   f64,
  pub product_revenue:   f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub transactions:      Option<i64>,
  pub qoq_growth:        Option<f64>,
  pub yoy_growth:        Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub confidence_lower:  Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub confidence_upper:  Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub momentum:          Option<Momentum>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub seasonality_index: Option<f64>,
}

impl Period {
  fn actual(
    quarter: &QuarterAggregate,
    qoq_growth: Option<f64>,
    yoy_growth: Option<f64>,
  ) -> Self {
    Self {
      period: quarter.key.label(),
      period_start: quarter.key.start_date(),
      period_end: quarter.key.end_date(),
      kind: PeriodKind::Actual,
      total_revenue: quarter.total_revenue,
      service_revenue: quarter.service_revenue,
      product_revenue: quarter.product_revenue,
      transactions: Some(quarter.transaction_count),
      qoq_growth,
      yoy_growth,
      confidence_lower: None,
      confidence_upper: None,
      momentum: None,
      seasonality_index: None,
    }
  }
}

impl From<&ForecastProjection> for Period {
  fn from(row: &ForecastProjection) -> Self {
    Self {
      period:            row.period_label.clone(),
      period_start:      row.period_start,
      period_end:        row.period_end,
      kind:              PeriodKind::Projected,
      total_revenue:     row.projected_revenue,
      service_revenue:   row.projected_service_revenue,
      product_revenue:   row.projected_product_revenue,
      transactions:      None,
      qoq_growth:        Some(row.qoq_growth_rate),
      yoy_growth:        row.yoy_growth_rate,
      confidence_lower:  Some(row.confidence_lower),
      confidence_upper:  Some(row.confidence_upper),
      momentum:          Some(row.momentum),
      seasonality_index: Some(row.seasonality_index),
    }
  }
}

/// Headline figures for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
  pub momentum:              Momentum,
  pub last_qoq_growth:       Option<f64>,
  pub yoy_growth:            Option<f64>,
  pub seasonal_indices:      SeasonalIndices,
  pub trend_r2:              f64,
  /// Daily facts the forecast was computed from.
  pub data_points:           usize,
  pub quarters_available:    usize,
  pub next_quarter_baseline: Option<f64>,
  pub next_quarter_label:    Option<String>,
}

/// Everything returned for one forecast request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
  pub source:    Source,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub forecasts: Option<Vec<ForecastProjection>>,
  pub scenarios: BTreeMap<Scenario, Vec<Period>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub actuals:   Option<Vec<Period>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub insights:  Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub summary:   Option<Summary>,
}

impl ForecastResponse {
  /// Served straight from unexpired cached rows.
  pub fn from_cache(rows: Vec<ForecastProjection>) -> Self {
    let insights = rows
      .iter()
      .find(|r| r.scenario == Scenario::Baseline && r.insights.is_some())
      .and_then(|r| r.insights.clone());

    Self {
      source: Source::Cache,
      scenarios: group_by_scenario(&rows),
      forecasts: Some(rows),
      actuals: None,
      insights,
      summary: None,
    }
  }

  /// No daily facts exist for the organization.
  pub fn insufficient_data() -> Self {
    Self {
      source:    Source::Computed,
      forecasts: Some(Vec::new()),
      scenarios: BTreeMap::new(),
      actuals:   Some(Vec::new()),
      insights:  Some(vec![NO_DATA_INSIGHT.to_owned()]),
      summary:   Some(Summary {
        momentum:              Momentum::Steady,
        last_qoq_growth:       None,
        yoy_growth:            None,
        seasonal_indices:      SeasonalIndices::NEUTRAL,
        trend_r2:              0.0,
        data_points:           0,
        quarters_available:    0,
        next_quarter_baseline: None,
        next_quarter_label:    None,
      }),
    }
  }

  /// Freshly computed from `analysis`; `rows` are the projections just
  /// written to the cache.
  pub fn computed(
    analysis: &Analysis,
    rows: Vec<ForecastProjection>,
    insights: Vec<String>,
  ) -> Self {
    let scenarios = group_by_scenario(&rows);
    let next = scenarios
      .get(&Scenario::Baseline)
      .and_then(|periods| periods.first());

    let summary = Summary {
      momentum:              analysis.momentum,
      last_qoq_growth:       analysis.last_qoq_growth(),
      yoy_growth:            analysis.yoy_growth,
      seasonal_indices:      analysis.seasonal,
      trend_r2:              analysis.regression.r_squared,
      data_points:           analysis.data_points,
      quarters_available:    analysis.quarters.len(),
      next_quarter_baseline: next.map(|p| p.total_revenue),
      next_quarter_label:    next.map(|p| p.period.clone()),
    };

    Self {
      source: Source::Computed,
      forecasts: Some(rows),
      scenarios,
      actuals: Some(actual_periods(analysis)),
      insights: Some(insights),
      summary: Some(summary),
    }
  }
}

/// Historical quarters with their growth figures.
pub fn actual_periods(analysis: &Analysis) -> Vec<Period> {
  analysis
    .quarters
    .iter()
    .enumerate()
    .map(|(i, q)| {
      let qoq = i.checked_sub(1).map(|prev| analysis.growth_rates[prev]);
      let yoy = analysis.yoy_growth_for(q.key, q.total_revenue);
      Period::actual(q, qoq, yoy)
    })
    .collect()
}

/// Group projection rows by scenario, each list ordered by period start.
pub fn group_by_scenario(
  rows: &[ForecastProjection],
) -> BTreeMap<Scenario, Vec<Period>> {
  let mut grouped: BTreeMap<Scenario, Vec<Period>> = BTreeMap::new();
  for row in rows {
    grouped.entry(row.scenario).or_default().push(Period::from(row));
  }
  for periods in grouped.values_mut() {
    periods.sort_by_key(|p| p.period_start);
  }
  grouped
}
