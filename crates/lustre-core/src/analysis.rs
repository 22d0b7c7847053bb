//! Historical analysis of an organization's daily sales.
//!
//! Everything here is pure: the same facts always produce the same
//! [`Analysis`].

use std::collections::BTreeMap;

use crate::{
  aggregate::{MonthAggregate, QuarterAggregate, aggregate_months, aggregate_quarters},
  momentum::Momentum,
  period::QuarterKey,
  sales::DailySalesFact,
  seasonal::SeasonalIndices,
  stats::{Regression, growth_rate, linear_regression, qoq_growth_rates},
};

/// Aggregates and statistics derived from the full sales history.
#[derive(Debug, Clone)]
pub struct Analysis {
  /// Number of daily facts the analysis was built from.
  pub data_points:  usize,
  pub months:       BTreeMap<String, MonthAggregate>,
  /// Chronological; index `i` is the regression's `x = i`.
  pub quarters:     Vec<QuarterAggregate>,
  /// `quarters.len() - 1` entries, one per consecutive pair.
  pub growth_rates: Vec<f64>,
  pub regression:   Regression,
  pub seasonal:     SeasonalIndices,
  pub momentum:     Momentum,
  /// Most recent quarter against the same quarter a year earlier.
  pub yoy_growth:   Option<f64>,
}

impl Analysis {
  /// Returns `None` when there are no facts at all.
  pub fn from_facts(facts: &[DailySalesFact]) -> Option<Self> {
    if facts.is_empty() {
      return None;
    }

    let months = aggregate_months(facts);
    let quarters = aggregate_quarters(&months);

    let revenues: Vec<f64> = quarters.iter().map(|q| q.total_revenue).collect();
    let growth_rates = qoq_growth_rates(&revenues);
    let points: Vec<(f64, f64)> = revenues
      .iter()
      .enumerate()
      .map(|(i, revenue)| (i as f64, *revenue))
      .collect();

    let mut analysis = Self {
      data_points: facts.len(),
      regression: linear_regression(&points),
      seasonal: SeasonalIndices::compute(&quarters),
      momentum: Momentum::classify(&growth_rates),
      months,
      quarters,
      growth_rates,
      yoy_growth: None,
    };
    analysis.yoy_growth = analysis
      .latest()
      .and_then(|q| analysis.yoy_growth_for(q.key, q.total_revenue));

    Some(analysis)
  }

  pub fn latest(&self) -> Option<&QuarterAggregate> { self.quarters.last() }

  /// Actual revenue recorded for `key`, if that quarter has any facts.
  pub fn revenue_for(&self, key: QuarterKey) -> Option<f64> {
    self
      .quarters
      .iter()
      .find(|q| q.key == key)
      .map(|q| q.total_revenue)
  }

  /// Growth of `value` over the actual revenue of the same quarter one year
  /// before `key`. `None` when that quarter is absent or had no revenue.
  pub fn yoy_growth_for(&self, key: QuarterKey, value: f64) -> Option<f64> {
    self
      .revenue_for(key.year_before())
      .filter(|prior| *prior != 0.0)
      .map(|prior| growth_rate(prior, value))
  }

  /// The most recent quarter-over-quarter growth rate.
  pub fn last_qoq_growth(&self) -> Option<f64> { self.growth_rates.last().copied() }
}
