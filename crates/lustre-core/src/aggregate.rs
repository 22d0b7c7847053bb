//! Roll daily sales facts up into months, then months into quarters.
//!
//! Both aggregates are derived per request and never persisted.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{
  period::{QuarterKey, month_key},
  sales::{DailySalesFact, finite_or_zero},
};

/// Sums over every daily fact recorded in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthAggregate {
  /// `YYYY-MM`.
  pub key:               String,
  pub year:              i32,
  pub month:             u32,
  pub total_revenue:     f64,
  pub service_revenue:   f64,
  pub product_revenue:   f64,
  pub transaction_count: i64,
  /// Distinct dates that contributed at least one fact.
  pub days:              usize,
}

/// Sums over the months of one calendar quarter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterAggregate {
  pub key:               QuarterKey,
  pub total_revenue:     f64,
  pub service_revenue:   f64,
  pub product_revenue:   f64,
  pub transaction_count: i64,
  pub days:              usize,
  /// Keys of the constituent [`MonthAggregate`]s, in order.
  pub months:            Vec<String>,
}

impl QuarterAggregate {
  fn empty(key: QuarterKey) -> Self {
    Self {
      key,
      total_revenue: 0.0,
      service_revenue: 0.0,
      product_revenue: 0.0,
      transaction_count: 0,
      days: 0,
      months: Vec::new(),
    }
  }
}

/// Single pass over `facts`, keyed by `YYYY-MM`.
pub fn aggregate_months(
  facts: &[DailySalesFact],
) -> BTreeMap<String, MonthAggregate> {
  let mut months: BTreeMap<String, MonthAggregate> = BTreeMap::new();
  let mut dates: HashMap<String, HashSet<NaiveDate>> = HashMap::new();

  for fact in facts {
    let key = month_key(fact.date);
    let month = months.entry(key.clone()).or_insert_with(|| MonthAggregate {
      key:               key.clone(),
      year:              fact.date.year(),
      month:             fact.date.month(),
      total_revenue:     0.0,
      service_revenue:   0.0,
      product_revenue:   0.0,
      transaction_count: 0,
      days:              0,
    });

    month.total_revenue += finite_or_zero(fact.total_revenue);
    month.service_revenue += finite_or_zero(fact.service_revenue);
    month.product_revenue += finite_or_zero(fact.product_revenue);
    month.transaction_count += fact.transaction_count;

    let seen = dates.entry(key).or_default();
    if seen.insert(fact.date) {
      month.days += 1;
    }
  }

  months
}

/// Fold months into quarters, sorted ascending by `year * 10 + quarter`.
pub fn aggregate_quarters(
  months: &BTreeMap<String, MonthAggregate>,
) -> Vec<QuarterAggregate> {
  let mut quarters: HashMap<QuarterKey, QuarterAggregate> = HashMap::new();

  for month in months.values() {
    let key = QuarterKey {
      year:    month.year,
      quarter: ((month.month - 1) / 3 + 1) as u8,
    };
    let quarter = quarters
      .entry(key)
      .or_insert_with(|| QuarterAggregate::empty(key));

    quarter.total_revenue += month.total_revenue;
    quarter.service_revenue += month.service_revenue;
    quarter.product_revenue += month.product_revenue;
    quarter.transaction_count += month.transaction_count;
    quarter.days += month.days;
    quarter.months.push(month.key.clone());
  }

  let mut ordered: Vec<QuarterAggregate> = quarters.into_values().collect();
  ordered.sort_by_key(|q| q.key.sort_key());
  ordered
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fact(y: i32, m: u32, d: u32, total: f64) -> DailySalesFact {
    let mut f = DailySalesFact::new(
      "org-1",
      NaiveDate::from_ymd_opt(y, m, d).unwrap(),
      total,
    );
    f.service_revenue = total * 0.8;
    f.product_revenue = total * 0.2;
    f.transaction_count = 2;
    f
  }

  #[test]
  fn empty_input_yields_nothing() {
    let months = aggregate_months(&[]);
    assert!(months.is_empty());
    assert!(aggregate_quarters(&months).is_empty());
  }

  #[test]
  fn months_sum_revenue_and_count_distinct_days() {
    let mut second_location = fact(2024, 1, 5, 50.0);
    second_location.location_id = Some("loc-2".into());

    let months = aggregate_months(&[
      fact(2024, 1, 5, 100.0),
      second_location,
      fact(2024, 1, 20, 200.0),
      fact(2024, 2, 1, 75.0),
    ]);

    assert_eq!(months.len(), 2);
    let jan = &months["2024-01"];
    assert_eq!(jan.total_revenue, 350.0);
    assert_eq!(jan.transaction_count, 6);
    assert_eq!(jan.days, 2);
    assert_eq!(months["2024-02"].days, 1);
  }

  #[test]
  fn non_finite_revenue_counts_as_zero() {
    let months = aggregate_months(&[
      fact(2024, 1, 5, f64::NAN),
      fact(2024, 1, 6, 10.0),
    ]);
    assert_eq!(months["2024-01"].total_revenue, 10.0);
  }

  #[test]
  fn quarters_are_chronological_and_reference_their_months() {
    // Deliberately out of order.
    let months = aggregate_months(&[
      fact(2024, 5, 1, 10.0),
      fact(2023, 11, 1, 20.0),
      fact(2024, 1, 1, 30.0),
      fact(2024, 3, 1, 40.0),
    ]);
    let quarters = aggregate_quarters(&months);

    let keys: Vec<String> = quarters.iter().map(|q| q.key.label()).collect();
    assert_eq!(keys, ["Q4 2023", "Q1 2024", "Q2 2024"]);

    let q1 = &quarters[1];
    assert_eq!(q1.total_revenue, 70.0);
    assert_eq!(q1.months, ["2024-01", "2024-03"]);
    assert_eq!(q1.days, 2);
  }
}
