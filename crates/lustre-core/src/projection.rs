//! Trend × seasonality × scenario projection of future quarters.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  Error, aggregate::QuarterAggregate, analysis::Analysis, period::QuarterKey,
  stats::growth_rate,
};

/// Half-width of the confidence band, as a fraction of the projected value.
/// A display heuristic; not derived from the regression residuals.
pub const CONFIDENCE_MARGIN: f64 = 0.15;

/// Service share of projected revenue under [`RevenueSplit::Fixed`].
pub const FIXED_SERVICE_SHARE: f64 = 0.70;

// ─── Scenario ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
  Conservative,
  Baseline,
  Optimistic,
}

impl Scenario {
  pub const ALL: [Scenario; 3] =
    [Scenario::Conservative, Scenario::Baseline, Scenario::Optimistic];

  pub fn multiplier(&self) -> f64 {
    match self {
      Self::Conservative => 0.85,
      Self::Baseline => 1.0,
      Self::Optimistic => 1.15,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Conservative => "conservative",
      Self::Baseline => "baseline",
      Self::Optimistic => "optimistic",
    }
  }
}

impl fmt::Display for Scenario {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Scenario {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "conservative" => Ok(Self::Conservative),
      "baseline" => Ok(Self::Baseline),
      "optimistic" => Ok(Self::Optimistic),
      other => Err(Error::UnknownScenario(other.to_owned())),
    }
  }
}

// ─── Revenue split ───────────────────────────────────────────────────────────

/// How projected total revenue is divided between services and retail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenueSplit {
  /// Always 70 % services, 30 % products.
  #[default]
  Fixed,
  /// The historical service share across all actual quarters; falls back to
  /// the fixed share when there is no service or product revenue on record.
  Historical,
}

impl RevenueSplit {
  pub fn service_share(&self, quarters: &[QuarterAggregate]) -> f64 {
    match self {
      Self::Fixed => FIXED_SERVICE_SHARE,
      Self::Historical => {
        let service: f64 = quarters.iter().map(|q| q.service_revenue).sum();
        let product: f64 = quarters.iter().map(|q| q.product_revenue).sum();
        let total = service + product;
        if total > 0.0 && service >= 0.0 && product >= 0.0 {
          service / total
        } else {
          FIXED_SERVICE_SHARE
        }
      }
    }
  }
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// One projected quarter under one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedQuarter {
  pub key:               QuarterKey,
  pub scenario:          Scenario,
  pub total_revenue:     f64,
  pub service_revenue:   f64,
  pub product_revenue:   f64,
  /// Against the previous quarter of the same scenario (or the last actual).
  pub qoq_growth:        f64,
  /// Against the actual quarter one year earlier, when recorded.
  pub yoy_growth:        Option<f64>,
  pub confidence_lower:  f64,
  pub confidence_upper:  f64,
  pub seasonality_index: f64,
}

/// `max(0, trend) × seasonal_index × scenario multiplier`.
pub fn project_value(trend: f64, seasonal_index: f64, scenario: Scenario) -> f64 {
  trend.max(0.0) * seasonal_index * scenario.multiplier()
}

/// Project `horizon` quarters following `current` under every scenario.
///
/// The trend is extrapolated from the regression at the target quarter's
/// distance past the last actual quarter, so gaps between the last recorded
/// quarter and `current` are accounted for. Output is grouped by scenario,
/// then chronological.
pub fn project(
  analysis: &Analysis,
  current: QuarterKey,
  horizon: u32,
  split: RevenueSplit,
) -> Vec<ProjectedQuarter> {
  let Some(last) = analysis.latest() else {
    return Vec::new();
  };
  let last_index = (analysis.quarters.len() - 1) as f64;
  let service_share = split.service_share(&analysis.quarters);

  let mut projected =
    Vec::with_capacity(Scenario::ALL.len() * horizon as usize);
  for scenario in Scenario::ALL {
    let mut previous = last.total_revenue;
    let mut target = current;
    for _ in 0..horizon {
      target = target.next();
      let x = last_index + target.distance_from(last.key) as f64;
      let seasonality_index = analysis.seasonal.for_quarter(target.quarter);
      let total =
        project_value(analysis.regression.predict(x), seasonality_index, scenario);

      projected.push(ProjectedQuarter {
        key: target,
        scenario,
        total_revenue: total,
        service_revenue: total * service_share,
        product_revenue: total * (1.0 - service_share),
        qoq_growth: growth_rate(previous, total),
        yoy_growth: analysis.yoy_growth_for(target, total),
        confidence_lower: total * (1.0 - CONFIDENCE_MARGIN),
        confidence_upper: total * (1.0 + CONFIDENCE_MARGIN),
        seasonality_index,
      });
      previous = total;
    }
  }
  projected
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::sales::DailySalesFact;

  fn analysis(quarterly: &[(i32, u32, f64)]) -> Analysis {
    let facts: Vec<DailySalesFact> = quarterly
      .iter()
      .map(|&(y, m, total)| {
        let mut f = DailySalesFact::new(
          "org-1",
          NaiveDate::from_ymd_opt(y, m, 10).unwrap(),
          total,
        );
        f.service_revenue = total * 0.6;
        f.product_revenue = total * 0.4;
        f
      })
      .collect();
    Analysis::from_facts(&facts).unwrap()
  }

  fn close(a: f64, b: f64) -> bool { (a - b).abs() < 1e-6 }

  #[test]
  fn project_value_clamps_negative_trend() {
    assert_eq!(project_value(-500.0, 1.2, Scenario::Optimistic), 0.0);
    assert!(close(project_value(1000.0, 1.2, Scenario::Conservative), 1020.0));
  }

  #[test]
  fn scenarios_are_strictly_ordered_for_positive_trend() {
    for trend in [0.01, 1.0, 12_345.0] {
      let c = project_value(trend, 0.9, Scenario::Conservative);
      let b = project_value(trend, 0.9, Scenario::Baseline);
      let o = project_value(trend, 0.9, Scenario::Optimistic);
      assert!(c < b && b < o, "{trend}: {c} {b} {o}");
    }
  }

  #[test]
  fn projects_horizon_quarters_per_scenario() {
    let a = analysis(&[
      (2024, 2, 10_000.0),
      (2024, 5, 12_000.0),
      (2024, 8, 11_000.0),
      (2024, 11, 15_000.0),
    ]);
    let current = QuarterKey::new(2024, 4).unwrap();
    let out = project(&a, current, 4, RevenueSplit::Fixed);
    assert_eq!(out.len(), 12);

    let baseline: Vec<&ProjectedQuarter> =
      out.iter().filter(|p| p.scenario == Scenario::Baseline).collect();
    let labels: Vec<String> = baseline.iter().map(|p| p.key.label()).collect();
    assert_eq!(labels, ["Q1 2025", "Q2 2025", "Q3 2025", "Q4 2025"]);

    for p in &out {
      let x = 3.0 + p.key.distance_from(current) as f64;
      let expected = project_value(
        a.regression.predict(x),
        a.seasonal.for_quarter(p.key.quarter),
        p.scenario,
      );
      assert!(close(p.total_revenue, expected));
      assert!(close(p.confidence_lower, p.total_revenue * 0.85));
      assert!(close(p.confidence_upper, p.total_revenue * 1.15));
      assert!(close(p.service_revenue, p.total_revenue * 0.7));
      assert!(close(p.product_revenue, p.total_revenue * 0.3));
    }
  }

  #[test]
  fn yoy_uses_actual_quarter_a_year_back() {
    let a = analysis(&[(2024, 2, 10_000.0), (2024, 5, 12_000.0)]);
    let out = project(&a, QuarterKey::new(2024, 2).unwrap(), 4, RevenueSplit::Fixed);
    let q1_2025 = out
      .iter()
      .find(|p| p.scenario == Scenario::Baseline && p.key.label() == "Q1 2025")
      .unwrap();
    let expected = (q1_2025.total_revenue - 10_000.0) / 10_000.0 * 100.0;
    assert!(close(q1_2025.yoy_growth.unwrap(), expected));

    let q3_2024 = out
      .iter()
      .find(|p| p.scenario == Scenario::Baseline && p.key.label() == "Q3 2024")
      .unwrap();
    assert_eq!(q3_2024.yoy_growth, None);
  }

  #[test]
  fn first_projection_growth_is_against_last_actual() {
    let a = analysis(&[(2024, 2, 1000.0), (2024, 5, 2000.0)]);
    let out = project(&a, QuarterKey::new(2024, 2).unwrap(), 2, RevenueSplit::Fixed);
    let first = &out[0];
    assert!(close(first.qoq_growth, growth_rate(2000.0, first.total_revenue)));
    let second = &out[1];
    assert_eq!(second.scenario, first.scenario);
    assert!(close(
      second.qoq_growth,
      growth_rate(first.total_revenue, second.total_revenue)
    ));
  }

  #[test]
  fn historical_split_uses_recorded_mix() {
    let a = analysis(&[(2024, 2, 1000.0), (2024, 5, 2000.0)]);
    let share = RevenueSplit::Historical.service_share(&a.quarters);
    assert!(close(share, 0.6));
    assert_eq!(RevenueSplit::Fixed.service_share(&a.quarters), 0.7);

    let empty = analysis(&[(2024, 2, 0.0)]);
    assert_eq!(RevenueSplit::Historical.service_share(&empty.quarters), 0.7);
  }

  #[test]
  fn scenario_labels_round_trip() {
    for s in Scenario::ALL {
      assert_eq!(s.as_str().parse::<Scenario>().unwrap(), s);
    }
    assert!("wild".parse::<Scenario>().is_err());
  }
}
