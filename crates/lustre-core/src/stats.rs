//! Least-squares trend fitting and growth rates.

use serde::Serialize;

/// Result of an ordinary least-squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Regression {
  pub slope:     f64,
  pub intercept: f64,
  /// Coefficient of determination in `[0, 1]`; `0` for degenerate input.
  pub r_squared: f64,
}

impl Regression {
  fn flat(intercept: f64) -> Self {
    Self { slope: 0.0, intercept, r_squared: 0.0 }
  }

  pub fn predict(&self, x: f64) -> f64 { self.slope * x + self.intercept }
}

/// Fit a line through `points` of `(x, y)`.
///
/// Fewer than two points, or no spread in `x`, yields a flat line through the
/// mean of `y` (the single value, or `0` for no points) with `r_squared = 0`.
pub fn linear_regression(points: &[(f64, f64)]) -> Regression {
  let n = points.len() as f64;
  match points {
    [] => return Regression::flat(0.0),
    [(_, y)] => return Regression::flat(*y),
    _ => {}
  }

  let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
  for &(x, y) in points {
    sum_x += x;
    sum_y += y;
    sum_xy += x * y;
    sum_x2 += x * x;
  }

  let denom = n * sum_x2 - sum_x * sum_x;
  if denom == 0.0 {
    return Regression::flat(sum_y / n);
  }

  let slope = (n * sum_xy - sum_x * sum_y) / denom;
  let intercept = (sum_y - slope * sum_x) / n;

  let mean_y = sum_y / n;
  let (ss_res, ss_tot) = points.iter().fold((0.0, 0.0), |(res, tot), &(x, y)| {
    let predicted = slope * x + intercept;
    (res + (y - predicted).powi(2), tot + (y - mean_y).powi(2))
  });
  let r_squared = if ss_tot > 0.0 {
    (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
  } else {
    0.0
  };

  Regression { slope, intercept, r_squared }
}

/// Percentage change from `previous` to `current`. A zero base yields `0`.
pub fn growth_rate(previous: f64, current: f64) -> f64 {
  if previous == 0.0 {
    0.0
  } else {
    (current - previous) / previous * 100.0
  }
}

/// Quarter-over-quarter growth for consecutive values; one shorter than the
/// input.
pub fn qoq_growth_rates(revenues: &[f64]) -> Vec<f64> {
  revenues
    .windows(2)
    .map(|pair| growth_rate(pair[0], pair[1]))
    .collect()
}
