//! Coarse classification of recent growth trajectory.
//!
//! This is a heuristic over the last few growth rates, not a statistical test:
//! two identical inputs always classify identically, and that is the only
//! guarantee.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Growth rates considered, most recent last.
const WINDOW: usize = 3;

/// Average change in percentage points that separates a trend from noise.
const THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
  Accelerating,
  Decelerating,
  #[default]
  Steady,
}

impl Momentum {
  /// Classify from quarter-over-quarter growth percentages.
  ///
  /// Takes the last three rates, averages their first differences, and
  /// compares against ±2 points. Fewer than two rates is `Steady`.
  pub fn classify(growth_rates: &[f64]) -> Self {
    let recent = &growth_rates[growth_rates.len().saturating_sub(WINDOW)..];
    if recent.len() < 2 {
      return Self::Steady;
    }

    let diffs: Vec<f64> = recent.windows(2).map(|w| w[1] - w[0]).collect();
    let average = diffs.iter().sum::<f64>() / diffs.len() as f64;

    if average > THRESHOLD {
      Self::Accelerating
    } else if average < -THRESHOLD {
      Self::Decelerating
    } else {
      Self::Steady
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Accelerating => "accelerating",
      Self::Decelerating => "decelerating",
      Self::Steady => "steady",
    }
  }
}

impl fmt::Display for Momentum {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Momentum {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "accelerating" => Ok(Self::Accelerating),
      "decelerating" => Ok(Self::Decelerating),
      "steady" => Ok(Self::Steady),
      other => Err(Error::UnknownMomentum(other.to_owned())),
    }
  }
}
