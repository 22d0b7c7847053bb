//! Calendar quarter and month keys.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Month key in `YYYY-MM` form. Lexicographic order is chronological.
pub fn month_key(date: NaiveDate) -> String {
  format!("{:04}-{:02}", date.year(), date.month())
}

/// A calendar quarter. The derived ordering (year, then quarter) matches
/// ordering by [`QuarterKey::sort_key`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct QuarterKey {
  pub year:    i32,
  /// 1 through 4.
  pub quarter: u8,
}

impl QuarterKey {
  /// Returns `None` unless `quarter` is in `1..=4`.
  pub fn new(year: i32, quarter: u8) -> Option<Self> {
    (1..=4).contains(&quarter).then_some(Self { year, quarter })
  }

  pub fn from_date(date: NaiveDate) -> Self {
    Self {
      year:    date.year(),
      quarter: (date.month0() / 3 + 1) as u8,
    }
  }

  /// The quarter containing the instant `now`.
  pub fn containing(now: DateTime<Utc>) -> Self { Self::from_date(now.date_naive()) }

  /// `year * 10 + quarter`; strictly increasing with time.
  pub fn sort_key(self) -> i32 { self.year * 10 + i32::from(self.quarter) }

  /// Number of quarters since year 0, used for distance arithmetic.
  fn ordinal(self) -> i64 { i64::from(self.year) * 4 + i64::from(self.quarter) - 1 }

  /// Quarters from `earlier` to `self`; negative if `earlier` is later.
  pub fn distance_from(self, earlier: QuarterKey) -> i64 {
    self.ordinal() - earlier.ordinal()
  }

  pub fn next(self) -> Self {
    if self.quarter >= 4 {
      Self { year: self.year + 1, quarter: 1 }
    } else {
      Self { year: self.year, quarter: self.quarter + 1 }
    }
  }

  /// The same quarter one year earlier.
  pub fn year_before(self) -> Self { Self { year: self.year - 1, ..self } }

  /// First day of the quarter. Years outside chrono's range saturate.
  pub fn start_date(self) -> NaiveDate {
    let month = u32::from(self.quarter.clamp(1, 4) - 1) * 3 + 1;
    NaiveDate::from_ymd_opt(self.year, month, 1).unwrap_or(NaiveDate::MAX)
  }

  /// Last day of the quarter.
  pub fn end_date(self) -> NaiveDate {
    self
      .next()
      .start_date()
      .pred_opt()
      .unwrap_or(NaiveDate::MAX)
  }

  /// Human-readable label, e.g. `Q3 2026`.
  pub fn label(self) -> String { self.to_string() }
}

impl fmt::Display for QuarterKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Q{} {}", self.quarter, self.year)
  }
}
