//! Multiplicative seasonal indices per calendar quarter.

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::aggregate::QuarterAggregate;

/// How much each calendar quarter historically over- or under-performs the
/// average quarter. `1.0` is neutral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalIndices([f64; 4]);

impl SeasonalIndices {
  pub const NEUTRAL: Self = Self([1.0; 4]);

  /// For each quarter number, the mean of `revenue / overall_mean` over every
  /// occurrence of that quarter. Quarters never observed stay at `1.0`; a zero
  /// overall mean makes every index `1.0`.
  pub fn compute(quarters: &[QuarterAggregate]) -> Self {
    if quarters.is_empty() {
      return Self::NEUTRAL;
    }

    let mean = quarters.iter().map(|q| q.total_revenue).sum::<f64>()
      / quarters.len() as f64;
    if mean == 0.0 || !mean.is_finite() {
      return Self::NEUTRAL;
    }

    let mut sums = [0.0; 4];
    let mut counts = [0usize; 4];
    for q in quarters {
      let slot = usize::from(q.key.quarter.clamp(1, 4) - 1);
      sums[slot] += q.total_revenue / mean;
      counts[slot] += 1;
    }

    let mut indices = [1.0; 4];
    for slot in 0..4 {
      if counts[slot] > 0 {
        indices[slot] = sums[slot] / counts[slot] as f64;
      }
    }
    Self(indices)
  }

  /// Index for quarter number `1..=4`; anything else is neutral.
  pub fn for_quarter(&self, quarter: u8) -> f64 {
    match quarter {
      1..=4 => self.0[usize::from(quarter - 1)],
      _ => 1.0,
    }
  }

  /// The quarter number with the highest index (earliest wins ties).
  pub fn strongest(&self) -> (u8, f64) {
    let mut best = (1u8, self.0[0]);
    for (slot, &index) in self.0.iter().enumerate().skip(1) {
      if index > best.1 {
        best = (slot as u8 + 1, index);
      }
    }
    best
  }

  pub fn as_array(&self) -> [f64; 4] { self.0 }
}

impl Default for SeasonalIndices {
  fn default() -> Self { Self::NEUTRAL }
}

/// Serialised as `{"Q1": .., "Q2": .., "Q3": .., "Q4": ..}`.
impl Serialize for SeasonalIndices {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(4))?;
    for (slot, index) in self.0.iter().enumerate() {
      map.serialize_entry(&format!("Q{}", slot + 1), index)?;
    }
    map.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::period::QuarterKey;

  fn quarter(year: i32, q: u8, revenue: f64) -> QuarterAggregate {
    QuarterAggregate {
      key:               QuarterKey::new(year, q).unwrap(),
      total_revenue:     revenue,
      service_revenue:   0.0,
      product_revenue:   0.0,
      transaction_count: 0,
      days:              0,
      months:            Vec::new(),
    }
  }

  #[test]
  fn empty_and_zero_revenue_are_neutral() {
    assert_eq!(SeasonalIndices::compute(&[]), SeasonalIndices::NEUTRAL);
    let zeros = [quarter(2024, 1, 0.0), quarter(2024, 2, 0.0)];
    assert_eq!(SeasonalIndices::compute(&zeros), SeasonalIndices::NEUTRAL);
  }

  #[test]
  fn unseen_quarters_default_to_one() {
    let data = [quarter(2024, 1, 100.0), quarter(2024, 2, 300.0)];
    let idx = SeasonalIndices::compute(&data);
    assert_eq!(idx.for_quarter(1), 0.5);
    assert_eq!(idx.for_quarter(2), 1.5);
    assert_eq!(idx.for_quarter(3), 1.0);
    assert_eq!(idx.for_quarter(4), 1.0);
    assert_eq!(idx.for_quarter(9), 1.0);
  }

  #[test]
  fn evenly_distributed_indices_average_to_one() {
    let data = [
      quarter(2023, 1, 80.0),
      quarter(2023, 2, 100.0),
      quarter(2023, 3, 90.0),
      quarter(2023, 4, 150.0),
      quarter(2024, 1, 95.0),
      quarter(2024, 2, 110.0),
      quarter(2024, 3, 105.0),
      quarter(2024, 4, 170.0),
    ];
    let idx = SeasonalIndices::compute(&data);
    // Each quarter occurs twice; the occurrence-weighted sum over four
    // quarters is the number of observations divided by two.
    let weighted: f64 = idx.as_array().iter().map(|i| i * 2.0).sum();
    assert!((weighted / 2.0 - 4.0).abs() < 1e-9);
    assert_eq!(idx.strongest().0, 4);
  }

  #[test]
  fn serialises_with_quarter_labels() {
    let json = serde_json::to_value(SeasonalIndices::NEUTRAL).unwrap();
    assert_eq!(json["Q1"], 1.0);
    assert_eq!(json["Q4"], 1.0);
  }
}
