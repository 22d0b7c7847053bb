//! Storage traits consumed by the forecast engine.
//!
//! Implemented by storage backends (e.g. `lustre-store-sqlite`). The engine
//! receives a handle to one implementation; it keeps no state of its own
//! between requests.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{forecast::ForecastProjection, sales::DailySalesFact};

/// A queryable source of daily sales facts.
pub trait SalesSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All facts for an organization, optionally restricted to one location,
  /// ordered by date ascending.
  fn daily_sales<'a>(
    &'a self,
    organization_id: &'a str,
    location_id: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<DailySalesFact>, Self::Error>> + Send + 'a;
}

/// A keyed store of forecast projections with expiry.
///
/// There is no locking: two concurrent compute cycles for the same key may
/// both write. Implementations should make a later write of the same
/// (scenario, period) replace the earlier one.
pub trait ForecastCache: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Unexpired rows (`expires_at > now`) for the organization and location,
  /// most recently generated first, at most `limit`.
  fn valid_forecasts<'a>(
    &'a self,
    organization_id: &'a str,
    location_id: Option<&'a str>,
    now: DateTime<Utc>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ForecastProjection>, Self::Error>> + Send + 'a;

  /// Delete every expired row for the organization. Returns the number
  /// removed.
  fn purge_expired<'a>(
    &'a self,
    organization_id: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Persist a full projection set.
  fn store_forecasts<'a>(
    &'a self,
    rows: &'a [ForecastProjection],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
