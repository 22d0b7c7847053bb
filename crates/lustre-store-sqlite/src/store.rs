//! [`SqliteStore`]: the SQLite implementation of [`SalesSource`] and [`ForecastCache`].

use std::path::Path;

use chrono::{DateTime, Utc};
use lustre_core::{
  forecast::ForecastProjection,
  sales::DailySalesFact,
  store::{ForecastCache, SalesSource},
};

use crate::{
  Error, Result,
  encode::{RawDailySale, RawProjection, encode_date, encode_dt, location_key},
  schema::SCHEMA,
};

const PROJECTION_COLUMNS: &str = "
  forecast_id, organization_id, location_id, forecast_type, period_label,
  period_start, period_end, scenario, projected_revenue,
  projected_service_revenue, projected_product_revenue, qoq_growth_rate,
  yoy_growth_rate, confidence_lower, confidence_upper, momentum,
  seasonality_index, insights, generated_at, expires_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lustre store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert daily facts in one transaction. A fact for an existing
  /// (organization, location, date) replaces it. Returns the number written.
  pub async fn insert_daily_sales(&self, facts: &[DailySalesFact]) -> Result<usize> {
    let rows: Vec<_> = facts
      .iter()
      .map(|f| {
        (
          f.organization_id.clone(),
          f.location_id.clone(),
          location_key(f.location_id.as_deref()),
          encode_date(f.date),
          f.total_revenue,
          f.service_revenue,
          f.product_revenue,
          f.transaction_count,
        )
      })
      .collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO daily_sales (
               organization_id, location_id, location_key, date,
               total_revenue, service_revenue, product_revenue, transaction_count
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          )?;
          for (org, loc, key, date, total, service, product, count) in &rows {
            stmt.execute(rusqlite::params![
              org, loc, key, date, total, service, product, count
            ])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;
    Ok(written)
  }
}

// ─── SalesSource impl ────────────────────────────────────────────────────────

impl SalesSource for SqliteStore {
  type Error = Error;

  async fn daily_sales(
    &self,
    organization_id: &str,
    location_id: Option<&str>,
  ) -> Result<Vec<DailySalesFact>> {
    let org = organization_id.to_owned();
    let loc = location_id.map(str::to_owned);

    let raws: Vec<RawDailySale> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT organization_id, location_id, date, total_revenue,
                  service_revenue, product_revenue, transaction_count
           FROM daily_sales
           WHERE organization_id = ?1
             AND (?2 IS NULL OR location_id = ?2)
           ORDER BY date ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![org, loc], |r| {
            Ok(RawDailySale {
              organization_id:   r.get(0)?,
              location_id:       r.get(1)?,
              date:              r.get(2)?,
              total_revenue:     r.get(3)?,
              service_revenue:   r.get(4)?,
              product_revenue:   r.get(5)?,
              transaction_count: r.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut facts = Vec::with_capacity(raws.len());
    for raw in raws {
      match raw.into_fact() {
        Ok(fact) => facts.push(fact),
        Err(e) => {
          tracing::warn!(organization_id, error = %e, "skipping unreadable daily sales row");
        }
      }
    }
    Ok(facts)
  }
}

// ─── ForecastCache impl ──────────────────────────────────────────────────────

impl ForecastCache for SqliteStore {
  type Error = Error;

  async fn valid_forecasts(
    &self,
    organization_id: &str,
    location_id: Option<&str>,
    now: DateTime<Utc>,
    limit: usize,
  ) -> Result<Vec<ForecastProjection>> {
    let org = organization_id.to_owned();
    let key = location_key(location_id);
    let now_str = encode_dt(now);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawProjection> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PROJECTION_COLUMNS}
           FROM forecast_projections
           WHERE organization_id = ?1
             AND location_key = ?2
             AND expires_at > ?3
           ORDER BY generated_at DESC
           LIMIT ?4"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![org, key, now_str, limit], |r| {
            Ok(RawProjection {
              forecast_id:               r.get(0)?,
              organization_id:           r.get(1)?,
              location_id:               r.get(2)?,
              forecast_type:             r.get(3)?,
              period_label:              r.get(4)?,
              period_start:              r.get(5)?,
              period_end:                r.get(6)?,
              scenario:                  r.get(7)?,
              projected_revenue:         r.get(8)?,
              projected_service_revenue: r.get(9)?,
              projected_product_revenue: r.get(10)?,
              qoq_growth_rate:           r.get(11)?,
              yoy_growth_rate:           r.get(12)?,
              confidence_lower:          r.get(13)?,
              confidence_upper:          r.get(14)?,
              momentum:                  r.get(15)?,
              seasonality_index:         r.get(16)?,
              insights:                  r.get(17)?,
              generated_at:              r.get(18)?,
              expires_at:                r.get(19)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProjection::into_projection).collect()
  }

  async fn purge_expired(
    &self,
    organization_id: &str,
    now: DateTime<Utc>,
  ) -> Result<usize> {
    let org = organization_id.to_owned();
    let now_str = encode_dt(now);

    let purged = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM forecast_projections
           WHERE organization_id = ?1 AND expires_at <= ?2",
          rusqlite::params![org, now_str],
        )?;
        Ok(n)
      })
      .await?;
    Ok(purged)
  }

  async fn store_forecasts(&self, rows: &[ForecastProjection]) -> Result<()> {
    let raws = rows
      .iter()
      .map(|p| {
        let key = location_key(p.location_id.as_deref());
        RawProjection::encode(p).map(|raw| (key, raw))
      })
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let sql = format!(
            "INSERT OR REPLACE INTO forecast_projections ({PROJECTION_COLUMNS}, location_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                     ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)"
          );
          let mut stmt = tx.prepare(&sql)?;
          for (key, p) in &raws {
            stmt.execute(rusqlite::params![
              p.forecast_id,
              p.organization_id,
              p.location_id,
              p.forecast_type,
              p.period_label,
              p.period_start,
              p.period_end,
              p.scenario,
              p.projected_revenue,
              p.projected_service_revenue,
              p.projected_product_revenue,
              p.qoq_growth_rate,
              p.yoy_growth_rate,
              p.confidence_lower,
              p.confidence_upper,
              p.momentum,
              p.seasonality_index,
              p.insights,
              p.generated_at,
              p.expires_at,
              key,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
