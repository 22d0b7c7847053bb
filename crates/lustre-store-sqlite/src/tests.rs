//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use lustre_core::{
  forecast::{ForecastProjection, ForecastType},
  momentum::Momentum,
  projection::Scenario,
  sales::DailySalesFact,
  store::{ForecastCache, SalesSource},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap() }

// ─── Daily sales ─────────────────────────────────────────────────────────────

fn sale(org: &str, location: Option<&str>, d: NaiveDate, total: f64) -> DailySalesFact {
  DailySalesFact {
    organization_id:   org.into(),
    location_id:       location.map(str::to_owned),
    date:              d,
    total_revenue:     total,
    service_revenue:   total * 0.6,
    product_revenue:   total * 0.4,
    transaction_count: 12,
  }
}

#[tokio::test]
async fn daily_sales_are_ordered_by_date() {
  let s = store().await;
  s.insert_daily_sales(&[
    sale("org-1", None, date(2024, 3, 2), 300.0),
    sale("org-1", None, date(2024, 1, 5), 100.0),
    sale("org-1", None, date(2024, 2, 9), 200.0),
    sale("org-2", None, date(2024, 1, 1), 999.0),
  ])
  .await
  .unwrap();

  let facts = s.daily_sales("org-1", None).await.unwrap();
  let totals: Vec<f64> = facts.iter().map(|f| f.total_revenue).collect();
  assert_eq!(totals, [100.0, 200.0, 300.0]);
  assert_eq!(facts[0].service_revenue, 60.0);
  assert_eq!(facts[0].transaction_count, 12);
}

#[tokio::test]
async fn daily_sales_filter_by_location() {
  let s = store().await;
  s.insert_daily_sales(&[
    sale("org-1", Some("downtown"), date(2024, 1, 5), 100.0),
    sale("org-1", Some("uptown"), date(2024, 1, 5), 250.0),
  ])
  .await
  .unwrap();

  assert_eq!(s.daily_sales("org-1", None).await.unwrap().len(), 2);
  let downtown = s.daily_sales("org-1", Some("downtown")).await.unwrap();
  assert_eq!(downtown.len(), 1);
  assert_eq!(downtown[0].total_revenue, 100.0);
  assert!(s.daily_sales("org-1", Some("midtown")).await.unwrap().is_empty());
}

#[tokio::test]
async fn reinserting_a_day_replaces_it() {
  let s = store().await;
  s.insert_daily_sales(&[sale("org-1", None, date(2024, 1, 5), 100.0)])
    .await
    .unwrap();
  s.insert_daily_sales(&[sale("org-1", None, date(2024, 1, 5), 175.0)])
    .await
    .unwrap();

  let facts = s.daily_sales("org-1", None).await.unwrap();
  assert_eq!(facts.len(), 1);
  assert_eq!(facts[0].total_revenue, 175.0);
}

#[tokio::test]
async fn malformed_revenue_coerces_to_zero() {
  let s = store().await;
  s.conn
    .call(|conn| {
      conn.execute(
        "INSERT INTO daily_sales (
           organization_id, date, total_revenue, service_revenue,
           product_revenue, transaction_count
         ) VALUES ('org-1', '2024-01-05', 'n/a', '12.5', NULL, '3')",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let facts = s.daily_sales("org-1", None).await.unwrap();
  assert_eq!(facts.len(), 1);
  assert_eq!(facts[0].total_revenue, 0.0);
  assert_eq!(facts[0].service_revenue, 12.5);
  assert_eq!(facts[0].product_revenue, 0.0);
  assert_eq!(facts[0].transaction_count, 3);
}

#[tokio::test]
async fn unreadable_dates_are_skipped() {
  let s = store().await;
  s.insert_daily_sales(&[sale("org-1", None, date(2024, 1, 5), 100.0)])
    .await
    .unwrap();
  s.conn
    .call(|conn| {
      conn.execute(
        "INSERT INTO daily_sales (organization_id, date, total_revenue)
         VALUES ('org-1', 'last tuesday', 50)",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let facts = s.daily_sales("org-1", None).await.unwrap();
  assert_eq!(facts.len(), 1);
  assert_eq!(facts[0].date, date(2024, 1, 5));
}

// ─── Forecast cache ──────────────────────────────────────────────────────────

fn projection(
  org: &str,
  location: Option<&str>,
  scenario: Scenario,
  quarter: u32,
  generated_at: DateTime<Utc>,
) -> ForecastProjection {
  let start = date(2025, 3 * quarter - 2, 1);
  ForecastProjection {
    forecast_id:               Uuid::new_v4(),
    organization_id:           org.into(),
    location_id:               location.map(str::to_owned),
    forecast_type:             ForecastType::Quarterly,
    period_label:              format!("Q{quarter} 2025"),
    period_start:              start,
    period_end:                start + Duration::days(89),
    scenario,
    projected_revenue:         10_000.0 * scenario.multiplier(),
    projected_service_revenue: 7_000.0 * scenario.multiplier(),
    projected_product_revenue: 3_000.0 * scenario.multiplier(),
    qoq_growth_rate:           4.5,
    yoy_growth_rate:           (quarter == 1).then_some(12.25),
    confidence_lower:          8_500.0,
    confidence_upper:          11_500.0,
    momentum:                  Momentum::Accelerating,
    seasonality_index:         1.05,
    insights:                  (scenario == Scenario::Baseline)
      .then(|| vec!["Extend Saturday hours".to_owned()]),
    generated_at,
    expires_at:                generated_at + Duration::hours(24),
  }
}

fn full_set(org: &str, location: Option<&str>, at: DateTime<Utc>) -> Vec<ForecastProjection> {
  Scenario::ALL
    .into_iter()
    .flat_map(|s| (1..=4).map(move |q| (s, q)))
    .map(|(s, q)| projection(org, location, s, q, at))
    .collect()
}

#[tokio::test]
async fn stored_forecasts_round_trip() {
  let s = store().await;
  let rows = full_set("org-1", None, now());
  s.store_forecasts(&rows).await.unwrap();

  let mut cached = s.valid_forecasts("org-1", None, now(), 20).await.unwrap();
  assert_eq!(cached.len(), 12);

  cached.sort_by_key(|r| r.forecast_id);
  let mut expected = rows.clone();
  expected.sort_by_key(|r| r.forecast_id);
  assert_eq!(cached, expected);
}

#[tokio::test]
async fn expired_forecasts_are_not_served() {
  let s = store().await;
  s.store_forecasts(&full_set("org-1", None, now())).await.unwrap();

  let at_expiry = now() + Duration::hours(24);
  assert!(s.valid_forecasts("org-1", None, at_expiry, 20).await.unwrap().is_empty());
  let just_before = at_expiry - Duration::seconds(1);
  assert_eq!(s.valid_forecasts("org-1", None, just_before, 20).await.unwrap().len(), 12);
}

#[tokio::test]
async fn valid_forecasts_respects_limit_and_recency() {
  let s = store().await;
  let older = full_set("org-1", None, now());
  let mut newer = full_set("org-1", None, now() + Duration::hours(1));
  // Distinct period labels so the newer set does not replace the older one.
  for row in &mut newer {
    row.period_label = format!("{} (rev)", row.period_label);
  }
  s.store_forecasts(&older).await.unwrap();
  s.store_forecasts(&newer).await.unwrap();

  let cached = s
    .valid_forecasts("org-1", None, now() + Duration::hours(2), 5)
    .await
    .unwrap();
  assert_eq!(cached.len(), 5);
  assert!(cached.iter().all(|r| r.generated_at == now() + Duration::hours(1)));
}

#[tokio::test]
async fn forecasts_are_keyed_by_location() {
  let s = store().await;
  s.store_forecasts(&full_set("org-1", Some("downtown"), now()))
    .await
    .unwrap();

  assert!(s.valid_forecasts("org-1", None, now(), 20).await.unwrap().is_empty());
  let located = s
    .valid_forecasts("org-1", Some("downtown"), now(), 20)
    .await
    .unwrap();
  assert_eq!(located.len(), 12);
  assert!(located.iter().all(|r| r.location_id.as_deref() == Some("downtown")));
}

#[tokio::test]
async fn rewriting_a_period_replaces_the_row() {
  let s = store().await;
  s.store_forecasts(&full_set("org-1", None, now())).await.unwrap();

  let later = now() + Duration::minutes(5);
  let mut replacement = projection("org-1", None, Scenario::Baseline, 1, later);
  replacement.projected_revenue = 42.0;
  s.store_forecasts(std::slice::from_ref(&replacement)).await.unwrap();

  let cached = s.valid_forecasts("org-1", None, later, 20).await.unwrap();
  assert_eq!(cached.len(), 12);
  let baseline_q1: Vec<_> = cached
    .iter()
    .filter(|r| r.scenario == Scenario::Baseline && r.period_label == "Q1 2025")
    .collect();
  assert_eq!(baseline_q1.len(), 1);
  assert_eq!(baseline_q1[0].projected_revenue, 42.0);
  assert_eq!(baseline_q1[0].forecast_id, replacement.forecast_id);
}

#[tokio::test]
async fn purge_removes_only_expired_rows_for_the_org() {
  let s = store().await;
  let stale = now() - Duration::hours(30);
  s.store_forecasts(&full_set("org-1", None, stale)).await.unwrap();
  s.store_forecasts(&full_set("org-2", None, stale)).await.unwrap();

  let purged = s.purge_expired("org-1", now()).await.unwrap();
  assert_eq!(purged, 12);
  assert_eq!(s.purge_expired("org-1", now()).await.unwrap(), 0);
  assert_eq!(s.purge_expired("org-2", now()).await.unwrap(), 12);
}

#[tokio::test]
async fn insights_only_persist_on_baseline() {
  let s = store().await;
  s.store_forecasts(&full_set("org-1", None, now())).await.unwrap();

  for row in s.valid_forecasts("org-1", None, now(), 20).await.unwrap() {
    match row.scenario {
      Scenario::Baseline => {
        assert_eq!(row.insights.as_deref(), Some(&["Extend Saturday hours".to_owned()][..]))
      }
      _ => assert!(row.insights.is_none()),
    }
  }
}
