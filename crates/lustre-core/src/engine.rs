//! Cache-or-compute orchestration of a growth forecast.
//!
//! 1. Serve unexpired cached projections if any exist.
//! 2. Otherwise fetch daily sales, analyse, and project.
//! 3. Ask the narrative service for insights, falling back to rules.
//! 4. Garbage-collect expired rows, write the new set, respond.
//!
//! Persistence is best-effort: a failed cache read is treated as a miss and a
//! failed write is logged, but neither fails the request.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  analysis::Analysis,
  forecast::{ForecastProjection, ForecastType},
  insight::{self, InsightError, InsightSet, NarrativeService},
  period::QuarterKey,
  projection::{self, ProjectedQuarter, RevenueSplit, Scenario},
  report::ForecastResponse,
  store::{ForecastCache, SalesSource},
};

// ─── Settings ────────────────────────────────────────────────────────────────

/// Tunables for the engine, deserialisable from the `[forecast]` config table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
  /// Future quarters projected per scenario.
  pub horizon_quarters:     u32,
  /// How long a computed projection set is served from cache.
  pub cache_ttl_hours:      i64,
  /// Upper bound on rows read by the cache gate, raised to one full
  /// projection set when smaller.
  pub cache_limit:          usize,
  pub revenue_split:        RevenueSplit,
  /// Upper bound on the narrative service call.
  pub insight_timeout_secs: u64,
}

impl Default for ForecastSettings {
  fn default() -> Self {
    Self {
      horizon_quarters:     4,
      cache_ttl_hours:      DEFAULT_CACHE_TTL_HOURS,
      cache_limit:          20,
      revenue_split:        RevenueSplit::Fixed,
      insight_timeout_secs: 10,
    }
  }
}

/// Longest accepted cache lifetime (366 days).
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 366;

const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

impl ForecastSettings {
  /// The configured cache lifetime, or the 24 hour default when it is outside
  /// `1..=MAX_CACHE_TTL_HOURS`.
  pub fn cache_ttl(&self) -> chrono::Duration {
    let hours = if (1..=MAX_CACHE_TTL_HOURS).contains(&self.cache_ttl_hours) {
      self.cache_ttl_hours
    } else {
      DEFAULT_CACHE_TTL_HOURS
    };
    chrono::Duration::try_hours(hours).unwrap_or(chrono::Duration::zero())
  }

  /// Rows the cache gate reads: never fewer than one full projection set.
  pub fn cache_read_limit(&self) -> usize {
    let set_size = Scenario::ALL.len().saturating_mul(self.horizon_quarters as usize);
    self.cache_limit.max(set_size)
  }

  pub fn insight_timeout(&self) -> Duration {
    Duration::from_secs(self.insight_timeout_secs)
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Invocation parameters, as accepted on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
  pub organization_id: Option<String>,
  pub location_id:     Option<String>,
}

impl ForecastRequest {
  pub fn organization(organization_id: impl Into<String>) -> Self {
    Self { organization_id: Some(organization_id.into()), location_id: None }
  }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
  s.map(str::trim).filter(|s| !s.is_empty())
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Computes growth forecasts against an injected store and narrative service.
pub struct ForecastEngine<S, N> {
  store:    Arc<S>,
  narrator: Arc<N>,
  settings: ForecastSettings,
}

impl<S, N> ForecastEngine<S, N>
where
  S: SalesSource + ForecastCache,
  N: NarrativeService,
{
  pub fn new(store: Arc<S>, narrator: Arc<N>, settings: ForecastSettings) -> Self {
    Self { store, narrator, settings }
  }

  pub fn settings(&self) -> &ForecastSettings { &self.settings }

  /// Forecast as of the current wall-clock time.
  pub async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
    self.forecast_at(request, Utc::now()).await
  }

  /// Forecast as of `now`, which decides cache validity, the current quarter,
  /// and the expiry of anything written.
  pub async fn forecast_at(
    &self,
    request: &ForecastRequest,
    now: DateTime<Utc>,
  ) -> Result<ForecastResponse> {
    let organization_id = non_blank(request.organization_id.as_deref())
      .ok_or(Error::MissingOrganization)?;
    let location_id = non_blank(request.location_id.as_deref());

    match self
      .store
      .valid_forecasts(organization_id, location_id, now, self.settings.cache_read_limit())
      .await
    {
      Ok(rows) if !rows.is_empty() => {
        tracing::debug!(organization_id, rows = rows.len(), "serving cached forecast");
        return Ok(ForecastResponse::from_cache(rows));
      }
      Ok(_) => {}
      Err(e) => {
        tracing::warn!(organization_id, error = %e, "forecast cache read failed; recomputing");
      }
    }

    let facts = self
      .store
      .daily_sales(organization_id, location_id)
      .await
      .map_err(|e| Error::Fetch(Box::new(e)))?;

    let Some(analysis) = Analysis::from_facts(&facts) else {
      tracing::info!(organization_id, "no daily sales on record");
      return Ok(ForecastResponse::insufficient_data());
    };

    let projected = projection::project(
      &analysis,
      QuarterKey::containing(now),
      self.settings.horizon_quarters,
      self.settings.revenue_split,
    );
    let insights = self.narrate(&analysis).await;

    let rows = self.to_rows(
      organization_id,
      location_id,
      &analysis,
      &projected,
      insights.insights(),
      now,
    );
    self.persist(organization_id, &rows, now).await;

    tracing::info!(
      organization_id,
      quarters = analysis.quarters.len(),
      momentum = %analysis.momentum,
      fallback_insights = insights.is_fallback(),
      "computed growth forecast"
    );

    Ok(ForecastResponse::computed(&analysis, rows, insights.into_insights()))
  }

  /// Narrative insights, or the rule-based set on any failure.
  async fn narrate(&self, analysis: &Analysis) -> InsightSet {
    if analysis.quarters.len() < 2 {
      return InsightSet::fallback(analysis);
    }

    let prompt = insight::build_prompt(analysis);
    let call = self.narrator.complete(insight::SYSTEM_PROMPT, &prompt);
    match tokio::time::timeout(self.settings.insight_timeout(), call).await {
      Ok(Ok(reply)) => match insight::interpret(&reply) {
        Some(parsed) => InsightSet::Parsed(parsed),
        None => {
          tracing::warn!("narrative reply contained no usable insights");
          InsightSet::fallback(analysis)
        }
      },
      Ok(Err(InsightError::Disabled)) => InsightSet::fallback(analysis),
      Ok(Err(e)) => {
        tracing::warn!(error = %e, "narrative insight generation failed");
        InsightSet::fallback(analysis)
      }
      Err(_) => {
        tracing::warn!(
          timeout_secs = self.settings.insight_timeout_secs,
          "narrative insight generation timed out"
        );
        InsightSet::fallback(analysis)
      }
    }
  }

  fn to_rows(
    &self,
    organization_id: &str,
    location_id: Option<&str>,
    analysis: &Analysis,
    projected: &[ProjectedQuarter],
    insights: &[String],
    now: DateTime<Utc>,
  ) -> Vec<ForecastProjection> {
    let expires_at = now
      .checked_add_signed(self.settings.cache_ttl())
      .unwrap_or(DateTime::<Utc>::MAX_UTC);
    projected
      .iter()
      .map(|p| ForecastProjection {
        forecast_id:               Uuid::new_v4(),
        organization_id:           organization_id.to_owned(),
        location_id:               location_id.map(str::to_owned),
        forecast_type:             ForecastType::Quarterly,
        period_label:              p.key.label(),
        period_start:              p.key.start_date(),
        period_end:                p.key.end_date(),
        scenario:                  p.scenario,
        projected_revenue:         p.total_revenue,
        projected_service_revenue: p.service_revenue,
        projected_product_revenue: p.product_revenue,
        qoq_growth_rate:           p.qoq_growth,
        yoy_growth_rate:           p.yoy_growth,
        confidence_lower:          p.confidence_lower,
        confidence_upper:          p.confidence_upper,
        momentum:                  analysis.momentum,
        seasonality_index:         p.seasonality_index,
        insights:                  (p.scenario == Scenario::Baseline)
          .then(|| insights.to_vec()),
        generated_at:              now,
        expires_at,
      })
      .collect()
  }

  /// Purge then insert. Not transactional across the two steps.
  async fn persist(
    &self,
    organization_id: &str,
    rows: &[ForecastProjection],
    now: DateTime<Utc>,
  ) {
    match self.store.purge_expired(organization_id, now).await {
      Ok(0) => {}
      Ok(purged) => tracing::debug!(organization_id, purged, "purged expired forecasts"),
      Err(e) => tracing::warn!(organization_id, error = %e, "failed to purge expired forecasts"),
    }

    if rows.is_empty() {
      return;
    }
    if let Err(e) = self.store.store_forecasts(rows).await {
      tracing::warn!(organization_id, error = %e, "failed to cache computed forecast");
    }
  }
}
