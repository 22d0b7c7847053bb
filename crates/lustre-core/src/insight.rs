//! Narrative insights attached to the baseline forecast.
//!
//! An external text-generation service may be asked for a handful of
//! actionable observations. Whatever it returns is interpreted leniently; when
//! it is unavailable, slow, or unintelligible, a deterministic rule-based set
//! is used instead. Nothing here ever fails the forecast.

use std::future::Future;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::{analysis::Analysis, momentum::Momentum, stats::growth_rate};

/// Upper bound on insights kept from a model response.
pub const MAX_INSIGHTS: usize = 4;

pub const SYSTEM_PROMPT: &str = "You are a business analyst for salon and spa \
owners. Given quarterly revenue history, growth rates, momentum, and seasonal \
indices, reply with 3-4 concise, actionable insights as a JSON array of \
strings. Reply with the JSON array only.";

pub const NO_DATA_INSIGHT: &str = "No sales data has been recorded yet. Once \
daily sales start flowing in, quarterly growth forecasts will appear here.";

pub const INSUFFICIENT_HISTORY_INSIGHT: &str = "Only one quarter of sales \
history is available. Trends and momentum become meaningful after at least \
two full quarters.";

// ─── Service boundary ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum InsightError {
  /// No service is configured; not worth a warning.
  #[error("narrative service disabled")]
  Disabled,

  #[error("narrative service unavailable: {0}")]
  Unavailable(String),

  #[error("malformed narrative response: {0}")]
  Malformed(String),
}

/// An external text-generation service.
pub trait NarrativeService: Send + Sync {
  /// Send one system + user message pair and return the raw reply text.
  fn complete<'a>(
    &'a self,
    system: &'a str,
    user: &'a str,
  ) -> impl Future<Output = Result<String, InsightError>> + Send + 'a;
}

// ─── Result type ─────────────────────────────────────────────────────────────

/// Where a set of insights came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "insights", rename_all = "snake_case")]
pub enum InsightSet {
  /// Interpreted from a narrative service reply.
  Parsed(Vec<String>),
  /// Derived from the analysis by fixed rules.
  Fallback(Vec<String>),
}

impl InsightSet {
  pub fn insights(&self) -> &[String] {
    match self {
      Self::Parsed(v) | Self::Fallback(v) => v,
    }
  }

  pub fn into_insights(self) -> Vec<String> {
    match self {
      Self::Parsed(v) | Self::Fallback(v) => v,
    }
  }

  pub fn is_fallback(&self) -> bool { matches!(self, Self::Fallback(_)) }

  pub fn fallback(analysis: &Analysis) -> Self { Self::Fallback(rule_based(analysis)) }
}

// ─── Prompt ──────────────────────────────────────────────────────────────────

/// The user message: a structured summary of the analysis.
pub fn build_prompt(analysis: &Analysis) -> String {
  let quarters: Vec<_> = analysis
    .quarters
    .iter()
    .map(|q| {
      json!({
        "period": q.key.label(),
        "totalRevenue": q.total_revenue,
        "serviceRevenue": q.service_revenue,
        "productRevenue": q.product_revenue,
        "transactions": q.transaction_count,
      })
    })
    .collect();

  let summary = json!({
    "quarters": quarters,
    "qoqGrowthRates": analysis.growth_rates,
    "yoyGrowth": analysis.yoy_growth,
    "momentum": analysis.momentum,
    "seasonalIndices": analysis.seasonal,
    "trendR2": analysis.regression.r_squared,
  });

  format!(
    "Quarterly revenue summary for a salon business:\n{summary}\n\n\
     Return 3-4 concise, actionable insights as a JSON array of strings."
  )
}

// ─── Interpretation ──────────────────────────────────────────────────────────

/// Interpret a reply: a JSON array of strings if one can be found, otherwise
/// one insight per non-empty line with bullet or number markers removed.
/// `None` when nothing usable remains.
pub fn interpret(reply: &str) -> Option<Vec<String>> {
  let candidates = parse_json_array(reply).unwrap_or_else(|| split_lines(reply));
  let insights: Vec<String> = candidates
    .into_iter()
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
    .take(MAX_INSIGHTS)
    .collect();
  (!insights.is_empty()).then_some(insights)
}

fn parse_json_array(reply: &str) -> Option<Vec<String>> {
  if let Ok(v) = serde_json::from_str::<Vec<String>>(reply.trim()) {
    return Some(v);
  }
  // Models like to wrap the array in a code fence or a sentence.
  let start = reply.find('[')?;
  let end = reply.rfind(']')?;
  if end <= start {
    return None;
  }
  serde_json::from_str(&reply[start..=end]).ok()
}

fn split_lines(reply: &str) -> Vec<String> {
  reply
    .lines()
    .map(str::trim)
    .filter(|line| !line.starts_with("```"))
    .map(strip_marker)
    .filter(|line| !line.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Remove a leading `-`, `*`, `•` bullet or `1.` / `1)` enumeration.
fn strip_marker(line: &str) -> &str {
  let line = line.trim_start_matches(['-', '*', '•']).trim_start();
  let digits = line.chars().take_while(char::is_ascii_digit).count();
  if digits > 0 {
    let rest = &line[digits..];
    if let Some(stripped) =
      rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))
    {
      return stripped.trim();
    }
  }
  line.trim()
}

// ─── Rule-based fallback ─────────────────────────────────────────────────────

/// Deterministic insights from the last two quarters, the momentum label, and
/// the strongest seasonal quarter.
pub fn rule_based(analysis: &Analysis) -> Vec<String> {
  let [.., previous, latest] = analysis.quarters.as_slice() else {
    return vec![INSUFFICIENT_HISTORY_INSIGHT.to_owned()];
  };

  let mut insights = Vec::with_capacity(3);

  let change = growth_rate(previous.total_revenue, latest.total_revenue);
  insights.push(if change > 0.0 {
    format!(
      "Revenue grew {change:.1}% from {} to {}. Protect that gain by \
       rebooking clients before they leave the chair.",
      previous.key, latest.key
    )
  } else if change < 0.0 {
    format!(
      "Revenue fell {:.1}% from {} to {}. Review appointment fill rates and \
       retail attach rates for that quarter.",
      change.abs(),
      previous.key,
      latest.key
    )
  } else {
    format!(
      "Revenue was flat between {} and {}. Small lifts in average ticket \
       size are the quickest lever.",
      previous.key, latest.key
    )
  });

  insights.push(
    match analysis.momentum {
      Momentum::Accelerating => {
        "Growth is accelerating. Make sure staffing and booking capacity can \
         keep pace with demand."
      }
      Momentum::Decelerating => {
        "Growth is slowing. Consider targeted promotions or win-back \
         campaigns for lapsed clients."
      }
      Momentum::Steady => {
        "Growth is steady. Focus on retention and service upgrades to lift \
         the baseline."
      }
    }
    .to_owned(),
  );

  let (quarter, index) = analysis.seasonal.strongest();
  if index > 1.0 {
    insights.push(format!(
      "Q{quarter} is historically your strongest quarter ({:.0}% above an \
       average quarter). Plan inventory and staffing ahead of it.",
      (index - 1.0) * 100.0
    ));
  }

  insights
}
