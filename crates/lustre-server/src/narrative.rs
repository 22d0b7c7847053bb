//! An OpenAI-compatible chat-completions client used as the narrative
//! service.
//!
//! Any server exposing `POST {endpoint}/v1/chat/completions` works (hosted
//! APIs, local model runners). Without a configured endpoint the server uses
//! [`Narrator::Disabled`] and insights are always rule-based.

use std::time::Duration;

use anyhow::Context as _;
use lustre_core::insight::{InsightError, NarrativeService};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

fn default_model() -> String { "gpt-4o-mini".to_owned() }

fn default_timeout_secs() -> u64 { 10 }

/// The `[narrative]` config table.
#[derive(Debug, Clone, Deserialize)]
pub struct NarrativeConfig {
  /// Base URL, without the `/v1/chat/completions` suffix.
  pub endpoint:     String,
  /// Sent as a bearer token when present.
  #[serde(default)]
  pub api_key:      Option<String>,
  #[serde(default = "default_model")]
  pub model:        String,
  /// HTTP request timeout, independent of the engine's own insight timeout.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ChatClient {
  client: Client,
  config: NarrativeConfig,
}

impl ChatClient {
  pub fn new(config: NarrativeConfig) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!(
      "{}/v1/chat/completions",
      self.config.endpoint.trim_end_matches('/')
    )
  }

  fn request_body(&self, system: &str, user: &str) -> Value {
    json!({
      "model": self.config.model,
      "messages": [
        { "role": "system", "content": system },
        { "role": "user", "content": user },
      ],
      "temperature": 0.3,
    })
  }
}

impl NarrativeService for ChatClient {
  async fn complete(&self, system: &str, user: &str) -> Result<String, InsightError> {
    let mut req = self
      .client
      .post(self.url())
      .json(&self.request_body(system, user));
    if let Some(key) = &self.config.api_key {
      req = req.bearer_auth(key);
    }

    let resp = req
      .send()
      .await
      .map_err(|e| InsightError::Unavailable(e.to_string()))?;
    if !resp.status().is_success() {
      return Err(InsightError::Unavailable(format!(
        "POST {} → {}",
        self.url(),
        resp.status()
      )));
    }

    let body: Value = resp
      .json()
      .await
      .map_err(|e| InsightError::Malformed(e.to_string()))?;
    message_content(&body)
      .map(str::to_owned)
      .ok_or_else(|| InsightError::Malformed("no message content in reply".to_owned()))
  }
}

/// The assistant text of the first choice.
pub fn message_content(body: &Value) -> Option<&str> {
  body.pointer("/choices/0/message/content")?.as_str()
}

// ─── Narrator ────────────────────────────────────────────────────────────────

/// The narrative service the server actually runs with.
pub enum Narrator {
  Chat(ChatClient),
  Disabled,
}

impl Narrator {
  pub fn from_config(config: Option<&NarrativeConfig>) -> anyhow::Result<Self> {
    match config {
      Some(cfg) if !cfg.endpoint.trim().is_empty() => {
        Ok(Self::Chat(ChatClient::new(cfg.clone())?))
      }
      _ => Ok(Self::Disabled),
    }
  }

  pub fn is_enabled(&self) -> bool { matches!(self, Self::Chat(_)) }
}

impl NarrativeService for Narrator {
  async fn complete(&self, system: &str, user: &str) -> Result<String, InsightError> {
    match self {
      Self::Chat(client) => client.complete(system, user).await,
      Self::Disabled => Err(InsightError::Disabled),
    }
  }
}
