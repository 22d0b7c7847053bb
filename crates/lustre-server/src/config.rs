//! Layered server configuration: an optional TOML file, then `LUSTRE_*`
//! environment variables (`__` separates nested keys, e.g.
//! `LUSTRE_FORECAST__CACHE_TTL_HOURS=12`).

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use lustre_core::engine::{ForecastSettings, MAX_CACHE_TTL_HOURS};
use serde::Deserialize;

use crate::narrative::NarrativeConfig;

/// Runtime server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub forecast:   ForecastSettings,
  /// Absent means insights are always rule-based.
  pub narrative:  Option<NarrativeConfig>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_owned(),
      port:       8080,
      store_path: PathBuf::from("lustre.db"),
      forecast:   ForecastSettings::default(),
      narrative:  None,
    }
  }
}

impl ServerConfig {
  /// Read `path` if it exists, then overlay the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = ::config::Config::builder()
      .add_source(::config::File::from(path).required(false))
      .add_source(
        ::config::Environment::with_prefix("LUSTRE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  fn validate(&self) -> anyhow::Result<()> {
    let ttl = self.forecast.cache_ttl_hours;
    anyhow::ensure!(
      (1..=MAX_CACHE_TTL_HOURS).contains(&ttl),
      "forecast.cache_ttl_hours must be between 1 and {MAX_CACHE_TTL_HOURS}, got {ttl}"
    );
    anyhow::ensure!(
      self.forecast.horizon_quarters >= 1,
      "forecast.horizon_quarters must be at least 1"
    );
    Ok(())
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
