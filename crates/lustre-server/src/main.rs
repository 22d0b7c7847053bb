//! lustre server binary.
//!
//! Reads `lustre.toml` (or the path given with `--config`), opens the SQLite
//! store, and either serves the forecast API over HTTP or imports daily sales
//! from a JSON file.
//!
//! ```text
//! lustre serve
//! lustre import --file sales.json
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lustre_core::engine::ForecastEngine;
use lustre_server::{Narrator, ServerConfig, expand_tilde, import};
use lustre_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Lustre salon growth forecasting server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "lustre.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the forecast API (the default).
  Serve,
  /// Load a JSON array of daily sales facts into the store.
  Import {
    #[arg(short, long)]
    file: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(server_cfg, store).await,
    Command::Import { file } => {
      let written = import::import_file(&store, &file).await?;
      tracing::info!(written, file = %file.display(), "imported daily sales");
      Ok(())
    }
  }
}

async fn serve(server_cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let narrator = Narrator::from_config(server_cfg.narrative.as_ref())?;
  if !narrator.is_enabled() {
    tracing::info!("no narrative endpoint configured; insights will be rule-based");
  }

  let engine = ForecastEngine::new(
    Arc::new(store),
    Arc::new(narrator),
    server_cfg.forecast.clone(),
  );
  let app = lustre_api::api_router(Arc::new(engine));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
