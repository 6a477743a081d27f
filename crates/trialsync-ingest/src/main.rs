//! `trialsync`: clinical-trial registry ingestion.
//!
//! # Usage
//!
//! ```text
//! trialsync us          # one US registry pass
//! trialsync eu          # one EU registry pass
//! trialsync reconcile   # redefine combined_view
//! trialsync run         # both sources + view, every 12 hours, forever
//! trialsync serve       # JSON API over the combined view
//! ```
//!
//! Settings come from `trialsync.toml` (or `--config`) and `TRIALSYNC_*`
//! environment variables.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use trialsync_core::store::StudyStore;
use trialsync_ingest::{Pipeline, Scheduler, Settings};
use trialsync_sources::{HttpFetcher, eu::EuSource, us::UsSource};
use trialsync_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Clinical-trial registry ingestion")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "trialsync.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run a single US registry ingestion pass.
  Us,
  /// Run a single EU registry ingestion pass.
  Eu,
  /// Redefine the combined cross-source view.
  Reconcile,
  /// Ingest both sources and reconcile on a fixed interval, indefinitely.
  Run,
  /// Serve the read-only JSON API.
  Serve,
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

  let settings = Settings::load(&cli.config)
    .with_context(|| format!("failed to load settings from {:?}", cli.config))?;

  let store_path = settings.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  match cli.command {
    Command::Us => {
      pipeline(store, &settings)?
        .run_us()
        .await
        .context("us ingestion failed")?;
    }
    Command::Eu => {
      pipeline(store, &settings)?
        .run_eu()
        .await
        .context("eu ingestion failed")?;
    }
    Command::Reconcile => {
      pipeline(store, &settings)?
        .reconcile()
        .await
        .context("view reconciliation failed")?;
    }
    Command::Run => {
      let scheduler = Scheduler::new(pipeline(store, &settings)?, settings.schedule.interval());
      tracing::info!(
        interval_secs = settings.schedule.interval_secs,
        "starting scheduler"
      );
      tokio::select! {
        () = scheduler.run() => {}
        signal = tokio::signal::ctrl_c() => {
          signal.context("failed to listen for ctrl-c")?;
          tracing::info!("shutting down");
        }
      }
    }
    Command::Serve => serve(store, &settings).await?,
  }

  Ok(())
}

/// Wire both adapters to `store` over one shared HTTP client.
fn pipeline(
  store: Arc<SqliteStore>,
  settings: &Settings,
) -> anyhow::Result<Pipeline<SqliteStore, HttpFetcher>> {
  let fetcher = HttpFetcher::new().context("failed to build HTTP client")?;
  Ok(Pipeline::new(
    store,
    UsSource::new(fetcher.clone(), settings.us.clone()),
    EuSource::new(fetcher, settings.eu.clone()),
  ))
}

async fn serve(store: Arc<SqliteStore>, settings: &Settings) -> anyhow::Result<()> {
  // The API reads through the view, so make sure it exists.
  store
    .reconcile_view()
    .await
    .context("failed to define combined view")?;

  let app = trialsync_api::api_router(store).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", settings.api.host, settings.api.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
