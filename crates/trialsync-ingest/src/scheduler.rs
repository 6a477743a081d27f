//! Fixed-interval driver for the [`Pipeline`].
//!
//! No jitter, no overlap guard, no checkpoint: each tick runs the whole
//! pipeline to completion and then sleeps. Progress lives in the database.

use std::time::{Duration, Instant};

use chrono::Utc;
use trialsync_core::store::StudyStore;
use trialsync_sources::Fetch;

use crate::pipeline::{Pipeline, RunReport};

pub struct Scheduler<S, F> {
  pipeline: Pipeline<S, F>,
  interval: Duration,
}

impl<S, F> Scheduler<S, F>
where
  S: StudyStore,
  F: Fetch,
{
  pub fn new(pipeline: Pipeline<S, F>, interval: Duration) -> Self { Self { pipeline, interval } }

  pub fn pipeline(&self) -> &Pipeline<S, F> { &self.pipeline }

  /// Run the pipeline once and log how it went.
  pub async fn tick(&self) -> RunReport<S::Error> {
    let started = Instant::now();
    let report = self.pipeline.run_all().await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if report.is_ok() {
      tracing::info!(elapsed_ms, "pipeline run complete");
    } else {
      tracing::warn!(elapsed_ms, "pipeline run completed with errors");
    }
    report
  }

  /// Tick, sleep, repeat. Never returns.
  pub async fn run(&self) {
    loop {
      self.tick().await;

      let next_run = chrono::Duration::from_std(self.interval)
        .ok()
        .and_then(|d| Utc::now().checked_add_signed(d));
      tracing::info!(
        interval_secs = self.interval.as_secs(),
        next_run = ?next_run,
        "sleeping until next run"
      );
      tokio::time::sleep(self.interval).await;
    }
  }
}
