//! [`Pipeline`]: one full ingestion pass over both registries.
//!
//! Each source runs fetch → parse → ensure table → insert on its own.
//! Network and parse failures degrade to fewer rows and are only logged.
//! Store failures abort that source and come back as `Err` in the
//! [`RunReport`]. They never stop the other source or the view
//! reconciliation.

use std::sync::Arc;

use trialsync_core::store::{InsertOutcome, StudyStore};
use trialsync_sources::{
  Fetch,
  eu::{self, EuSource},
  us::{self, UsSource},
};

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Counters for one source's pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceReport {
  /// Raw records received from the source.
  pub fetched:    usize,
  pub inserted:   usize,
  /// Records whose key was already stored.
  pub duplicates: usize,
  /// Records dropped before insert (malformed, or no primary key).
  pub skipped:    usize,
}

impl SourceReport {
  fn record(&mut self, outcome: InsertOutcome) {
    match outcome {
      InsertOutcome::Inserted => self.inserted += 1,
      InsertOutcome::Duplicate => self.duplicates += 1,
    }
  }
}

/// Outcome of every stage of [`Pipeline::run_all`].
#[derive(Debug)]
pub struct RunReport<E> {
  pub us:   Result<SourceReport, E>,
  pub eu:   Result<SourceReport, E>,
  pub view: Result<(), E>,
}

impl<E> RunReport<E> {
  pub fn is_ok(&self) -> bool { self.us.is_ok() && self.eu.is_ok() && self.view.is_ok() }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

pub struct Pipeline<S, F> {
  store: Arc<S>,
  us:    UsSource<F>,
  eu:    EuSource<F>,
}

impl<S, F> Pipeline<S, F>
where
  S: StudyStore,
  F: Fetch,
{
  pub fn new(store: Arc<S>, us: UsSource<F>, eu: EuSource<F>) -> Self { Self { store, us, eu } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// One US pass: a single page fetch, no retry.
  pub async fn run_us(&self) -> Result<SourceReport, S::Error> {
    let docs = self.us.fetch().await;
    let mut report = SourceReport { fetched: docs.len(), ..Default::default() };

    self.store.ensure_us_table().await?;

    for (index, parsed) in us::parse_studies(&docs).into_iter().enumerate() {
      match parsed {
        Ok(study) => report.record(self.store.insert_us(&study).await?),
        Err(e) => {
          tracing::warn!(index, error = %e, "skipping malformed us study");
          report.skipped += 1;
        }
      }
    }

    tracing::info!(
      fetched = report.fetched,
      inserted = report.inserted,
      duplicates = report.duplicates,
      skipped = report.skipped,
      "us ingestion finished"
    );
    Ok(report)
  }

  /// One EU pass: page fetch with bounded retry, then label extraction.
  pub async fn run_eu(&self) -> Result<SourceReport, S::Error> {
    let html = self.eu.fetch_with_retry().await;
    let trials = eu::parse_trials(&html);
    let mut report = SourceReport { fetched: trials.len(), ..Default::default() };

    self.store.ensure_eu_table().await?;

    for (index, trial) in trials.iter().enumerate() {
      if trial.eudract_number.is_none() {
        tracing::warn!(index, title = ?trial.full_title, "skipping eu trial without EudraCT number");
        report.skipped += 1;
        continue;
      }
      report.record(self.store.insert_eu(trial).await?);
    }

    tracing::info!(
      fetched = report.fetched,
      inserted = report.inserted,
      duplicates = report.duplicates,
      skipped = report.skipped,
      "eu ingestion finished"
    );
    Ok(report)
  }

  /// Redefine `combined_view` over the current tables.
  pub async fn reconcile(&self) -> Result<(), S::Error> {
    self.store.reconcile_view().await?;
    tracing::info!("combined view reconciled");
    Ok(())
  }

  /// US, then EU, then the view. Every stage runs no matter how the
  /// previous one ended.
  pub async fn run_all(&self) -> RunReport<S::Error> {
    let us = self.run_us().await;
    if let Err(e) = &us {
      tracing::error!(error = %e, "us ingestion aborted");
    }

    let eu = self.run_eu().await;
    if let Err(e) = &eu {
      tracing::error!(error = %e, "eu ingestion aborted");
    }

    let view = self.reconcile().await;
    if let Err(e) = &view {
      tracing::error!(error = %e, "view reconciliation failed");
    }

    RunReport { us, eu, view }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    io,
    sync::atomic::{AtomicUsize, Ordering},
  };

  use serde_json::json;
  use trialsync_core::{
    study::{EuStudy, UsStudy},
    view::{CombinedRow, ConditionCount, SponsorCount, ViewQuery},
  };
  use trialsync_sources::{Error as SourceError, eu::EuConfig, us::UsConfig};
  use trialsync_store_sqlite::SqliteStore;

  use super::*;

  const US_URL: &str = "http://us.test/studies";
  const EU_URL: &str = "http://eu.test/search";

  /// Serves fixed bodies per host; `None` means every request fails.
  #[derive(Clone, Default)]
  struct Fixture {
    us:       Option<String>,
    eu:       Option<String>,
    eu_calls: Arc<AtomicUsize>,
  }

  impl Fetch for Fixture {
    async fn get(&self, url: &str) -> trialsync_sources::Result<String> {
      let body = if url.starts_with(US_URL) {
        &self.us
      } else {
        self.eu_calls.fetch_add(1, Ordering::SeqCst);
        &self.eu
      };
      body.clone().ok_or_else(|| SourceError::Status { url: url.to_owned(), status: 500 })
    }
  }

  fn us_doc(nct_id: &str, conditions: &[&str]) -> serde_json::Value {
    json!({
      "protocolSection": {
        "identificationModule": {
          "nctId": nct_id,
          "orgStudyIdInfo": { "id": format!("ORG-{nct_id}") },
          "briefTitle": "Brief",
          "officialTitle": format!("Official {nct_id}")
        },
        "sponsorCollaboratorsModule": { "leadSponsor": { "name": "Acme" } },
        "conditionsModule": { "conditions": conditions }
      },
      "derivedSection": {},
      "hasResults": false
    })
  }

  fn us_body() -> String {
    json!({
      "studies": [
        us_doc("NCT00000001", &["Asthma", "COPD"]),
        us_doc("NCT00000002", &["Flu"]),
        { "protocolSection": {}, "hasResults": true }
      ]
    })
    .to_string()
  }

  const EU_BODY: &str = r#"
    <table class="result">
      <tr><td><span class="label">EudraCT Number:</span> 2004-000001-11</td></tr>
      <tr><td><span class="label">Sponsor Name:</span> EuroPharma</td></tr>
      <tr><td><span class="label">Full Title:</span> Example Trial</td></tr>
      <tr><td><span class="label">Medical condition:</span> Hypertension</td></tr>
    </table>
    <table class="result">
      <tr><td><span class="label">EudraCT Number:</span> 2010-000002-22</td></tr>
    </table>
    <table class="result">
      <tr><td><span class="label">Full Title:</span> Keyless Trial</td></tr>
    </table>
  "#;

  fn pipeline<S: StudyStore>(store: Arc<S>, fixture: Fixture) -> Pipeline<S, Fixture> {
    Pipeline::new(
      store,
      UsSource::new(fixture.clone(), UsConfig { base_url: US_URL.into(), page_size: 10 }),
      EuSource::new(fixture, EuConfig {
        url:            EU_URL.into(),
        max_attempts:   3,
        retry_delay_ms: 0,
      }),
    )
  }

  fn healthy() -> Fixture {
    Fixture {
      us: Some(us_body()),
      eu: Some(EU_BODY.to_owned()),
      ..Default::default()
    }
  }

  async fn memory_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  #[tokio::test]
  async fn run_all_ingests_both_sources() {
    let store = memory_store().await;
    let p = pipeline(store.clone(), healthy());

    let report = p.run_all().await;
    assert!(report.is_ok());

    let us = report.us.unwrap();
    assert_eq!(us, SourceReport { fetched: 3, inserted: 2, duplicates: 0, skipped: 1 });
    let eu = report.eu.unwrap();
    assert_eq!(eu, SourceReport { fetched: 3, inserted: 2, duplicates: 0, skipped: 1 });

    assert_eq!(store.counts().await.unwrap(), (2, 2));
    // 2 + 1 US condition rows, 2 EU rows.
    assert_eq!(store.combined(&ViewQuery::default()).await.unwrap().len(), 5);
  }

  #[tokio::test]
  async fn second_run_is_idempotent() {
    let store = memory_store().await;
    let p = pipeline(store.clone(), healthy());

    p.run_all().await;
    let first = store.counts().await.unwrap();
    let report = p.run_all().await;
    assert_eq!(store.counts().await.unwrap(), first);

    let us = report.us.unwrap();
    assert_eq!(us.inserted, 0);
    assert_eq!(us.duplicates, 2);
    assert_eq!(report.eu.unwrap().duplicates, 2);
  }

  #[tokio::test]
  async fn eu_outage_does_not_block_us_or_view() {
    let store = memory_store().await;
    let fixture = Fixture { us: Some(us_body()), ..Default::default() };
    let p = pipeline(store.clone(), fixture.clone());

    let report = p.run_all().await;
    assert!(report.is_ok());
    assert_eq!(report.eu.unwrap(), SourceReport::default());
    assert_eq!(fixture.eu_calls.load(Ordering::SeqCst), 3);

    let rows = store.combined(&ViewQuery::default()).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.study_identifier.starts_with("US_")));
  }

  #[tokio::test]
  async fn us_outage_does_not_block_eu_or_view() {
    let store = memory_store().await;
    let fixture = Fixture { eu: Some(EU_BODY.to_owned()), ..Default::default() };
    let p = pipeline(store.clone(), fixture);

    let report = p.run_all().await;
    assert_eq!(report.us.unwrap().fetched, 0);
    assert_eq!(report.eu.unwrap().inserted, 2);
    assert!(report.view.is_ok());

    let rows = store.combined(&ViewQuery::default()).await.unwrap();
    assert_eq!(rows[0].study_identifier, "EU_2004-000001-11");
    assert_eq!(rows[0].study_name.as_deref(), Some("example trial"));
  }

  #[tokio::test]
  async fn single_source_passes_create_their_table() {
    let store = memory_store().await;
    let p = pipeline(store.clone(), healthy());

    p.run_us().await.unwrap();
    p.run_eu().await.unwrap();
    p.reconcile().await.unwrap();
    assert_eq!(store.counts().await.unwrap(), (2, 2));
  }

  // ─── store failures ─────────────────────────────────────────────────────

  /// A store whose every operation fails, standing in for a lost database.
  struct BrokenStore;

  fn broken() -> io::Error { io::Error::new(io::ErrorKind::ConnectionRefused, "database unreachable") }

  impl StudyStore for BrokenStore {
    type Error = io::Error;

    async fn ensure_us_table(&self) -> io::Result<()> { Err(broken()) }
    async fn ensure_eu_table(&self) -> io::Result<()> { Err(broken()) }
    async fn reconcile_view(&self) -> io::Result<()> { Err(broken()) }
    async fn insert_us(&self, _: &UsStudy) -> io::Result<InsertOutcome> { Err(broken()) }
    async fn insert_eu(&self, _: &EuStudy) -> io::Result<InsertOutcome> { Err(broken()) }
    async fn get_us(&self, _: &str) -> io::Result<Option<UsStudy>> { Err(broken()) }
    async fn get_eu(&self, _: &str) -> io::Result<Option<EuStudy>> { Err(broken()) }
    async fn counts(&self) -> io::Result<(u64, u64)> { Err(broken()) }
    async fn combined(&self, _: &ViewQuery) -> io::Result<Vec<CombinedRow>> { Err(broken()) }
    async fn condition_counts(&self) -> io::Result<Vec<ConditionCount>> { Err(broken()) }
    async fn sponsor_counts(&self) -> io::Result<Vec<SponsorCount>> { Err(broken()) }
  }

  #[tokio::test]
  async fn store_failure_is_surfaced_per_stage() {
    let fixture = healthy();
    let p = pipeline(Arc::new(BrokenStore), fixture.clone());

    let report = p.run_all().await;
    assert!(!report.is_ok());
    assert!(report.us.is_err());
    assert!(report.eu.is_err());
    assert!(report.view.is_err());
    // The EU source was still fetched after the US stage failed.
    assert_eq!(fixture.eu_calls.load(Ordering::SeqCst), 1);
  }
}
