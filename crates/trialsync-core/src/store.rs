//! The `StudyStore` trait.
//!
//! Implemented by storage backends (e.g. `trialsync-store-sqlite`). The
//! ingestion pipeline and the query API depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  study::{EuStudy, UsStudy},
  view::{CombinedRow, ConditionCount, SponsorCount, ViewQuery},
};

/// What happened to a single insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
  /// A new row was written.
  Inserted,
  /// The key already existed; the stored row was left untouched.
  Duplicate,
}

/// Abstraction over a trialsync persistence backend.
///
/// Writes are append-only with first-write-wins duplicate suppression. Every
/// statement commits on its own; there is no batching.
pub trait StudyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Schema ────────────────────────────────────────────────────────────

  /// Create the `us` table if it does not exist.
  fn ensure_us_table(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Create the `eu` table if it does not exist.
  fn ensure_eu_table(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace the definition of `combined_view`. Touches no rows.
  fn reconcile_view(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert a US study; a colliding `nct_id` is a silent no-op.
  fn insert_us<'a>(
    &'a self,
    study: &'a UsStudy,
  ) -> impl Future<Output = Result<InsertOutcome, Self::Error>> + Send + 'a;

  /// Insert an EU study; a colliding `eudract_number` is a silent no-op.
  ///
  /// Returns an error if the study has no `eudract_number`.
  fn insert_eu<'a>(
    &'a self,
    study: &'a EuStudy,
  ) -> impl Future<Output = Result<InsertOutcome, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn get_us<'a>(
    &'a self,
    nct_id: &'a str,
  ) -> impl Future<Output = Result<Option<UsStudy>, Self::Error>> + Send + 'a;

  fn get_eu<'a>(
    &'a self,
    eudract_number: &'a str,
  ) -> impl Future<Output = Result<Option<EuStudy>, Self::Error>> + Send + 'a;

  /// Row counts of the `us` and `eu` tables.
  fn counts(&self) -> impl Future<Output = Result<(u64, u64), Self::Error>> + Send + '_;

  /// Read rows of `combined_view`, computed fresh on each call.
  fn combined<'a>(
    &'a self,
    query: &'a ViewQuery,
  ) -> impl Future<Output = Result<Vec<CombinedRow>, Self::Error>> + Send + 'a;

  /// View rows grouped by condition.
  fn condition_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<ConditionCount>, Self::Error>> + Send + '_;

  /// Distinct studies grouped by sponsor.
  fn sponsor_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<SponsorCount>, Self::Error>> + Send + '_;
}
