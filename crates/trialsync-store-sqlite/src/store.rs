//! [`SqliteStore`], the SQLite implementation of [`StudyStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use trialsync_core::{
  store::{InsertOutcome, StudyStore},
  study::{EuStudy, UsStudy},
  view::{CombinedRow, ConditionCount, SponsorCount, ViewQuery},
};

use crate::{
  encode::{eu_from_row, RawUsStudy, EU_COLUMNS, US_COLUMNS},
  schema::{COMBINED_VIEW, EU_TABLE, PRAGMAS, US_TABLE},
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A trialsync study store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path`.
  ///
  /// Tables are not created here; callers run the `ensure_*` operations
  /// before writing.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  async fn apply_pragmas(&self) -> Result<()> {
    self.execute_batch(PRAGMAS).await
  }

  /// Run one or more DDL statements in autocommit mode.
  async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── StudyStore impl ─────────────────────────────────────────────────────────

impl StudyStore for SqliteStore {
  type Error = crate::Error;

  // ── Schema ────────────────────────────────────────────────────────────────

  async fn ensure_us_table(&self) -> Result<()> {
    self.execute_batch(US_TABLE).await
  }

  async fn ensure_eu_table(&self) -> Result<()> {
    self.execute_batch(EU_TABLE).await
  }

  async fn reconcile_view(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(US_TABLE)?;
        tx.execute_batch(EU_TABLE)?;
        tx.execute_batch(COMBINED_VIEW)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    tracing::debug!("combined_view redefined");
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert_us(&self, study: &UsStudy) -> Result<InsertOutcome> {
    let raw = RawUsStudy::encode(study)?;
    let nct_id = study.nct_id.clone();

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO us (
             nct_id, org_study_id, secondary_ids, organization, brief_title,
             official_title, status, sponsor_collaborators, description,
             conditions, design, arms_interventions, outcomes, eligibility,
             contacts_locations, derived, has_results
           ) VALUES (
             ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17
           )
           ON CONFLICT (nct_id) DO NOTHING",
          rusqlite::params![
            raw.nct_id,
            raw.org_study_id,
            raw.secondary_ids,
            raw.organization,
            raw.brief_title,
            raw.official_title,
            raw.status,
            raw.sponsor_collaborators,
            raw.description,
            raw.conditions,
            raw.design,
            raw.arms_interventions,
            raw.outcomes,
            raw.eligibility,
            raw.contacts_locations,
            raw.derived,
            raw.has_results,
          ],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      tracing::debug!(%nct_id, "us study already stored");
      return Ok(InsertOutcome::Duplicate);
    }
    Ok(InsertOutcome::Inserted)
  }

  async fn insert_eu(&self, study: &EuStudy) -> Result<InsertOutcome> {
    let key = study.key()?.to_owned();
    let row = study.clone();

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO eu (
             eudract_number, sponsor_protocol_number, sponsor_name,
             full_title, medical_condition
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (eudract_number) DO NOTHING",
          rusqlite::params![
            row.eudract_number,
            row.sponsor_protocol_number,
            row.sponsor_name,
            row.full_title,
            row.medical_condition,
          ],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      tracing::debug!(eudract_number = %key, "eu study already stored");
      return Ok(InsertOutcome::Duplicate);
    }
    Ok(InsertOutcome::Inserted)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_us(&self, nct_id: &str) -> Result<Option<UsStudy>> {
    let id = nct_id.to_owned();

    let raw: Option<RawUsStudy> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {US_COLUMNS} FROM us WHERE nct_id = ?1"),
            rusqlite::params![id],
            RawUsStudy::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUsStudy::into_study).transpose()
  }

  async fn get_eu(&self, eudract_number: &str) -> Result<Option<EuStudy>> {
    let id = eudract_number.to_owned();

    let study = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {EU_COLUMNS} FROM eu WHERE eudract_number = ?1"),
            rusqlite::params![id],
            eu_from_row,
          )
          .optional()?)
      })
      .await?;

    Ok(study)
  }

  async fn counts(&self) -> Result<(u64, u64)> {
    let (us, eu): (i64, i64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT (SELECT COUNT(*) FROM us), (SELECT COUNT(*) FROM eu)",
          [],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok((us as u64, eu as u64))
  }

  async fn combined(&self, query: &ViewQuery) -> Result<Vec<CombinedRow>> {
    let prefix     = query.source.map(|s| s.prefix().to_owned());
    // SQLite reads a negative LIMIT as "no limit", so saturate instead of wrapping.
    let limit_val  = i64::try_from(query.limit.unwrap_or(100)).unwrap_or(i64::MAX);
    let offset_val = i64::try_from(query.offset.unwrap_or(0)).unwrap_or(i64::MAX);

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT study_identifier, study_name, conditions, sponsor
           FROM combined_view
           WHERE ?1 IS NULL OR substr(study_identifier, 1, 3) = ?1
           ORDER BY study_identifier, conditions
           LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt
          .query_map(
            rusqlite::params![prefix.as_deref(), limit_val, offset_val],
            |row| {
              Ok(CombinedRow {
                study_identifier: row.get(0)?,
                study_name:       row.get(1)?,
                conditions:       row.get(2)?,
                sponsor:          row.get(3)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn condition_counts(&self) -> Result<Vec<ConditionCount>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT conditions, COUNT(*) AS trial_count
           FROM combined_view
           GROUP BY conditions
           ORDER BY trial_count DESC, conditions",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(ConditionCount {
              condition:   row.get(0)?,
              trial_count: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn sponsor_counts(&self) -> Result<Vec<SponsorCount>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT sponsor, COUNT(DISTINCT study_identifier) AS trial_count
           FROM combined_view
           GROUP BY sponsor
           ORDER BY trial_count DESC, sponsor",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(SponsorCount {
              sponsor:     row.get(0)?,
              trial_count: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }
}
