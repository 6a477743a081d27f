//! Encoding and decoding helpers between the domain records and the
//! plain-text representations stored in SQLite columns.
//!
//! Structured payloads are stored as compact JSON text so SQLite's JSON1
//! functions can reach into them. `has_results` is stored as 0/1.

use trialsync_core::study::{EuStudy, Payload, UsStudy};

use crate::{Error, Result};

// ─── Payload ─────────────────────────────────────────────────────────────────

pub fn encode_payload(column: &'static str, value: &Payload) -> Result<String> {
  serde_json::to_string(value).map_err(|source| Error::Json { column, source })
}

pub fn decode_payload(column: &'static str, s: &str) -> Result<Payload> {
  serde_json::from_str(s).map_err(|source| Error::Json { column, source })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` against `us`, in [`RawUsStudy`] order.
pub const US_COLUMNS: &str = "
  nct_id, org_study_id, secondary_ids, organization, brief_title,
  official_title, status, sponsor_collaborators, description, conditions,
  design, arms_interventions, outcomes, eligibility, contacts_locations,
  derived, has_results";

/// Column values for one `us` row, ready to bind or just read.
pub struct RawUsStudy {
  pub nct_id:                String,
  pub org_study_id:          String,
  pub secondary_ids:         String,
  pub organization:          String,
  pub brief_title:           String,
  pub official_title:        Option<String>,
  pub status:                String,
  pub sponsor_collaborators: String,
  pub description:           String,
  pub conditions:            String,
  pub design:                String,
  pub arms_interventions:    String,
  pub outcomes:              String,
  pub eligibility:           String,
  pub contacts_locations:    String,
  pub derived:               String,
  pub has_results:           bool,
}

impl RawUsStudy {
  pub fn encode(s: &UsStudy) -> Result<Self> {
    Ok(Self {
      nct_id:                s.nct_id.clone(),
      org_study_id:          s.org_study_id.clone(),
      secondary_ids:         encode_payload("secondary_ids", &s.secondary_ids)?,
      organization:          encode_payload("organization", &s.organization)?,
      brief_title:           s.brief_title.clone(),
      official_title:        s.official_title.clone(),
      status:                encode_payload("status", &s.status)?,
      sponsor_collaborators: encode_payload("sponsor_collaborators", &s.sponsor_collaborators)?,
      description:           encode_payload("description", &s.description)?,
      conditions:            encode_payload("conditions", &s.conditions)?,
      design:                encode_payload("design", &s.design)?,
      arms_interventions:    encode_payload("arms_interventions", &s.arms_interventions)?,
      outcomes:              encode_payload("outcomes", &s.outcomes)?,
      eligibility:           encode_payload("eligibility", &s.eligibility)?,
      contacts_locations:    encode_payload("contacts_locations", &s.contacts_locations)?,
      derived:               encode_payload("derived", &s.derived)?,
      has_results:           s.has_results,
    })
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      nct_id:                row.get(0)?,
      org_study_id:          row.get(1)?,
      secondary_ids:         row.get(2)?,
      organization:          row.get(3)?,
      brief_title:           row.get(4)?,
      official_title:        row.get(5)?,
      status:                row.get(6)?,
      sponsor_collaborators: row.get(7)?,
      description:           row.get(8)?,
      conditions:            row.get(9)?,
      design:                row.get(10)?,
      arms_interventions:    row.get(11)?,
      outcomes:              row.get(12)?,
      eligibility:           row.get(13)?,
      contacts_locations:    row.get(14)?,
      derived:               row.get(15)?,
      has_results:           row.get(16)?,
    })
  }

  pub fn into_study(self) -> Result<UsStudy> {
    Ok(UsStudy {
      nct_id:                self.nct_id,
      org_study_id:          self.org_study_id,
      secondary_ids:         decode_payload("secondary_ids", &self.secondary_ids)?,
      organization:          decode_payload("organization", &self.organization)?,
      brief_title:           self.brief_title,
      official_title:        self.official_title,
      status:                decode_payload("status", &self.status)?,
      sponsor_collaborators: decode_payload("sponsor_collaborators", &self.sponsor_collaborators)?,
      description:           decode_payload("description", &self.description)?,
      conditions:            decode_payload("conditions", &self.conditions)?,
      design:                decode_payload("design", &self.design)?,
      arms_interventions:    decode_payload("arms_interventions", &self.arms_interventions)?,
      outcomes:              decode_payload("outcomes", &self.outcomes)?,
      eligibility:           decode_payload("eligibility", &self.eligibility)?,
      contacts_locations:    decode_payload("contacts_locations", &self.contacts_locations)?,
      derived:               decode_payload("derived", &self.derived)?,
      has_results:           self.has_results,
    })
  }
}

pub const EU_COLUMNS: &str =
  "eudract_number, sponsor_protocol_number, sponsor_name, full_title, medical_condition";

pub fn eu_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EuStudy> {
  Ok(EuStudy {
    eudract_number:          row.get(0)?,
    sponsor_protocol_number: row.get(1)?,
    sponsor_name:            row.get(2)?,
    full_title:              row.get(3)?,
    medical_condition:       row.get(4)?,
  })
}
