//! US registry adapter (clinicaltrials.gov v2 JSON API).
//!
//! Pipeline:
//!   GET {base_url}?pageSize=N
//!     └─ StudiesPage.studies      → Vec<Payload>
//!          └─ parse_study()       → Result<UsStudy>
//!
//! A failed fetch is logged and yields no documents; there is no retry. A
//! document missing a required field fails on its own without touching the
//! rest of the batch.

use serde::Deserialize;
use trialsync_core::study::{empty_object, Payload, UsStudy};

use crate::{Error, Fetch, Result};

pub const DEFAULT_BASE_URL: &str = "https://clinicaltrials.gov/api/v2/studies";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// ─── JSON pointers into a study document ─────────────────────────────────────

const NCT_ID: &str = "/protocolSection/identificationModule/nctId";
const ORG_STUDY_ID: &str = "/protocolSection/identificationModule/orgStudyIdInfo/id";
const SECONDARY_IDS: &str = "/protocolSection/identificationModule/secondaryIdInfos";
const ORGANIZATION: &str = "/protocolSection/identificationModule/organization";
const BRIEF_TITLE: &str = "/protocolSection/identificationModule/briefTitle";
const OFFICIAL_TITLE: &str = "/protocolSection/identificationModule/officialTitle";
const STATUS: &str = "/protocolSection/statusModule";
const SPONSOR_COLLABORATORS: &str = "/protocolSection/sponsorCollaboratorsModule";
const DESCRIPTION: &str = "/protocolSection/descriptionModule";
const CONDITIONS: &str = "/protocolSection/conditionsModule";
const DESIGN: &str = "/protocolSection/designModule";
const ARMS_INTERVENTIONS: &str = "/protocolSection/armsInterventionsModule";
const OUTCOMES: &str = "/protocolSection/outcomesModule";
const ELIGIBILITY: &str = "/protocolSection/eligibilityModule";
const CONTACTS_LOCATIONS: &str = "/protocolSection/contactsLocationsModule";
const DERIVED: &str = "/derivedSection";
const HAS_RESULTS: &str = "/hasResults";

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsConfig {
  pub base_url:  String,
  /// Upper bound on studies returned by the single page request.
  pub page_size: u32,
}

impl Default for UsConfig {
  fn default() -> Self {
    Self {
      base_url:  DEFAULT_BASE_URL.to_owned(),
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl UsConfig {
  pub fn url(&self) -> String {
    let sep = if self.base_url.contains('?') { '&' } else { '?' };
    format!("{}{sep}pageSize={}", self.base_url, self.page_size)
  }
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StudiesPage {
  #[serde(default)]
  studies: Vec<Payload>,
}

/// Fetches one page of studies from the US registry.
pub struct UsSource<F> {
  fetcher: F,
  config:  UsConfig,
}

impl<F: Fetch> UsSource<F> {
  pub fn new(fetcher: F, config: UsConfig) -> Self { Self { fetcher, config } }

  /// Fetch the raw study documents. Any failure yields an empty batch.
  pub async fn fetch(&self) -> Vec<Payload> {
    match self.try_fetch().await {
      Ok(studies) => {
        tracing::info!(count = studies.len(), "fetched us studies");
        studies
      }
      Err(e) => {
        tracing::warn!(error = %e, "us fetch failed; continuing with no studies");
        Vec::new()
      }
    }
  }

  async fn try_fetch(&self) -> Result<Vec<Payload>> {
    let body = self.fetcher.get(&self.config.url()).await?;
    let page: StudiesPage = serde_json::from_str(&body)?;
    Ok(page.studies)
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

fn required_str(doc: &Payload, pointer: &'static str) -> Result<String> {
  match doc.pointer(pointer) {
    None | Some(Payload::Null) => Err(Error::MissingField(pointer)),
    Some(Payload::String(s)) => Ok(s.clone()),
    Some(_) => Err(Error::InvalidField { field: pointer, expected: "string" }),
  }
}

fn optional_str(doc: &Payload, pointer: &str) -> Option<String> {
  doc.pointer(pointer).and_then(Payload::as_str).map(str::to_owned)
}

/// An optional module, or `default` when absent or null.
fn module_or(doc: &Payload, pointer: &str, default: fn() -> Payload) -> Payload {
  doc
    .pointer(pointer)
    .filter(|v| !v.is_null())
    .cloned()
    .unwrap_or_else(default)
}

fn module(doc: &Payload, pointer: &str) -> Payload { module_or(doc, pointer, empty_object) }

/// Flatten one study document into a [`UsStudy`].
pub fn parse_study(doc: &Payload) -> Result<UsStudy> {
  let has_results = match doc.pointer(HAS_RESULTS) {
    None | Some(Payload::Null) => return Err(Error::MissingField(HAS_RESULTS)),
    Some(Payload::Bool(b)) => *b,
    Some(_) => {
      return Err(Error::InvalidField { field: HAS_RESULTS, expected: "boolean" });
    }
  };

  Ok(UsStudy {
    nct_id:                required_str(doc, NCT_ID)?,
    org_study_id:          required_str(doc, ORG_STUDY_ID)?,
    secondary_ids:         module_or(doc, SECONDARY_IDS, || Payload::Array(Vec::new())),
    organization:          module(doc, ORGANIZATION),
    brief_title:           required_str(doc, BRIEF_TITLE)?,
    official_title:        optional_str(doc, OFFICIAL_TITLE),
    status:                module(doc, STATUS),
    sponsor_collaborators: module(doc, SPONSOR_COLLABORATORS),
    description:           module(doc, DESCRIPTION),
    conditions:            module(doc, CONDITIONS),
    design:                module(doc, DESIGN),
    arms_interventions:    module(doc, ARMS_INTERVENTIONS),
    outcomes:              module(doc, OUTCOMES),
    eligibility:           module(doc, ELIGIBILITY),
    contacts_locations:    module(doc, CONTACTS_LOCATIONS),
    derived:               module(doc, DERIVED),
    has_results,
  })
}

/// Parse a batch; each document succeeds or fails independently, in order.
pub fn parse_studies(docs: &[Payload]) -> Vec<Result<UsStudy>> {
  docs.iter().map(parse_study).collect()
}
