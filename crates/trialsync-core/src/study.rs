//! Canonical study records for the two registries.
//!
//! Both record types are plain data. Parsing lives in `trialsync-sources`,
//! persistence in `trialsync-store-sqlite`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A schema-flexible structured value, stored verbatim.
///
/// Nested registry modules are kept as opaque JSON so upstream schema drift
/// never requires a code change.
pub type Payload = serde_json::Value;

/// An empty JSON object, the stand-in for any absent optional module.
pub fn empty_object() -> Payload { Payload::Object(serde_json::Map::new()) }

// ─── Source ──────────────────────────────────────────────────────────────────

/// The registry a record was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  Us,
  Eu,
}

impl Source {
  /// Prefix applied to the source key in the combined view.
  pub fn prefix(self) -> &'static str {
    match self {
      Source::Us => "US_",
      Source::Eu => "EU_",
    }
  }
}

impl FromStr for Source {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "us" => Ok(Source::Us),
      "eu" => Ok(Source::Eu),
      _ => Err(Error::UnknownSource(s.to_owned())),
    }
  }
}

// ─── US ──────────────────────────────────────────────────────────────────────

/// A study from the US registry JSON API, flattened to fixed columns.
///
/// Every [`Payload`] field is a well-formed value: an absent module is an
/// empty object (or an empty array for `secondary_ids`), never null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsStudy {
  pub nct_id:                String,
  pub org_study_id:          String,
  pub secondary_ids:         Payload,
  pub organization:          Payload,
  pub brief_title:           String,
  pub official_title:        Option<String>,
  pub status:                Payload,
  pub sponsor_collaborators: Payload,
  pub description:           Payload,
  pub conditions:            Payload,
  pub design:                Payload,
  pub arms_interventions:    Payload,
  pub outcomes:              Payload,
  pub eligibility:           Payload,
  pub contacts_locations:    Payload,
  pub derived:               Payload,
  pub has_results:           bool,
}

impl UsStudy {
  /// A study with the required fields set and every module empty.
  pub fn new(
    nct_id: impl Into<String>,
    org_study_id: impl Into<String>,
    brief_title: impl Into<String>,
    has_results: bool,
  ) -> Self {
    Self {
      nct_id: nct_id.into(),
      org_study_id: org_study_id.into(),
      secondary_ids: Payload::Array(Vec::new()),
      organization: empty_object(),
      brief_title: brief_title.into(),
      official_title: None,
      status: empty_object(),
      sponsor_collaborators: empty_object(),
      description: empty_object(),
      conditions: empty_object(),
      design: empty_object(),
      arms_interventions: empty_object(),
      outcomes: empty_object(),
      eligibility: empty_object(),
      contacts_locations: empty_object(),
      derived: empty_object(),
      has_results,
    }
  }
}

// ─── EU ──────────────────────────────────────────────────────────────────────

/// A trial block scraped from the EU registry search page.
///
/// Each attribute is independently optional; a label missing from the block
/// leaves its field `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EuStudy {
  pub eudract_number:          Option<String>,
  pub sponsor_protocol_number: Option<String>,
  pub sponsor_name:            Option<String>,
  pub full_title:              Option<String>,
  pub medical_condition:       Option<String>,
}

impl EuStudy {
  /// The primary key, or [`Error::MissingKey`] if the block had none.
  pub fn key(&self) -> crate::Result<&str> {
    self
      .eudract_number
      .as_deref()
      .ok_or(Error::MissingKey("eudract_number"))
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn source_prefix_and_parse() {
    assert_eq!(Source::Us.prefix(), "US_");
    assert_eq!(Source::Eu.prefix(), "EU_");
    assert_eq!("EU".parse::<Source>().unwrap(), Source::Eu);
    assert!(matches!("xx".parse::<Source>(), Err(Error::UnknownSource(_))));
  }

  #[test]
  fn new_us_study_has_empty_modules() {
    let s = UsStudy::new("NCT1", "ORG-1", "Brief", false);
    assert_eq!(s.secondary_ids, json!([]));
    assert_eq!(s.derived, json!({}));
    assert_eq!(s.conditions, json!({}));
    assert_eq!(s.official_title, None);
  }

  #[test]
  fn eu_key_missing() {
    let e = EuStudy::default();
    assert!(matches!(e.key(), Err(Error::MissingKey("eudract_number"))));
  }
}
