//! Read models over the reconciled cross-source view.

use serde::{Deserialize, Serialize};

use crate::study::Source;

/// One row of `combined_view`.
///
/// US studies appear once per condition; EU studies appear once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedRow {
  /// Source-prefixed key: `US_<nct_id>` or `EU_<eudract_number>`.
  pub study_identifier: String,
  /// Lower-cased title.
  pub study_name:       Option<String>,
  pub conditions:       Option<String>,
  pub sponsor:          Option<String>,
}

/// Parameters for [`StudyStore::combined`](crate::store::StudyStore::combined).
#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
  pub source: Option<Source>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// Number of view rows per condition string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionCount {
  pub condition:   Option<String>,
  pub trial_count: i64,
}

/// Number of distinct studies per sponsor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsorCount {
  pub sponsor:     Option<String>,
  pub trial_count: i64,
}
