//! Error types for the source adapters.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("GET {url} → {status}")]
  Status { url: String, status: u16 },

  #[error("invalid JSON body: {0}")]
  Json(#[from] serde_json::Error),

  #[error("missing required field `{0}`")]
  MissingField(&'static str),

  #[error("field `{field}` is not a {expected}")]
  InvalidField {
    field:    &'static str,
    expected: &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
