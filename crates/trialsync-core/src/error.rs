//! Error types for `trialsync-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown source: {0:?}")]
  UnknownSource(String),

  #[error("record has no value for primary key `{0}`")]
  MissingKey(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
