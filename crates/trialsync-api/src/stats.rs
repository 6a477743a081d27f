//! Aggregate handlers over `combined_view`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/conditions` | view rows per condition |
//! | `GET`  | `/sponsors`   | distinct studies per sponsor |

use std::sync::Arc;

use axum::{Json, extract::State};
use trialsync_core::{
  store::StudyStore,
  view::{ConditionCount, SponsorCount},
};

use crate::error::ApiError;

/// `GET /conditions`
pub async fn conditions<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<ConditionCount>>, ApiError>
where
  S: StudyStore,
{
  let counts = store.condition_counts().await.map_err(ApiError::store)?;
  Ok(Json(counts))
}

/// `GET /sponsors`
pub async fn sponsors<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<SponsorCount>>, ApiError>
where
  S: StudyStore,
{
  let counts = store.sponsor_counts().await.map_err(ApiError::store)?;
  Ok(Json(counts))
}
