//! Handlers for `/studies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/studies` | Optional `?source=us\|eu&limit=&offset=` |
//! | `GET`  | `/studies/us/{nct_id}` | 404 if not found |
//! | `GET`  | `/studies/eu/{eudract_number}` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use trialsync_core::{
  store::StudyStore,
  study::{EuStudy, Source, UsStudy},
  view::{CombinedRow, ViewQuery},
};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// `us` or `eu`; both when absent.
  pub source: Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /studies[?source=<us|eu>][&limit=...][&offset=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CombinedRow>>, ApiError>
where
  S: StudyStore,
{
  let source = params
    .source
    .as_deref()
    .map(str::parse::<Source>)
    .transpose()
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let query = ViewQuery {
    source,
    limit: params.limit,
    offset: params.offset,
  };

  let rows = store.combined(&query).await.map_err(ApiError::store)?;
  Ok(Json(rows))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /studies/us/{nct_id}`
pub async fn get_us<S>(
  State(store): State<Arc<S>>,
  Path(nct_id): Path<String>,
) -> Result<Json<UsStudy>, ApiError>
where
  S: StudyStore,
{
  let study = store
    .get_us(&nct_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("us/{nct_id}")))?;
  Ok(Json(study))
}

/// `GET /studies/eu/{eudract_number}`
pub async fn get_eu<S>(
  State(store): State<Arc<S>>,
  Path(eudract_number): Path<String>,
) -> Result<Json<EuStudy>, ApiError>
where
  S: StudyStore,
{
  let study = store
    .get_eu(&eudract_number)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("eu/{eudract_number}")))?;
  Ok(Json(study))
}
