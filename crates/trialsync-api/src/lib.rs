//! Read-only JSON API over the reconciled study view.
//!
//! Exposes an axum [`Router`] backed by any [`StudyStore`]. Every read goes
//! through `combined_view` or a base table, so responses always reflect the
//! latest committed ingestion.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", trialsync_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod stats;
pub mod studies;

use std::sync::Arc;

use axum::{Router, routing::get};
use trialsync_core::store::StudyStore;

pub use error::ApiError;

/// Build the API router for `store`.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: StudyStore + 'static,
{
  Router::new()
    // Studies
    .route("/studies", get(studies::list::<S>))
    .route("/studies/us/{nct_id}", get(studies::get_us::<S>))
    .route("/studies/eu/{eudract_number}", get(studies::get_eu::<S>))
    // Aggregates
    .route("/conditions", get(stats::conditions::<S>))
    .route("/sponsors", get(stats::sponsors::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use trialsync_core::study::{EuStudy, UsStudy};
  use trialsync_store_sqlite::SqliteStore;

  use super::*;

  async fn seeded_store() -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.ensure_us_table().await.unwrap();
    store.ensure_eu_table().await.unwrap();

    let mut us = UsStudy::new("NCT00000001", "ORG-1", "Brief", true);
    us.official_title = Some("Inhaled Therapy Study".into());
    us.conditions = json!({ "conditions": ["Asthma", "COPD"] });
    us.sponsor_collaborators = json!({ "leadSponsor": { "name": "Acme" } });
    store.insert_us(&us).await.unwrap();

    store
      .insert_eu(&EuStudy {
        eudract_number:          Some("2004-000001-11".into()),
        sponsor_protocol_number: None,
        sponsor_name:            Some("EuroPharma".into()),
        full_title:              Some("Example Trial".into()),
        medical_condition:       Some("Asthma".into()),
      })
      .await
      .unwrap();

    store.reconcile_view().await.unwrap();
    Arc::new(store)
  }

  async fn get_json(store: Arc<SqliteStore>, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = api_router(store).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn list_studies_returns_view_rows() {
    let (status, body) = get_json(seeded_store().await, "/studies").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["study_identifier"], "EU_2004-000001-11");
    assert_eq!(rows[0]["study_name"], "example trial");
    assert_eq!(rows[1]["study_identifier"], "US_NCT00000001");
    assert_eq!(rows[1]["study_name"], "inhaled therapy study");
  }

  #[tokio::test]
  async fn list_studies_filters_by_source() {
    let (status, body) = get_json(seeded_store().await, "/studies?source=us&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["study_identifier"], "US_NCT00000001");
  }

  #[tokio::test]
  async fn unknown_source_is_bad_request() {
    let (status, body) = get_json(seeded_store().await, "/studies?source=jp").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("jp"));
  }

  #[tokio::test]
  async fn get_single_studies() {
    let store = seeded_store().await;

    let (status, body) = get_json(store.clone(), "/studies/us/NCT00000001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nct_id"], "NCT00000001");
    assert_eq!(body["has_results"], true);

    let (status, body) = get_json(store.clone(), "/studies/eu/2004-000001-11").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sponsor_name"], "EuroPharma");

    let (status, body) = get_json(store, "/studies/us/NCT99999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no such study: us/NCT99999999");
  }

  #[tokio::test]
  async fn aggregates() {
    let store = seeded_store().await;

    let (status, body) = get_json(store.clone(), "/conditions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0], json!({ "condition": "Asthma", "trial_count": 2 }));

    let (status, body) = get_json(store, "/sponsors").await;
    assert_eq!(status, StatusCode::OK);
    let sponsors = body.as_array().unwrap();
    assert_eq!(sponsors.len(), 2);
    assert!(sponsors.contains(&json!({ "sponsor": "Acme", "trial_count": 1 })));
    assert!(sponsors.contains(&json!({ "sponsor": "EuroPharma", "trial_count": 1 })));
  }

  #[tokio::test]
  async fn missing_view_is_a_server_error() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let (status, body) = get_json(store, "/conditions").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
  }
}
