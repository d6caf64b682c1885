//! Handlers for the read-only endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/entities` | Every entity with at least one version |
//! | `GET`  | `/entities/{id}/current` | 404 if nothing is true now |
//! | `GET`  | `/entities/{id}/valid-at` | `?t=`; 404 if nothing is true at `t` |
//! | `GET`  | `/entities/{id}/known-at` | `?t=` required, `valid_point` optional |
//! | `GET`  | `/entities/{id}/audit` | Every version ever recorded |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use bitemp_core::{
  Engine,
  clock::Clock,
  interval::Timestamp,
  lifecycle::AuditEntry,
  store::VersionStore,
  version::{EntityId, Version},
};
use serde::Deserialize;

use crate::error::ApiError;

/// `GET /entities`
pub async fn entities<S: VersionStore, C: Clock>(
  State(engine): State<Arc<Engine<S, C>>>,
) -> Result<Json<Vec<EntityId>>, ApiError> {
  Ok(Json(engine.entities().await?))
}

/// `GET /entities/{id}/current`
pub async fn current<S: VersionStore, C: Clock>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<String>,
) -> Result<Json<Version>, ApiError> {
  let entity_id = EntityId::new(id);
  engine
    .query_current(&entity_id)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("{entity_id} has no current version")))
}

#[derive(Debug, Deserialize)]
pub struct ValidAtParams {
  pub t: Timestamp,
}

/// `GET /entities/{id}/valid-at?t=<instant>`
pub async fn valid_at<S: VersionStore, C: Clock>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<String>,
  Query(params): Query<ValidAtParams>,
) -> Result<Json<Version>, ApiError> {
  let entity_id = EntityId::new(id);
  engine
    .query_as_valid_at(&entity_id, params.t)
    .await?
    .map(Json)
    .ok_or_else(|| {
      ApiError::NotFound(format!("nothing is known about {entity_id} at {}", params.t))
    })
}

#[derive(Debug, Deserialize)]
pub struct KnownAtParams {
  /// Transaction instant to look back from.
  pub t:           Timestamp,
  /// Restrict to the version valid at this instant.
  pub valid_point: Option<Timestamp>,
}

/// `GET /entities/{id}/known-at?t=<instant>[&valid_point=<instant>]`
///
/// Always a list, possibly empty.
pub async fn known_at<S: VersionStore, C: Clock>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<String>,
  Query(params): Query<KnownAtParams>,
) -> Result<Json<Vec<Version>>, ApiError> {
  let versions = engine
    .query_as_known_at(&EntityId::new(id), params.t, params.valid_point)
    .await?;
  Ok(Json(versions))
}

/// `GET /entities/{id}/audit`
pub async fn audit<S: VersionStore, C: Clock>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
  Ok(Json(engine.query_audit_trail(&EntityId::new(id)).await?))
}
