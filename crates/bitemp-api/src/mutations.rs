//! Handlers for the mutation endpoints.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/entities/{id}/versions` | [`PeriodBody`] |
//! | `POST` | `/entities/{id}/corrections` | [`PeriodBody`] |
//! | `POST` | `/entities/{id}/backdates` | [`BackdateBody`] |
//! | `POST` | `/entities/{id}/retractions` | [`RetractBody`] |
//!
//! Each returns 201 and the [`Revision`] describing every write made.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use bitemp_core::{
  Engine,
  clock::Clock,
  interval::Timestamp,
  lifecycle::Revision,
  store::VersionStore,
  version::{Attributes, EntityId},
};
use serde::Deserialize;

use crate::error::ApiError;

type Created = (StatusCode, Json<Revision>);

/// Attributes believed for `[valid_from, valid_to)`. A missing or null
/// `valid_to` means open-ended.
#[derive(Debug, Deserialize)]
pub struct PeriodBody {
  pub attributes: Attributes,
  pub valid_from: Timestamp,
  #[serde(default)]
  pub valid_to:   Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
pub struct BackdateBody {
  pub attributes: Attributes,
  pub valid_from: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct RetractBody {
  pub valid_from: Timestamp,
  #[serde(default)]
  pub valid_to:   Option<Timestamp>,
}

// ─── Insert ──────────────────────────────────────────────────────────────────

/// `POST /entities/{id}/versions`
pub async fn insert<S: VersionStore, C: Clock>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<String>,
  Json(body): Json<PeriodBody>,
) -> Result<Created, ApiError> {
  let revision = engine
    .insert(
      EntityId::new(id),
      body.attributes,
      body.valid_from,
      body.valid_to.into(),
    )
    .await?;
  Ok((StatusCode::CREATED, Json(revision)))
}

// ─── Correct ─────────────────────────────────────────────────────────────────

/// `POST /entities/{id}/corrections`
pub async fn correct<S: VersionStore, C: Clock>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<String>,
  Json(body): Json<PeriodBody>,
) -> Result<Created, ApiError> {
  let revision = engine
    .correct(
      EntityId::new(id),
      body.attributes,
      body.valid_from,
      body.valid_to.into(),
    )
    .await?;
  Ok((StatusCode::CREATED, Json(revision)))
}

// ─── Backdate ────────────────────────────────────────────────────────────────

/// `POST /entities/{id}/backdates`
pub async fn backdate<S: VersionStore, C: Clock>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<String>,
  Json(body): Json<BackdateBody>,
) -> Result<Created, ApiError> {
  let revision = engine
    .backdate(EntityId::new(id), body.attributes, body.valid_from)
    .await?;
  Ok((StatusCode::CREATED, Json(revision)))
}

// ─── Retract ─────────────────────────────────────────────────────────────────

/// `POST /entities/{id}/retractions`
pub async fn retract<S: VersionStore, C: Clock>(
  State(engine): State<Arc<Engine<S, C>>>,
  Path(id): Path<String>,
  Json(body): Json<RetractBody>,
) -> Result<Created, ApiError> {
  let revision = engine
    .retract(EntityId::new(id), body.valid_from, body.valid_to.into())
    .await?;
  Ok((StatusCode::CREATED, Json(revision)))
}
