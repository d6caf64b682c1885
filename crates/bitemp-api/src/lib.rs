//! JSON REST API for the bitemporal store.
//!
//! Exposes an axum [`Router`] over an [`Engine`] backed by any
//! [`VersionStore`]. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", bitemp_api::api_router(engine.clone()))
//! ```

pub mod error;
pub mod mutations;
pub mod queries;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use bitemp_core::{Engine, clock::Clock, store::VersionStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(engine: Arc<Engine<S, C>>) -> Router<()>
where
  S: VersionStore + 'static,
  C: Clock + 'static,
{
  Router::new()
    .route("/entities", get(queries::entities::<S, C>))
    // Mutations
    .route("/entities/{id}/versions", post(mutations::insert::<S, C>))
    .route("/entities/{id}/corrections", post(mutations::correct::<S, C>))
    .route("/entities/{id}/backdates", post(mutations::backdate::<S, C>))
    .route("/entities/{id}/retractions", post(mutations::retract::<S, C>))
    // Queries
    .route("/entities/{id}/current", get(queries::current::<S, C>))
    .route("/entities/{id}/valid-at", get(queries::valid_at::<S, C>))
    .route("/entities/{id}/known-at", get(queries::known_at::<S, C>))
    .route("/entities/{id}/audit", get(queries::audit::<S, C>))
    .with_state(engine)
}
