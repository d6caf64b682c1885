//! HTTP server wiring for the bitemporal store.
//!
//! The binary in `main.rs` reads a [`ServerConfig`], opens a SQLite store,
//! and serves [`router`] over it.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use bitemp_core::{Engine, clock::Clock, store::VersionStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `BITEMP_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl ServerConfig {
  pub const DEFAULT_HOST: &str = "127.0.0.1";
  pub const DEFAULT_PORT: u16 = 5280;
  pub const DEFAULT_STORE_PATH: &str = "~/.local/share/bitemp/versions.db";

  /// `host:port`, ready for binding.
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API under `/api`, with request tracing.
pub fn router<S, C>(engine: Arc<Engine<S, C>>) -> Router
where
  S: VersionStore + 'static,
  C: Clock + 'static,
{
  Router::new()
    .nest("/api", bitemp_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use bitemp_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = router(Arc::new(Engine::new(Arc::new(store))));

    let resp = app
      .clone()
      .oneshot(Request::get("/api/entities").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    assert_eq!(
      serde_json::from_slice::<serde_json::Value>(&bytes).unwrap(),
      serde_json::json!([])
    );

    let resp = app
      .oneshot(Request::get("/entities").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/data/v.db")),
      PathBuf::from(home).join("data/v.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs/v.db")), PathBuf::from("/abs/v.db"));
  }

  #[test]
  fn address_joins_host_and_port() {
    let cfg = ServerConfig {
      host:       "0.0.0.0".into(),
      port:       8080,
      store_path: PathBuf::from(":memory:"),
    };
    assert_eq!(cfg.address(), "0.0.0.0:8080");
  }
}
