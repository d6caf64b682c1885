//! Error type for `bitemp-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A rejection from the version rules; passed through to callers as-is.
  #[error("core error: {0}")]
  Core(#[from] bitemp_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An instant whose text form would not sort correctly.
  #[error("instant {0} is outside the storable range (years 0000 to 9999)")]
  UnsupportedInstant(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for bitemp_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => bitemp_core::Error::storage(other),
    }
  }
}
