//! Error types for `bitemp-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::version::EntityId;

#[derive(Debug, Error)]
pub enum Error {
  /// An interval whose start is not strictly before its end.
  #[error("invalid interval: {from} is not before {to}")]
  InvalidInterval { from: String, to: String },

  /// A proposed version overlaps an existing one in both valid and
  /// transaction time.
  #[error(
    "version {proposed} for {entity_id} overlaps version {existing} in both \
     valid and transaction time"
  )]
  InvariantViolation {
    entity_id: EntityId,
    existing:  Uuid,
    proposed:  Uuid,
  },

  #[error("no current version of {0} covers the requested valid period")]
  NoCurrentVersion(EntityId),

  #[error("version {0} is already closed in transaction time")]
  AlreadyClosed(Uuid),

  #[error("version not found: {0}")]
  NotFound(Uuid),

  /// A batch write names an entity other than the one the batch is for.
  #[error("batch for {expected} contains a write for {found}")]
  EntityMismatch { expected: EntityId, found: EntityId },

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a backend failure.
  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }

  /// Whether the caller can fix this error by changing its inputs. Everything
  /// else is either a storage failure or a consistency bug.
  pub fn is_recoverable(&self) -> bool {
    matches!(
      self,
      Self::InvalidInterval { .. }
        | Self::InvariantViolation { .. }
        | Self::NoCurrentVersion(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
