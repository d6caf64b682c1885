//! The `VersionStore` trait and the write batch it commits.
//!
//! The trait is implemented by storage backends ([`crate::memory::MemoryStore`]
//! here, `bitemp-store-sqlite` elsewhere). The engine depends on this
//! abstraction only.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error, Result,
  interval::Timestamp,
  version::{EntityId, Version},
};

// ─── Batch ───────────────────────────────────────────────────────────────────

/// A single change inside a [`Batch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
  /// End a current version's transaction interval at `at`.
  Close { version_id: Uuid, at: Timestamp },
  /// Add a new version.
  Append(Version),
}

/// Writes against one entity that must commit together or not at all.
///
/// Writes are applied in order; the engine always puts closes before
/// appends so the superseded versions no longer overlap the new ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
  pub entity_id: EntityId,
  pub writes:    Vec<Write>,
}

impl Batch {
  pub fn new(entity_id: EntityId) -> Self {
    Self { entity_id, writes: Vec::new() }
  }

  pub fn close(mut self, version_id: Uuid, at: Timestamp) -> Self {
    self.writes.push(Write::Close { version_id, at });
    self
  }

  pub fn append(mut self, version: Version) -> Self {
    self.writes.push(Write::Append(version));
    self
  }

  pub fn is_empty(&self) -> bool { self.writes.is_empty() }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over durable, append-only version storage.
///
/// Implementations must validate every batch against the entity's stored
/// versions with [`crate::invariant::apply`] inside the same atomic unit that
/// writes it, so that a conflicting batch leaves the store untouched even
/// when it was planned from a stale read.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait VersionStore: Send + Sync {
  /// Atomically validate and apply `batch`. Returns the ids of the appended
  /// versions in batch order.
  fn commit(
    &self,
    batch: Batch,
  ) -> impl Future<Output = Result<Vec<Uuid>>> + Send + '_;

  /// Every version of `entity_id`, ordered by
  /// `(transaction_from, valid_from)`, as of the call.
  fn versions_for<'a>(
    &'a self,
    entity_id: &'a EntityId,
  ) -> impl Future<Output = Result<Vec<Version>>> + Send + 'a;

  /// The entity a version belongs to, if it exists.
  fn locate(
    &self,
    version_id: Uuid,
  ) -> impl Future<Output = Result<Option<EntityId>>> + Send + '_;

  /// Every entity with at least one version, sorted.
  fn entities(&self) -> impl Future<Output = Result<Vec<EntityId>>> + Send + '_;

  // ── Single-write conveniences ─────────────────────────────────────────

  /// Append one version.
  fn append(
    &self,
    version: Version,
  ) -> impl Future<Output = Result<Uuid>> + Send + '_ {
    async move {
      let version_id = version.version_id;
      let batch = Batch::new(version.entity_id.clone()).append(version);
      self.commit(batch).await?;
      Ok(version_id)
    }
  }

  /// Close one current version at `at`.
  fn close_transaction(
    &self,
    version_id: Uuid,
    at: Timestamp,
  ) -> impl Future<Output = Result<()>> + Send + '_ {
    async move {
      let entity_id = self
        .locate(version_id)
        .await?
        .ok_or(Error::NotFound(version_id))?;
      self.commit(Batch::new(entity_id).close(version_id, at)).await?;
      Ok(())
    }
  }
}
