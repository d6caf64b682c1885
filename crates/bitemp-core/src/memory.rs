//! [`MemoryStore`]: an in-process [`VersionStore`].
//!
//! Each entity's version list lives in its own [`DashMap`] entry. A commit
//! validates a working copy while holding that entry's shard lock and swaps
//! it in, so readers observe either the whole batch or none of it.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::{
  Result, invariant,
  store::{Batch, VersionStore},
  version::{EntityId, Version},
};

/// Cloning is cheap; clones share the same maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
  entities: DashMap<EntityId, Vec<Version>>,
  /// version_id → owning entity, for [`VersionStore::locate`].
  index:    DashMap<Uuid, EntityId>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Total number of versions across all entities.
  pub fn len(&self) -> usize { self.inner.index.len() }

  pub fn is_empty(&self) -> bool { self.inner.index.is_empty() }
}

impl VersionStore for MemoryStore {
  async fn commit(&self, batch: Batch) -> Result<Vec<Uuid>> {
    let mut entry = self
      .inner
      .entities
      .entry(batch.entity_id.clone())
      .or_default();

    let mut staged = entry.clone();
    let appended = invariant::apply(&mut staged, &batch)?;

    for id in &appended {
      self.inner.index.insert(*id, batch.entity_id.clone());
    }
    *entry = staged;

    Ok(appended)
  }

  async fn versions_for(&self, entity_id: &EntityId) -> Result<Vec<Version>> {
    let mut versions = self
      .inner
      .entities
      .get(entity_id)
      .map(|entry| entry.clone())
      .unwrap_or_default();
    versions.sort_by_key(Version::history_key);
    Ok(versions)
  }

  async fn locate(&self, version_id: Uuid) -> Result<Option<EntityId>> {
    Ok(self.inner.index.get(&version_id).map(|e| e.clone()))
  }

  async fn entities(&self) -> Result<Vec<EntityId>> {
    let mut ids: Vec<EntityId> = self
      .inner
      .entities
      .iter()
      .filter(|entry| !entry.is_empty())
      .map(|entry| entry.key().clone())
      .collect();
    ids.sort();
    Ok(ids)
  }
}
