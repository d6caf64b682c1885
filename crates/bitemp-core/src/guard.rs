//! Per-entity serialisation of mutations.
//!
//! Each entity gets its own async mutex, created on first use and dropped
//! again once nobody holds or waits for it. Different entities never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::version::EntityId;

#[derive(Debug, Default)]
pub struct EntityLocks {
  locks: DashMap<EntityId, Arc<Mutex<()>>>,
}

impl EntityLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait for exclusive access to `entity_id`.
  ///
  /// Cancelling the returned future still releases the entity's entry: the
  /// guard exists before the wait begins and outlives the pending mutex
  /// handle, so its `Drop` runs the cleanup either way.
  pub async fn lock(&self, entity_id: &EntityId) -> EntityGuard<'_> {
    let mut held = EntityGuard {
      locks:     self,
      entity_id: entity_id.clone(),
      guard:     None,
    };
    // Clone the Arc out so the shard lock is released before awaiting.
    let mutex = self.locks.entry(entity_id.clone()).or_default().clone();
    held.guard = Some(mutex.lock_owned().await);
    held
  }

  /// Number of entities with a live lock entry.
  pub fn len(&self) -> usize { self.locks.len() }

  pub fn is_empty(&self) -> bool { self.locks.is_empty() }
}

/// Exclusive access to one entity until dropped.
#[derive(Debug)]
pub struct EntityGuard<'a> {
  locks:     &'a EntityLocks,
  entity_id: EntityId,
  guard:     Option<OwnedMutexGuard<()>>,
}

impl EntityGuard<'_> {
  pub fn entity_id(&self) -> &EntityId { &self.entity_id }
}

impl Drop for EntityGuard<'_> {
  fn drop(&mut self) {
    drop(self.guard.take());
    // Only the map itself still references the mutex: nobody is waiting.
    self
      .locks
      .locks
      .remove_if(&self.entity_id, |_, mutex| Arc::strong_count(mutex) == 1);
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn entries_are_removed_after_release() {
    let locks = EntityLocks::new();
    {
      let _a = locks.lock(&"a".into()).await;
      let _b = locks.lock(&"b".into()).await;
      assert_eq!(locks.len(), 2);
    }
    assert!(locks.is_empty());
  }

  #[tokio::test]
  async fn same_entity_waits() {
    let locks = Arc::new(EntityLocks::new());
    let held = locks.lock(&"a".into()).await;

    let waiter = {
      let locks = locks.clone();
      tokio::spawn(async move {
        let _g = locks.lock(&"a".into()).await;
      })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    drop(held);
    waiter.await.unwrap();
    assert!(locks.is_empty());
  }

  #[tokio::test]
  async fn abandoned_wait_does_not_leak_the_entry() {
    let locks = EntityLocks::new();
    let held = locks.lock(&"a".into()).await;

    let id: EntityId = "a".into();
    let mut waiting = Box::pin(locks.lock(&id));
    let timed_out =
      tokio::time::timeout(Duration::from_millis(20), waiting.as_mut()).await;
    assert!(timed_out.is_err());

    // The waiter still holds a handle, so releasing keeps the entry.
    drop(held);
    assert_eq!(locks.len(), 1);

    drop(waiting);
    assert!(locks.is_empty());
  }

  #[tokio::test]
  async fn different_entities_do_not_block() {
    let locks = EntityLocks::new();
    let _a = locks.lock(&"a".into()).await;
    let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(&"b".into()))
      .await;
    assert!(b.is_ok());
  }
}
