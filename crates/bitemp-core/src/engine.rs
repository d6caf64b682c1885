//! [`Engine`]: the mutation and query entry point.
//!
//! Every mutation follows the same path: take the entity's lock, read its
//! versions, stamp a transaction instant, plan the closes and appends, and
//! hand them to the store as one [`Batch`]. Nothing is written until that
//! single commit, so a mutation abandoned part-way leaves no trace.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
  Error, Result,
  clock::{Clock, SystemClock, tick},
  guard::EntityLocks,
  interval::{Endpoint, Interval, Timestamp},
  lifecycle::{AuditEntry, Revision},
  query,
  store::{Batch, VersionStore},
  version::{Attributes, EntityId, Version},
};

pub struct Engine<S, C = SystemClock> {
  store: Arc<S>,
  clock: C,
  locks: EntityLocks,
}

impl<S: VersionStore> Engine<S> {
  /// An engine stamping transactions with the system clock.
  pub fn new(store: Arc<S>) -> Self {
    Self::with_clock(store, SystemClock::new())
  }
}

impl<S: VersionStore, C: Clock> Engine<S, C> {
  pub fn with_clock(store: Arc<S>, clock: C) -> Self {
    Self { store, clock, locks: EntityLocks::new() }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn clock(&self) -> &C { &self.clock }

  // ── Mutations ─────────────────────────────────────────────────────────

  /// Record a genuinely new fact for `[valid_from, valid_to)`.
  ///
  /// Fails with [`Error::InvariantViolation`] if current knowledge already
  /// covers any part of that period.
  pub async fn insert(
    &self,
    entity_id: EntityId,
    attributes: Attributes,
    valid_from: Timestamp,
    valid_to: Endpoint,
  ) -> Result<Revision> {
    let valid = Interval::new(valid_from, valid_to)?;

    self
      .mutate(&entity_id, |versions, at| {
        let version =
          Version::record(entity_id.clone(), attributes, valid, at);
        if let Some(existing) = versions
          .iter()
          .find(|v| v.is_current() && v.valid.overlaps(&valid))
        {
          return Err(Error::InvariantViolation {
            entity_id: entity_id.clone(),
            existing:  existing.version_id,
            proposed:  version.version_id,
          });
        }
        Ok(Revision {
          at,
          superseded: Vec::new(),
          version: Some(version),
          carried: Vec::new(),
        })
      })
      .await
  }

  /// Replace what is believed about `[valid_from, valid_to)`.
  ///
  /// Every current version overlapping the period is superseded; any part
  /// of them outside the period is re-recorded unchanged.
  pub async fn correct(
    &self,
    entity_id: EntityId,
    attributes: Attributes,
    valid_from: Timestamp,
    valid_to: Endpoint,
  ) -> Result<Revision> {
    let valid = Interval::new(valid_from, valid_to)?;

    self
      .mutate(&entity_id, |versions, at| {
        let (superseded, carried) = supersede_period(versions, &valid, at);
        if superseded.is_empty() {
          return Err(Error::NoCurrentVersion(entity_id.clone()));
        }
        Ok(Revision {
          at,
          superseded,
          version: Some(Version::record(
            entity_id.clone(),
            attributes,
            valid,
            at,
          )),
          carried,
        })
      })
      .await
  }

  /// Record that a new open-ended fact began at `valid_from`, cutting short
  /// the current open-ended version.
  ///
  /// The old version keeps its prefix before `valid_from` as a fresh current
  /// copy. If `valid_from` is at or before the old version's start, it is
  /// superseded outright.
  pub async fn backdate(
    &self,
    entity_id: EntityId,
    attributes: Attributes,
    valid_from: Timestamp,
  ) -> Result<Revision> {
    let valid = Interval::starting_at(valid_from);

    self
      .mutate(&entity_id, |versions, at| {
        let open = versions
          .iter()
          .find(|v| v.is_current() && v.valid.is_unbounded())
          .ok_or_else(|| Error::NoCurrentVersion(entity_id.clone()))?;

        let carried = (open.valid_from() < valid_from)
          .then(|| open.valid.close_at(valid_from))
          .transpose()?
          .map(|prefix| {
            Version::record(
              entity_id.clone(),
              open.attributes.clone(),
              prefix,
              at,
            )
          })
          .into_iter()
          .collect();

        Ok(Revision {
          at,
          superseded: vec![open.version_id],
          version: Some(Version::record(
            entity_id.clone(),
            attributes,
            valid,
            at,
          )),
          carried,
        })
      })
      .await
  }

  /// Withdraw current knowledge about `[valid_from, valid_to)` without a
  /// replacement.
  pub async fn retract(
    &self,
    entity_id: EntityId,
    valid_from: Timestamp,
    valid_to: Endpoint,
  ) -> Result<Revision> {
    let valid = Interval::new(valid_from, valid_to)?;

    self
      .mutate(&entity_id, |versions, at| {
        let (superseded, carried) = supersede_period(versions, &valid, at);
        if superseded.is_empty() {
          return Err(Error::NoCurrentVersion(entity_id.clone()));
        }
        Ok(Revision { at, superseded, version: None, carried })
      })
      .await
  }

  async fn mutate<F>(&self, entity_id: &EntityId, plan: F) -> Result<Revision>
  where
    F: FnOnce(&[Version], Timestamp) -> Result<Revision>,
  {
    let _guard = self.locks.lock(entity_id).await;

    let versions = self.store.versions_for(entity_id).await?;
    let at = self.stamp(entity_id, &versions);
    let revision = plan(&versions, at)?;

    let mut batch = Batch::new(entity_id.clone());
    for version_id in &revision.superseded {
      batch = batch.close(*version_id, at);
    }
    for version in revision.carried.iter().chain(&revision.version) {
      batch = batch.append(version.clone());
    }
    self.store.commit(batch).await?;

    debug!(
      entity = %entity_id,
      at = %at,
      superseded = revision.superseded.len(),
      appended = revision.carried.len() + usize::from(revision.version.is_some()),
      "committed revision"
    );
    Ok(revision)
  }

  /// The transaction instant for the next mutation of an entity: the clock's
  /// reading, pushed past every instant already recorded for it.
  fn stamp(&self, entity_id: &EntityId, versions: &[Version]) -> Timestamp {
    let now = self.clock.now();
    let latest = versions
      .iter()
      .flat_map(|v| [Some(v.transaction_from()), v.transaction_to().finite()])
      .flatten()
      .max();

    match latest {
      Some(latest) if now <= latest => {
        warn!(
          entity = %entity_id,
          clock = %now,
          latest = %latest,
          "clock is not ahead of recorded transaction time; advancing"
        );
        latest + tick()
      }
      _ => now,
    }
  }

  // ── Queries ───────────────────────────────────────────────────────────

  /// The version true now according to current knowledge.
  pub async fn query_current(
    &self,
    entity_id: &EntityId,
  ) -> Result<Option<Version>> {
    self.query_as_valid_at(entity_id, self.clock.now()).await
  }

  pub async fn query_as_valid_at(
    &self,
    entity_id: &EntityId,
    t: Timestamp,
  ) -> Result<Option<Version>> {
    let versions = self.store.versions_for(entity_id).await?;
    Ok(query::as_valid_at(&versions, t).cloned())
  }

  pub async fn query_as_known_at(
    &self,
    entity_id: &EntityId,
    t: Timestamp,
    valid_point: Option<Timestamp>,
  ) -> Result<Vec<Version>> {
    let versions = self.store.versions_for(entity_id).await?;
    Ok(
      query::as_known_at(&versions, t, valid_point)
        .into_iter()
        .cloned()
        .collect(),
    )
  }

  pub async fn query_audit_trail(
    &self,
    entity_id: &EntityId,
  ) -> Result<Vec<AuditEntry>> {
    let versions = self.store.versions_for(entity_id).await?;
    Ok(query::audit_trail(&versions))
  }

  pub async fn entities(&self) -> Result<Vec<EntityId>> {
    self.store.entities().await
  }
}

/// Supersede every current version overlapping `period`, carrying over the
/// parts of each that fall outside it.
fn supersede_period(
  versions: &[Version],
  period: &Interval,
  at: Timestamp,
) -> (Vec<uuid::Uuid>, Vec<Version>) {
  let mut superseded = Vec::new();
  let mut carried = Vec::new();

  for v in versions
    .iter()
    .filter(|v| v.is_current() && v.valid.overlaps(period))
  {
    superseded.push(v.version_id);
    let (before, after) = v.valid.difference(period);
    for remainder in before.into_iter().chain(after) {
      carried.push(Version::record(
        v.entity_id.clone(),
        v.attributes.clone(),
        remainder,
        at,
      ));
    }
  }

  (superseded, carried)
}
