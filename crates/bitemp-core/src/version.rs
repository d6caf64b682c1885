//! Versions, the unit of storage.
//!
//! A version is one attribute snapshot of an entity, stamped with the
//! real-world period it describes (valid time) and the period during which
//! the store believed it (transaction time). Once written, the only field
//! that ever changes is the end of its transaction interval, exactly once,
//! when a later revision supersedes it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interval::{Endpoint, Interval, Timestamp};

// ─── Entity ──────────────────────────────────────────────────────────────────

/// Opaque name of the real-world object being tracked, e.g. `employee-123`.
/// Entities carry no data of their own; everything lives on versions.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for EntityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for EntityId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for EntityId {
  fn from(s: String) -> Self { Self(s) }
}

/// The payload of a version. The store never looks inside it.
pub type Attributes = serde_json::Value;

// ─── Version ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
  pub version_id:  Uuid,
  pub entity_id:   EntityId,
  pub attributes:  Attributes,
  /// When the snapshot was true in the real world.
  pub valid:       Interval,
  /// When the store believed it. Unbounded while the version is current.
  pub transaction: Interval,
}

impl Version {
  /// A fresh current version recorded at `recorded_at`.
  pub fn record(
    entity_id: EntityId,
    attributes: Attributes,
    valid: Interval,
    recorded_at: Timestamp,
  ) -> Self {
    Self {
      version_id: Uuid::new_v4(),
      entity_id,
      attributes,
      valid,
      transaction: Interval::starting_at(recorded_at),
    }
  }

  pub fn valid_from(&self) -> Timestamp { self.valid.from() }

  pub fn valid_to(&self) -> Endpoint { self.valid.to() }

  pub fn transaction_from(&self) -> Timestamp { self.transaction.from() }

  pub fn transaction_to(&self) -> Endpoint { self.transaction.to() }

  /// Part of current knowledge: not yet superseded.
  pub fn is_current(&self) -> bool { self.transaction.is_unbounded() }

  /// The two-dimensional exclusion rule: two versions of one entity may not
  /// overlap in valid time and transaction time at once.
  pub fn conflicts_with(&self, other: &Self) -> bool {
    self.entity_id == other.entity_id
      && self.valid.overlaps(&other.valid)
      && self.transaction.overlaps(&other.transaction)
  }

  /// Sort key for histories: `(transaction_from, valid_from)`.
  pub fn history_key(&self) -> (Timestamp, Timestamp) {
    (self.transaction_from(), self.valid_from())
  }
}
