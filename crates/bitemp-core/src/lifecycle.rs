//! Derived status, audit entries, and the outcome of a mutation.
//!
//! None of these are stored. A version's status is read off the end of its
//! transaction interval at query time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  interval::{Endpoint, Timestamp},
  version::Version,
};

// ─── Computed status ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VersionStatus {
  Current,
  /// Closed in transaction time at `at`.
  Superseded { at: Timestamp },
}

impl VersionStatus {
  pub fn of(version: &Version) -> Self {
    match version.transaction_to() {
      Endpoint::Unbounded => Self::Current,
      Endpoint::Finite(at) => Self::Superseded { at },
    }
  }

  pub fn is_current(&self) -> bool { matches!(self, Self::Current) }
}

/// One row of an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
  pub version: Version,
  #[serde(flatten)]
  pub status:  VersionStatus,
}

impl From<Version> for AuditEntry {
  fn from(version: Version) -> Self {
    let status = VersionStatus::of(&version);
    Self { version, status }
  }
}

// ─── Revision ────────────────────────────────────────────────────────────────

/// Everything one mutation wrote, all stamped with the same transaction
/// instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
  /// The transaction instant shared by every write of the mutation.
  pub at:         Timestamp,
  /// Versions closed by this mutation.
  pub superseded: Vec<Uuid>,
  /// The new fact. `None` for a retraction.
  pub version:    Option<Version>,
  /// Re-recorded remainders of superseded versions outside the revised
  /// valid period.
  pub carried:    Vec<Version>,
}
