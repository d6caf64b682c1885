//! The four temporal read modes, as pure functions over a version snapshot.
//!
//! Nothing here touches the store. [`crate::engine::Engine`] fetches the
//! snapshot and hands it over.

use crate::{interval::Timestamp, lifecycle::AuditEntry, version::Version};

/// What current knowledge says was true at real-world instant `t`.
///
/// At most one version can match while the exclusion rule holds.
pub fn as_valid_at(versions: &[Version], t: Timestamp) -> Option<&Version> {
  versions
    .iter()
    .find(|v| v.is_current() && v.valid.contains(t))
}

/// What the store believed as of transaction instant `t`.
///
/// With a `valid_point`, only the belief about that real-world instant is
/// kept; without one, the whole timeline believed at `t` comes back, ordered
/// by `valid_from`.
pub fn as_known_at(
  versions: &[Version],
  t: Timestamp,
  valid_point: Option<Timestamp>,
) -> Vec<&Version> {
  let mut believed: Vec<&Version> = versions
    .iter()
    .filter(|v| v.transaction.contains(t))
    .filter(|v| valid_point.is_none_or(|p| v.valid.contains(p)))
    .collect();
  believed.sort_by_key(|v| v.valid_from());
  believed
}

/// Every version, oldest recording first, with its derived status.
pub fn audit_trail(versions: &[Version]) -> Vec<AuditEntry> {
  let mut trail: Vec<AuditEntry> =
    versions.iter().cloned().map(AuditEntry::from).collect();
  trail.sort_by_key(|entry| entry.version.history_key());
  trail
}
