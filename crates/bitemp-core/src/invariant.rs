//! Enforcement of the bitemporal exclusion rule.
//!
//! A general-purpose stand-in for a database exclusion constraint: a linear
//! scan of the entity's versions, run by the backend inside its atomic unit
//! before anything is written.

use uuid::Uuid;

use crate::{
  Error, Result,
  store::{Batch, Write},
  version::Version,
};

/// Apply `batch` to `versions` in place, validating each write.
///
/// On error `versions` may be partially modified; callers run this on a
/// working copy and discard it on failure. Returns the ids of appended
/// versions.
pub fn apply(versions: &mut Vec<Version>, batch: &Batch) -> Result<Vec<Uuid>> {
  let mut appended = Vec::new();

  for write in &batch.writes {
    match write {
      Write::Close { version_id, at } => {
        let version = versions
          .iter_mut()
          .find(|v| v.version_id == *version_id)
          .ok_or(Error::NotFound(*version_id))?;
        if !version.is_current() {
          return Err(Error::AlreadyClosed(*version_id));
        }
        version.transaction = version.transaction.close_at(*at)?;
      }
      Write::Append(version) => {
        if version.entity_id != batch.entity_id {
          return Err(Error::EntityMismatch {
            expected: batch.entity_id.clone(),
            found:    version.entity_id.clone(),
          });
        }
        if let Some(existing) = versions.iter().find(|v| {
          v.version_id == version.version_id || v.conflicts_with(version)
        }) {
          return Err(Error::InvariantViolation {
            entity_id: batch.entity_id.clone(),
            existing:  existing.version_id,
            proposed:  version.version_id,
          });
        }
        appended.push(version.version_id);
        versions.push(version.clone());
      }
    }
  }

  Ok(appended)
}

/// The first pair of versions that breaks the exclusion rule, if any.
pub fn find_conflict(versions: &[Version]) -> Option<(&Version, &Version)> {
  versions.iter().enumerate().find_map(|(i, a)| {
    versions[i + 1..]
      .iter()
      .find(|b| a.conflicts_with(b))
      .map(|b| (a, b))
  })
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use serde_json::json;

  use super::*;
  use crate::{
    interval::{Interval, Timestamp},
    version::EntityId,
  };

  fn day(d: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
  }

  fn current(from: u32, to: Option<u32>, recorded: u32) -> Version {
    let valid = match to {
      Some(to) => Interval::bounded(day(from), day(to)).unwrap(),
      None => Interval::starting_at(day(from)),
    };
    Version::record(EntityId::from("e"), json!({}), valid, day(recorded))
  }

  #[test]
  fn rejects_overlapping_current_versions() {
    let mut versions = vec![current(1, None, 1)];
    let batch = Batch::new("e".into()).append(current(5, Some(9), 2));

    let err = apply(&mut versions, &batch).unwrap_err();
    assert!(matches!(err, Error::InvariantViolation { .. }));
  }

  #[test]
  fn close_then_append_is_accepted() {
    let old = current(1, None, 1);
    let mut versions = vec![old.clone()];
    let replacement = current(1, None, 2);
    let batch = Batch::new("e".into())
      .close(old.version_id, day(2))
      .append(replacement.clone());

    let ids = apply(&mut versions, &batch).unwrap();
    assert_eq!(ids, vec![replacement.version_id]);
    assert_eq!(versions.len(), 2);
    assert!(!versions[0].is_current());
    assert!(find_conflict(&versions).is_none());
  }

  #[test]
  fn closing_twice_is_an_error() {
    let old = current(1, None, 1);
    let mut versions = vec![old.clone()];
    let batch = Batch::new("e".into())
      .close(old.version_id, day(2))
      .close(old.version_id, day(3));

    let err = apply(&mut versions, &batch).unwrap_err();
    assert!(matches!(err, Error::AlreadyClosed(id) if id == old.version_id));
  }

  #[test]
  fn closing_at_or_before_recording_is_invalid() {
    let old = current(1, None, 5);
    let mut versions = vec![old.clone()];
    let batch = Batch::new("e".into()).close(old.version_id, day(5));

    let err = apply(&mut versions, &batch).unwrap_err();
    assert!(matches!(err, Error::InvalidInterval { .. }));
  }

  #[test]
  fn unknown_version_is_not_found() {
    let mut versions = Vec::new();
    let id = Uuid::new_v4();
    let batch = Batch::new("e".into()).close(id, day(2));
    assert!(matches!(
      apply(&mut versions, &batch),
      Err(Error::NotFound(missing)) if missing == id
    ));
  }

  #[test]
  fn foreign_entity_is_rejected() {
    let mut versions = Vec::new();
    let batch = Batch::new("other".into()).append(current(1, None, 1));
    assert!(matches!(
      apply(&mut versions, &batch),
      Err(Error::EntityMismatch { .. })
    ));
  }

  #[test]
  fn disjoint_transaction_time_may_share_valid_time() {
    let mut old = current(1, None, 1);
    old.transaction = old.transaction.close_at(day(3)).unwrap();
    let new = current(1, None, 3);
    assert!(find_conflict(&[old, new]).is_none());
  }
}
