//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with nanosecond
//! precision, so that string order is time order. That only holds for
//! four-digit years, so instants outside 0000..=9999 are refused on write.
//! Unbounded endpoints are NULL. UUIDs are hyphenated lowercase strings;
//! attributes are compact JSON.

use bitemp_core::{
  interval::{Endpoint, Interval, Timestamp},
  version::{EntityId, Version},
};
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamp ───────────────────────────────────────────────────────────────

pub fn encode_dt(dt: Timestamp) -> Result<String> {
  if !(0..=9999).contains(&dt.year()) {
    return Err(Error::UnsupportedInstant(dt.to_string()));
  }
  Ok(dt.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

pub fn decode_dt(s: &str) -> Result<Timestamp> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_endpoint(end: Endpoint) -> Result<Option<String>> {
  end.finite().map(encode_dt).transpose()
}

pub fn decode_endpoint(s: Option<&str>) -> Result<Endpoint> {
  Ok(match s {
    Some(s) => Endpoint::Finite(decode_dt(s)?),
    None => Endpoint::Unbounded,
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawVersion::from_row`].
pub const VERSION_COLUMNS: &str = "version_id, entity_id, attributes, \
                                   valid_from, valid_to, \
                                   transaction_from, transaction_to";

/// Raw strings read directly from a `versions` row.
pub struct RawVersion {
  pub version_id:       String,
  pub entity_id:        String,
  pub attributes:       String,
  pub valid_from:       String,
  pub valid_to:         Option<String>,
  pub transaction_from: String,
  pub transaction_to:   Option<String>,
}

impl RawVersion {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      version_id:       row.get(0)?,
      entity_id:        row.get(1)?,
      attributes:       row.get(2)?,
      valid_from:       row.get(3)?,
      valid_to:         row.get(4)?,
      transaction_from: row.get(5)?,
      transaction_to:   row.get(6)?,
    })
  }

  pub fn into_version(self) -> Result<Version> {
    let valid = Interval::new(
      decode_dt(&self.valid_from)?,
      decode_endpoint(self.valid_to.as_deref())?,
    )?;
    let transaction = Interval::new(
      decode_dt(&self.transaction_from)?,
      decode_endpoint(self.transaction_to.as_deref())?,
    )?;

    Ok(Version {
      version_id: decode_uuid(&self.version_id)?,
      entity_id: EntityId::new(self.entity_id),
      attributes: serde_json::from_str(&self.attributes)?,
      valid,
      transaction,
    })
  }
}

/// Column values for inserting a [`Version`].
pub struct EncodedVersion {
  pub version_id:       String,
  pub entity_id:        String,
  pub attributes:       String,
  pub valid_from:       String,
  pub valid_to:         Option<String>,
  pub transaction_from: String,
  pub transaction_to:   Option<String>,
}

impl EncodedVersion {
  pub fn new(v: &Version) -> Result<Self> {
    Ok(Self {
      version_id:       encode_uuid(v.version_id),
      entity_id:        v.entity_id.as_str().to_owned(),
      attributes:       serde_json::to_string(&v.attributes)?,
      valid_from:       encode_dt(v.valid_from())?,
      valid_to:         encode_endpoint(v.valid_to())?,
      transaction_from: encode_dt(v.transaction_from())?,
      transaction_to:   encode_endpoint(v.transaction_to())?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_as_strings() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::TimeDelta::nanoseconds(1);
    let c = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();
    let (a, b, c) = (encode_dt(a).unwrap(), encode_dt(b).unwrap(), encode_dt(c).unwrap());
    assert!(a < b);
    assert!(b < c);
    assert_eq!(a.len(), b.len());
  }

  #[test]
  fn nanosecond_timestamps_survive_encoding() {
    let t = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
      + chrono::TimeDelta::nanoseconds(123_456_789);
    assert_eq!(decode_dt(&encode_dt(t).unwrap()).unwrap(), t);
  }

  #[test]
  fn five_digit_years_are_refused() {
    let far = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();
    assert!(matches!(encode_dt(far), Err(Error::UnsupportedInstant(_))));

    let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
    assert!(encode_dt(last).is_ok());
  }

  #[test]
  fn unbounded_is_null() {
    assert_eq!(encode_endpoint(Endpoint::Unbounded).unwrap(), None);
    assert_eq!(decode_endpoint(None).unwrap(), Endpoint::Unbounded);
  }

  #[test]
  fn garbage_dates_are_reported() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
