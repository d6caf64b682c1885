//! Half-open time intervals with an unbounded upper sentinel.
//!
//! Every interval in the store is `[from, to)`: `from` is inclusive, `to` is
//! exclusive and may be [`Endpoint::Unbounded`], which compares greater than
//! every finite instant. No arithmetic is ever performed on the sentinel; all
//! predicates are pure comparisons.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The instant type used for both valid and transaction time.
pub type Timestamp = DateTime<Utc>;

// ─── Endpoint ────────────────────────────────────────────────────────────────

/// The exclusive upper end of an interval.
///
/// Variant order matters: the derived `Ord` places `Unbounded` after every
/// `Finite` value. Serialises as the bare instant, or `null` when unbounded.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(untagged)]
pub enum Endpoint<T = Timestamp> {
  Finite(T),
  Unbounded,
}

impl<T: Copy> Endpoint<T> {
  pub fn finite(&self) -> Option<T> {
    match self {
      Self::Finite(t) => Some(*t),
      Self::Unbounded => None,
    }
  }

  pub fn is_unbounded(&self) -> bool { matches!(self, Self::Unbounded) }
}

/// `None` reads as unbounded.
impl<T> From<Option<T>> for Endpoint<T> {
  fn from(t: Option<T>) -> Self { t.map_or(Self::Unbounded, Self::Finite) }
}

impl<T: fmt::Display> fmt::Display for Endpoint<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Finite(t) => write!(f, "{t}"),
      Self::Unbounded => f.write_str("∞"),
    }
  }
}

// ─── Interval ────────────────────────────────────────────────────────────────

/// A non-empty half-open interval `[from, to)`.
///
/// The only way to obtain one is through a constructor that checks
/// `from < to`, including on deserialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
  try_from = "RawInterval<T>",
  bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Ord + Copy + fmt::Debug"
  )
)]
pub struct Interval<T = Timestamp> {
  from: T,
  to:   Endpoint<T>,
}

impl<T: Ord + Copy + fmt::Debug> Interval<T> {
  /// Fails with [`Error::InvalidInterval`] unless `from < to`.
  pub fn new(from: T, to: Endpoint<T>) -> Result<Self> {
    if Endpoint::Finite(from) >= to {
      return Err(Error::InvalidInterval {
        from: format!("{from:?}"),
        to:   match to {
          Endpoint::Finite(t) => format!("{t:?}"),
          Endpoint::Unbounded => "unbounded".to_owned(),
        },
      });
    }
    Ok(Self { from, to })
  }

  pub fn bounded(from: T, to: T) -> Result<Self> {
    Self::new(from, Endpoint::Finite(to))
  }

  /// `[from, ∞)`; always valid.
  pub fn starting_at(from: T) -> Self {
    Self { from, to: Endpoint::Unbounded }
  }

  pub fn from(&self) -> T { self.from }

  pub fn to(&self) -> Endpoint<T> { self.to }

  pub fn is_unbounded(&self) -> bool { self.to.is_unbounded() }

  /// True iff the two intervals share at least one instant.
  pub fn overlaps(&self, other: &Self) -> bool {
    Endpoint::Finite(self.from) < other.to
      && Endpoint::Finite(other.from) < self.to
  }

  /// True iff `from <= point < to`.
  pub fn contains(&self, point: T) -> bool {
    self.from <= point && Endpoint::Finite(point) < self.to
  }

  /// True iff every instant of `other` is inside `self`.
  pub fn covers(&self, other: &Self) -> bool {
    self.from <= other.from && other.to <= self.to
  }

  /// The same interval ending at `at` instead.
  pub fn close_at(&self, at: T) -> Result<Self> {
    Self::new(self.from, Endpoint::Finite(at))
  }

  /// The parts of `self` that lie before and after `other`.
  ///
  /// Either side is `None` when `other` reaches past that end of `self`.
  /// Intended for overlapping intervals; for disjoint ones the whole of
  /// `self` comes back on one side.
  pub fn difference(&self, other: &Self) -> (Option<Self>, Option<Self>) {
    let before = (self.from < other.from).then(|| Self {
      from: self.from,
      to:   self.to.min(Endpoint::Finite(other.from)),
    });

    let after = match other.to {
      Endpoint::Finite(end) if Endpoint::Finite(end) < self.to => Some(Self {
        from: self.from.max(end),
        to:   self.to,
      }),
      _ => None,
    };

    (before, after)
  }
}

impl<T: fmt::Display> fmt::Display for Interval<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}, {})", self.from, self.to)
  }
}

/// Unchecked wire shape of [`Interval`].
#[derive(Deserialize)]
struct RawInterval<T> {
  from: T,
  to:   Endpoint<T>,
}

impl<T: Ord + Copy + fmt::Debug> TryFrom<RawInterval<T>> for Interval<T> {
  type Error = Error;

  fn try_from(raw: RawInterval<T>) -> Result<Self> {
    Self::new(raw.from, raw.to)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn iv(from: i64, to: Option<i64>) -> Interval<i64> {
    Interval::new(from, to.into()).unwrap()
  }

  #[test]
  fn rejects_empty_and_inverted() {
    assert!(matches!(
      Interval::bounded(5, 5),
      Err(Error::InvalidInterval { .. })
    ));
    assert!(matches!(
      Interval::bounded(6, 5),
      Err(Error::InvalidInterval { .. })
    ));
    assert!(Interval::new(i64::MAX, Endpoint::Unbounded).is_ok());
  }

  #[test]
  fn unbounded_sorts_after_every_finite() {
    assert!(Endpoint::Finite(i64::MAX) < Endpoint::Unbounded);
  }

  #[test]
  fn overlap_is_half_open() {
    assert!(!iv(0, Some(10)).overlaps(&iv(10, Some(20))));
    assert!(iv(0, Some(11)).overlaps(&iv(10, Some(20))));
    assert!(iv(0, None).overlaps(&iv(i64::MAX - 1, None)));
    assert!(iv(5, None).overlaps(&iv(0, Some(6))));
    assert!(!iv(5, None).overlaps(&iv(0, Some(5))));
  }

  #[test]
  fn contains_excludes_upper_end() {
    let i = iv(0, Some(10));
    assert!(i.contains(0));
    assert!(i.contains(9));
    assert!(!i.contains(10));
    assert!(!i.contains(-1));
    assert!(iv(0, None).contains(i64::MAX));
  }

  #[test]
  fn difference_splits_around_the_hole() {
    let (before, after) = iv(0, None).difference(&iv(10, Some(20)));
    assert_eq!(before, Some(iv(0, Some(10))));
    assert_eq!(after, Some(iv(20, None)));

    let (before, after) = iv(10, Some(20)).difference(&iv(0, None));
    assert_eq!(before, None);
    assert_eq!(after, None);

    let (before, after) = iv(0, Some(20)).difference(&iv(10, None));
    assert_eq!(before, Some(iv(0, Some(10))));
    assert_eq!(after, None);
  }

  #[test]
  fn close_at_rejects_instant_at_start() {
    assert!(iv(5, None).close_at(5).is_err());
    assert_eq!(iv(5, None).close_at(6).unwrap(), iv(5, Some(6)));
  }

  #[test]
  fn serde_uses_null_for_unbounded_and_revalidates() {
    let json = serde_json::to_value(iv(1, None)).unwrap();
    assert_eq!(json, serde_json::json!({ "from": 1, "to": null }));

    let back: Interval<i64> = serde_json::from_value(json).unwrap();
    assert_eq!(back, iv(1, None));

    let bad = serde_json::from_value::<Interval<i64>>(
      serde_json::json!({ "from": 3, "to": 1 }),
    );
    assert!(bad.is_err());
  }
}
