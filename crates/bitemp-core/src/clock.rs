//! Transaction-time clocks.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{TimeDelta, Timelike, Utc};

use crate::interval::Timestamp;

/// Supplies the instant stamped on `transaction_from` / `transaction_to`.
pub trait Clock: Send + Sync {
  fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
  fn now(&self) -> Timestamp { (**self).now() }
}

/// Smallest step between two transaction instants.
pub fn tick() -> TimeDelta { TimeDelta::microseconds(1) }

/// Drop sub-microsecond precision, the resolution of every clock here.
pub fn truncate(t: Timestamp) -> Timestamp {
  t.with_nanosecond(t.nanosecond() / 1_000 * 1_000).unwrap_or(t)
}

// ─── SystemClock ─────────────────────────────────────────────────────────────

/// Wall-clock time, strictly increasing within the process.
///
/// If the wall clock stalls or steps backwards, successive calls advance by
/// one [`tick`] from the last value handed out.
#[derive(Debug, Default)]
pub struct SystemClock {
  last: Mutex<Option<Timestamp>>,
}

impl SystemClock {
  pub fn new() -> Self { Self::default() }
}

impl Clock for SystemClock {
  fn now(&self) -> Timestamp {
    let wall = truncate(Utc::now());
    let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
    let next = match *last {
      Some(prev) if wall <= prev => prev + tick(),
      _ => wall,
    };
    *last = Some(next);
    next
  }
}

// ─── ManualClock ─────────────────────────────────────────────────────────────

/// A clock that only moves when told to. Used for deterministic tests and
/// for replaying a recorded history.
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<Timestamp>,
}

impl ManualClock {
  pub fn new(start: Timestamp) -> Self { Self { now: Mutex::new(truncate(start)) } }

  pub fn set(&self, t: Timestamp) {
    *self.now.lock().unwrap_or_else(PoisonError::into_inner) = truncate(t);
  }

  pub fn advance(&self, by: TimeDelta) {
    let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
    *now = truncate(*now + by);
  }
}

impl Clock for ManualClock {
  fn now(&self) -> Timestamp {
    *self.now.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn system_clock_never_repeats() {
    let clock = SystemClock::new();
    let mut prev = clock.now();
    for _ in 0..1_000 {
      let next = clock.now();
      assert!(next > prev);
      prev = next;
    }
  }

  #[test]
  fn system_clock_is_microsecond_aligned() {
    let t = SystemClock::new().now();
    assert_eq!(t.nanosecond() % 1_000, 0);
  }

  #[test]
  fn manual_clock_moves_on_request() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    assert_eq!(clock.now(), start);
    clock.advance(TimeDelta::days(1));
    assert_eq!(clock.now(), start + TimeDelta::days(1));
  }
}
