//! A time interface that can be replaced by a fake time implementation
//! during testing.
//!
//! Tasks only ever compare two readings of the same clock, so a reading is
//! a [`Timestamp`] relative to an arbitrary epoch chosen by the clock.

#![warn(missing_docs)]

use std::fmt::Debug;
use std::ops::Add;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

//------------ Timestamp ------------------------------------------------------

/// A reading of a [`Clock`], relative to the clock's epoch.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct Timestamp(Duration);

impl Timestamp {
    /// Creates a timestamp the given duration after the epoch.
    pub fn from_epoch(since: Duration) -> Self {
        Timestamp(since)
    }

    /// Returns the duration since the epoch.
    pub fn since_epoch(self) -> Duration {
        self.0
    }

    /// Returns the time elapsed between `earlier` and `self`.
    ///
    /// Returns zero if `earlier` is actually later.
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

//------------ Clock -----------------------------------------------------------

/// A source of monotonic time.
pub trait Clock: Debug + Send + Sync {
    /// Record the current time.
    fn now(&self) -> Timestamp;
}

//------------ SystemClock -----------------------------------------------------

/// Implementation of the [Clock] trait using the Instant type from
/// std::time.
///
/// The epoch is the moment the clock was created.
#[derive(Clone, Debug)]
pub struct SystemClock {
    /// When the clock was created.
    epoch: Instant,
}

impl SystemClock {
    /// Creates a new system clock.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.epoch.elapsed())
    }
}

//------------ FakeClock -----------------------------------------------------

/// Implementation of the [Clock] trait to fake the passing of time, for example
/// for testing.
///
/// Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct FakeClock {
    /// The current fake time.
    now: Arc<Mutex<Duration>>,
}

impl FakeClock {
    /// Creates a new fake clock standing at its epoch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjust the current time by adding a [Duration]
    pub fn adjust_time(&self, adjust: Duration) {
        let mut now = self.lock();
        *now = now.saturating_add(adjust);
    }

    /// Locks the current time, ignoring poisoning.
    fn lock(&self) -> std::sync::MutexGuard<'_, Duration> {
        match self.now.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Timestamp {
        Timestamp(*self.lock())
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fake_clock_is_shared_between_clones() {
        let clock = FakeClock::new();
        let other = clock.clone();
        let start = clock.now();
        other.adjust_time(Duration::from_secs(3));
        assert_eq!(clock.now().saturating_since(start), Duration::from_secs(3));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn timestamp_arithmetic_saturates() {
        let early = Timestamp::from_epoch(Duration::from_secs(1));
        let late = early + Duration::from_secs(4);
        assert_eq!(late.saturating_since(early), Duration::from_secs(4));
        assert_eq!(early.saturating_since(late), Duration::ZERO);
    }
}
