use jiff::{SignedDuration, Timestamp};
use std::sync::{Arc, Mutex};

/// An injectable time source.
///
/// Services never call `Timestamp::now()` directly; expiry decisions go
/// through a `Clock` so tests can control time deterministically.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time of the clock.
    fn now(&self) -> Timestamp;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to. Intended for tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            inner: Arc::new(Mutex::new(now)),
        }
    }

    /// Moves the clock forward by the given duration.
    pub fn advance(&self, by: SignedDuration) {
        let mut now = self
            .inner
            .lock()
            .expect("manual clock lock should not be poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self
            .inner
            .lock()
            .expect("manual clock lock should not be poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_the_given_time() {
        let base = Timestamp::from_second(1_000).unwrap();
        let clock = ManualClock::new(base);
        assert_eq!(clock.now(), base);
    }

    #[test]
    fn manual_clock_advances() {
        let base = Timestamp::from_second(1_000).unwrap();
        let clock = ManualClock::new(base);
        clock.advance(SignedDuration::from_secs(90));
        assert_eq!(clock.now(), base + SignedDuration::from_secs(90));
    }
}
