//! Time source for response timing.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Source of high-resolution readings, measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Monotonic clock anchored at its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that replays scripted readings, for deterministic timing.
///
/// Once the script runs out the last reading repeats.
#[derive(Debug, Default)]
pub struct ManualClock {
    readings: Mutex<VecDeque<Duration>>,
    last: Mutex<Duration>,
}

impl ManualClock {
    /// Readings in seconds, e.g. `[1000.000, 1001.234]`.
    pub fn from_secs(readings: &[f64]) -> Self {
        Self {
            readings: Mutex::new(readings.iter().map(|s| Duration::from_secs_f64(*s)).collect()),
            last: Mutex::new(Duration::ZERO),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let mut last = self.last.lock();
        if let Some(next) = self.readings.lock().pop_front() {
            *last = next;
        }
        *last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_replays_then_holds() {
        let clock = ManualClock::from_secs(&[1.0, 2.5]);
        assert_eq!(clock.now(), Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_millis(2500));
        assert_eq!(clock.now(), Duration::from_millis(2500));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
