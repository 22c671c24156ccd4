//! Time sources for the playlist scheduler.

use chrono::{Local, NaiveTime, Timelike};

/// Produces the scheduler's "now": seconds since the shared reference point.
///
/// Implementations must return one consistent sample per call; callers sample
/// once per resolution pass and reuse the value.
pub trait SyncClock: Send + Sync {
    fn now_secs(&self) -> f64;
}

/// Seconds since local midnight, shifted by the content's sync offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMidnightClock {
    pub offset_secs: f64,
}

impl LocalMidnightClock {
    pub fn new(offset_secs: f64) -> Self {
        Self { offset_secs }
    }
}

impl SyncClock for LocalMidnightClock {
    fn now_secs(&self) -> f64 {
        seconds_since_midnight(Local::now().time()) + self.offset_secs
    }
}

pub fn seconds_since_midnight(t: NaiveTime) -> f64 {
    t.num_seconds_from_midnight() as f64 + f64::from(t.nanosecond() % 1_000_000_000) / 1e9
}

/// Fixed instant, for tests and the `check` subcommand.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub f64);

impl SyncClock for FixedClock {
    fn now_secs(&self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_since_midnight() {
        let t = NaiveTime::from_hms_milli_opt(1, 2, 3, 500).unwrap();
        assert!((seconds_since_midnight(t) - 3723.5).abs() < 1e-9);
    }

    #[test]
    fn test_local_clock_stays_within_a_day_plus_offset() {
        let now = LocalMidnightClock::new(-30.0).now_secs();
        assert!((-30.0..86_400.0).contains(&now));
    }
}
