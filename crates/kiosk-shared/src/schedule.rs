//! Playlist scheduler — maps wall-clock time onto a looping playlist.
//!
//! Every kiosk running the same playlist computes the same entry and offset
//! for the same instant, because the reference point (seconds since local
//! midnight, see [`crate::clock`]) is shared.  No messaging is involved.
//!
//! ```text
//!   now ──► now mod total ──► walk entries ──► (entry_index, offset)
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("playlist has no entries")]
    Empty,

    #[error("entry {index} ({media_file}) has invalid duration {duration_secs}")]
    InvalidDuration {
        index: usize,
        media_file: String,
        duration_secs: f64,
    },
}

/// One media item of the screensaver loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub media_file: String,
    #[serde(rename = "durationSeconds")]
    pub duration_secs: f64,
}

impl PlaylistEntry {
    pub fn new(media_file: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            media_file: media_file.into(),
            duration_secs,
        }
    }
}

/// Where playback should be for a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackPosition {
    pub entry_index: usize,
    pub offset_secs: f64,
}

/// Ordered, immutable playlist.  The total cycle duration is always > 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
    total_secs: f64,
}

impl Playlist {
    pub fn new(entries: Vec<PlaylistEntry>) -> Result<Self, ScheduleError> {
        if entries.is_empty() {
            return Err(ScheduleError::Empty);
        }
        for (index, e) in entries.iter().enumerate() {
            if !e.duration_secs.is_finite() || e.duration_secs <= 0.0 {
                return Err(ScheduleError::InvalidDuration {
                    index,
                    media_file: e.media_file.clone(),
                    duration_secs: e.duration_secs,
                });
            }
        }
        let total_secs = entries.iter().map(|e| e.duration_secs).sum();
        Ok(Self {
            entries,
            total_secs,
        })
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PlaylistEntry> {
        self.entries.get(index)
    }

    /// Sum of all entry durations: the period of the loop.
    pub fn total_duration_secs(&self) -> f64 {
        self.total_secs
    }

    /// Cycle time at which entry `index` starts.
    pub fn start_of(&self, index: usize) -> f64 {
        self.entries
            .iter()
            .take(index)
            .map(|e| e.duration_secs)
            .sum()
    }

    /// Resolve the entry and in-entry offset for `now_secs` (seconds since the
    /// shared reference point).  Negative inputs wrap like positive ones.
    pub fn resolve(&self, now_secs: f64) -> PlaybackPosition {
        let cycle_position = now_secs.rem_euclid(self.total_secs);
        if !cycle_position.is_finite() {
            warn!(
                "schedule: non-finite cycle position for now={}, falling back to entry 0",
                now_secs
            );
            return PlaybackPosition::default();
        }

        let mut elapsed = 0.0;
        for (entry_index, entry) in self.entries.iter().enumerate() {
            let end = elapsed + entry.duration_secs;
            if end > cycle_position {
                return PlaybackPosition {
                    entry_index,
                    offset_secs: (cycle_position - elapsed).max(0.0),
                };
            }
            elapsed = end;
        }

        // rem_euclid can return a value equal to the total after rounding
        warn!(
            "schedule: cycle position {:.6}s walked off the playlist (total {:.6}s), falling back to entry 0",
            cycle_position, self.total_secs
        );
        PlaybackPosition::default()
    }
}

/// Signed drift: positive when playback is behind the wall clock.
pub fn check_drift(expected_offset_secs: f64, actual_offset_secs: f64) -> f64 {
    expected_offset_secs - actual_offset_secs
}

/// Soft-correction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftPolicy {
    /// Drift (absolute, seconds) below which nothing is done.
    pub threshold_secs: f64,
    /// Speed delta applied while correcting: 1±delta.
    pub rate_delta: f64,
    /// Upper bound for one correction window.
    pub max_window_secs: f64,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            threshold_secs: 0.2,
            rate_delta: 0.05,
            max_window_secs: 10.0,
        }
    }
}

/// Outcome of evaluating a drift sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    InSync,
    Adjust { rate: f64, window: Duration },
}

impl DriftPolicy {
    /// Threshold finite and non-negative, delta in (0, 1), window positive.
    pub fn is_valid(&self) -> bool {
        self.threshold_secs.is_finite()
            && self.threshold_secs >= 0.0
            && self.rate_delta.is_finite()
            && self.rate_delta > 0.0
            && self.rate_delta < 1.0
            && self.max_window_secs.is_finite()
            && self.max_window_secs > 0.0
    }

    /// Decide how to correct `drift_secs` (as returned by [`check_drift`]).
    ///
    /// At rate 1±delta playback gains/loses `delta` seconds per second, so the
    /// window needed to absorb the drift is `|drift| / delta`, capped.
    /// An invalid policy evaluates as the default one.
    pub fn evaluate(&self, drift_secs: f64) -> Correction {
        if !self.is_valid() {
            return DriftPolicy::default().evaluate(drift_secs);
        }
        if !drift_secs.is_finite() || drift_secs.abs() <= self.threshold_secs {
            return Correction::InSync;
        }
        let rate = if drift_secs > 0.0 {
            1.0 + self.rate_delta
        } else {
            1.0 - self.rate_delta
        };
        let window_secs = (drift_secs.abs() / self.rate_delta).clamp(0.0, self.max_window_secs);
        Correction::Adjust {
            rate,
            window: Duration::try_from_secs_f64(window_secs)
                .unwrap_or(Duration::from_secs_f64(DriftPolicy::default().max_window_secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Playlist {
        Playlist::new(vec![
            PlaylistEntry::new("a.mp4", 95.0),
            PlaylistEntry::new("b.mp4", 30.0),
            PlaylistEntry::new("c.mp4", 73.92),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_lands_in_second_entry() {
        let pos = sample().resolve(100.0);
        assert_eq!(pos.entry_index, 1);
        assert!((pos.offset_secs - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_entry_boundaries() {
        let p = sample();
        assert_eq!(p.resolve(0.0).entry_index, 0);
        assert_eq!(p.resolve(94.999).entry_index, 0);
        let at_b = p.resolve(95.0);
        assert_eq!(at_b.entry_index, 1);
        assert!(at_b.offset_secs.abs() < 1e-9);
        assert_eq!(p.resolve(125.0).entry_index, 2);
    }

    #[test]
    fn test_resolve_wraps_negative_time() {
        let p = sample();
        let total = p.total_duration_secs();
        let a = p.resolve(-10.0);
        let b = p.resolve(total - 10.0);
        assert_eq!(a.entry_index, b.entry_index);
        assert!((a.offset_secs - b.offset_secs).abs() < 1e-6);
    }

    #[test]
    fn test_total_and_start_of() {
        let p = sample();
        assert!((p.total_duration_secs() - 198.92).abs() < 1e-9);
        assert_eq!(p.start_of(0), 0.0);
        assert_eq!(p.start_of(2), 125.0);
    }

    #[test]
    fn test_rejects_empty_and_bad_durations() {
        assert_eq!(Playlist::new(vec![]), Err(ScheduleError::Empty));
        assert!(matches!(
            Playlist::new(vec![PlaylistEntry::new("x", 0.0)]),
            Err(ScheduleError::InvalidDuration { index: 0, .. })
        ));
        assert!(matches!(
            Playlist::new(vec![
                PlaylistEntry::new("x", 1.0),
                PlaylistEntry::new("y", f64::NAN)
            ]),
            Err(ScheduleError::InvalidDuration { index: 1, .. })
        ));
    }

    #[test]
    fn test_drift_example_catches_up() {
        let drift = check_drift(50.3, 50.0);
        assert!((drift - 0.3).abs() < 1e-9);
        match DriftPolicy::default().evaluate(drift) {
            Correction::Adjust { rate, window } => {
                assert_eq!(rate, 1.05);
                assert!((window.as_millis() as i64 - 6000).abs() <= 1);
            }
            other => panic!("expected adjustment, got {:?}", other),
        }
    }

    #[test]
    fn test_drift_slows_down_when_ahead() {
        match DriftPolicy::default().evaluate(-0.5) {
            Correction::Adjust { rate, window } => {
                assert_eq!(rate, 0.95);
                assert!((window.as_secs_f64() - 10.0).abs() < 1e-9);
            }
            other => panic!("expected adjustment, got {:?}", other),
        }
    }

    #[test]
    fn test_drift_window_is_capped() {
        match DriftPolicy::default().evaluate(3.0) {
            Correction::Adjust { window, .. } => assert_eq!(window, Duration::from_secs(10)),
            other => panic!("expected adjustment, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_policy_falls_back_to_default() {
        for policy in [
            DriftPolicy { rate_delta: -0.05, ..DriftPolicy::default() },
            DriftPolicy { rate_delta: 0.0, ..DriftPolicy::default() },
            DriftPolicy { rate_delta: f64::NAN, ..DriftPolicy::default() },
            DriftPolicy { max_window_secs: -10.0, ..DriftPolicy::default() },
            DriftPolicy { threshold_secs: f64::INFINITY, ..DriftPolicy::default() },
        ] {
            assert!(!policy.is_valid(), "{:?} should be rejected", policy);
            assert_eq!(policy.evaluate(0.3), DriftPolicy::default().evaluate(0.3));
        }
        assert!(DriftPolicy::default().is_valid());
    }

    #[test]
    fn test_small_drift_is_in_sync() {
        assert_eq!(DriftPolicy::default().evaluate(0.2), Correction::InSync);
        assert_eq!(DriftPolicy::default().evaluate(-0.1), Correction::InSync);
    }
}
