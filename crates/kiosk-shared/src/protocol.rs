use serde::{Deserialize, Serialize};

use crate::schedule::PlaybackPosition;

/// Lifecycle of the screensaver's media loading.
///
/// Transitions:
///   Idle -> Loading -> Playing -> Transitioning -> Loading ...
///   any  -> Loading (retry after a load error)
///   any  -> Idle    (deactivate / retries exhausted)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ScreensaverPhase {
    #[default]
    Idle,
    /// loadfile sent, waiting for mpv's file-loaded.
    Loading,
    Playing,
    /// Current entry ended; next entry resolved but not yet requested.
    Transitioning,
}

impl ScreensaverPhase {
    pub fn label(self) -> &'static str {
        match self {
            ScreensaverPhase::Idle => "idle",
            ScreensaverPhase::Loading => "loading",
            ScreensaverPhase::Playing => "playing",
            ScreensaverPhase::Transitioning => "transitioning",
        }
    }
}

/// Health of the mpv process as observed by the screensaver core.
///
/// Transitions:
///   Absent -> Starting -> Running -> Dead -> Restarting -> Starting ...
///   Running -> Degraded(reason) -> Running | Dead
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum MpvHealth {
    /// mpv process does not exist yet (before first activation).
    #[default]
    Absent,
    /// Process is spawning / socket not yet available.
    Starting,
    /// Socket connected, IPC responding normally.
    Running,
    /// Connected but IPC is slow / returning errors.
    Degraded(String),
    /// Process exited or socket closed.
    Dead,
    /// Restarting after death.
    Restarting,
}

impl MpvHealth {
    /// Short label for badges (≤5 chars).
    pub fn badge_label(&self) -> Option<&str> {
        match self {
            MpvHealth::Absent => None,
            MpvHealth::Starting => Some("INIT"),
            MpvHealth::Running => None,
            MpvHealth::Degraded(_) => Some("DEGD"),
            MpvHealth::Dead => Some("DEAD"),
            MpvHealth::Restarting => Some("REST"),
        }
    }

    /// True when mpv is in an error/non-running state the operator should notice.
    pub fn is_unhealthy(&self) -> bool {
        matches!(
            self,
            MpvHealth::Degraded(_) | MpvHealth::Dead | MpvHealth::Restarting
        )
    }
}

/// Published snapshot of the screensaver.  `rev` is a monotonically
/// increasing counter bumped on every change so the UI can skip redundant
/// redraws.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScreensaverState {
    #[serde(default)]
    pub rev: u64,
    /// True while the screensaver view is shown and playback is wanted.
    pub active: bool,
    pub phase: ScreensaverPhase,
    #[serde(default)]
    pub mpv_health: MpvHealth,
    pub current_entry: Option<usize>,
    pub current_media: Option<String>,
    /// Position the wall clock demanded at the last resolution pass.
    pub expected: Option<PlaybackPosition>,
    /// Signed drift measured at the last sync pass (expected - actual).
    pub last_drift_secs: Option<f64>,
    pub playback_rate: f64,
    /// Consecutive failed loads since the last successful one.
    pub retries: u32,
    /// Soft corrections issued since start-up.
    pub corrections: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_badges() {
        assert_eq!(MpvHealth::Running.badge_label(), None);
        assert_eq!(MpvHealth::Dead.badge_label(), Some("DEAD"));
        assert!(MpvHealth::Degraded("slow".into()).is_unhealthy());
        assert!(!MpvHealth::Starting.is_unhealthy());
    }

    #[test]
    fn test_state_roundtrips_as_json() {
        let state = ScreensaverState {
            rev: 3,
            phase: ScreensaverPhase::Playing,
            current_entry: Some(1),
            playback_rate: 1.05,
            ..Default::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: ScreensaverState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phase, ScreensaverPhase::Playing);
        assert_eq!(back.current_entry, Some(1));
    }
}
