use crate::protocol::{MpvHealth, ScreensaverPhase, ScreensaverState};
use crate::schedule::PlaybackPosition;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Owner of the published [`ScreensaverState`] snapshot.  Only the
/// screensaver core writes; the UI reads clones.
pub struct StateManager {
    state: Arc<RwLock<ScreensaverState>>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        let state = ScreensaverState {
            rev: 1,
            playback_rate: 1.0,
            ..ScreensaverState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn arc(&self) -> Arc<RwLock<ScreensaverState>> {
        Arc::clone(&self.state)
    }

    pub async fn get_state(&self) -> ScreensaverState {
        self.state.read().await.clone()
    }

    pub async fn set_active(&self, active: bool) {
        let mut state = self.state.write().await;
        state.active = active;
        if !active {
            state.phase = ScreensaverPhase::Idle;
            state.current_entry = None;
            state.current_media = None;
            state.expected = None;
            state.playback_rate = 1.0;
        }
        state.rev += 1;
    }

    pub async fn set_phase(&self, phase: ScreensaverPhase) {
        let mut state = self.state.write().await;
        if state.phase == phase {
            return;
        }
        state.phase = phase;
        state.rev += 1;
    }

    pub async fn set_loading(&self, entry: usize, media: String, expected: PlaybackPosition) {
        let mut state = self.state.write().await;
        state.phase = ScreensaverPhase::Loading;
        state.current_entry = Some(entry);
        state.current_media = Some(media);
        state.expected = Some(expected);
        state.rev += 1;
    }

    pub async fn set_expected(&self, expected: PlaybackPosition) {
        let mut state = self.state.write().await;
        state.expected = Some(expected);
        state.rev += 1;
    }

    pub async fn record_drift(&self, drift_secs: f64) {
        let mut state = self.state.write().await;
        state.last_drift_secs = Some(drift_secs);
        state.rev += 1;
    }

    pub async fn set_playback_rate(&self, rate: f64, is_correction: bool) {
        let mut state = self.state.write().await;
        state.playback_rate = rate;
        if is_correction {
            state.corrections += 1;
        }
        state.rev += 1;
    }

    pub async fn set_retries(&self, retries: u32) {
        let mut state = self.state.write().await;
        if state.retries == retries {
            return;
        }
        state.retries = retries;
        state.rev += 1;
    }

    pub async fn set_mpv_health(&self, health: MpvHealth) {
        let mut state = self.state.write().await;
        if state.mpv_health == health {
            return;
        }
        state.mpv_health = health;
        state.rev += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rev_increments_on_change_only() {
        let sm = StateManager::new();
        let r0 = sm.get_state().await.rev;
        sm.set_phase(ScreensaverPhase::Loading).await;
        let r1 = sm.get_state().await.rev;
        assert!(r1 > r0);
        sm.set_phase(ScreensaverPhase::Loading).await;
        assert_eq!(sm.get_state().await.rev, r1);
    }

    #[tokio::test]
    async fn test_deactivate_clears_playback() {
        let sm = StateManager::new();
        sm.set_active(true).await;
        sm.set_loading(
            2,
            "c.mp4".into(),
            PlaybackPosition {
                entry_index: 2,
                offset_secs: 4.0,
            },
        )
        .await;
        sm.set_playback_rate(1.05, true).await;
        sm.set_active(false).await;
        let s = sm.get_state().await;
        assert_eq!(s.phase, ScreensaverPhase::Idle);
        assert_eq!(s.current_entry, None);
        assert_eq!(s.playback_rate, 1.0);
        assert_eq!(s.corrections, 1);
    }
}
