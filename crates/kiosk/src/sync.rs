/// SyncEngine — pure playback state machine for the screensaver loop.
///
/// The engine never touches mpv or timers itself.  Every input is a
/// [`SyncEvent`] carrying at most one authoritative "now" sample; every
/// output is a list of [`SyncAction`]s the [`crate::core::ScreensaverCore`]
/// executes.  Timer actions are stamped with a generation so a timer armed
/// for an earlier load (or an earlier activation) is recognised as stale and
/// dropped when it fires.
///
/// ```text
///   Idle ──resolve──► Loading ──file-loaded──► Playing ──eof──► Transitioning
///    ▲                  │  ▲                                         │
///    │   retries spent  │  └──────────── load / retry ◄──────────────┘
///    └──────────────────┘
/// ```
use std::time::Duration;

use kiosk_shared::config::SyncConfig;
use kiosk_shared::protocol::ScreensaverPhase;
use kiosk_shared::schedule::{check_drift, Correction, DriftPolicy, PlaybackPosition, Playlist};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncEvent {
    /// Screensaver became visible.
    Activate { now: f64 },
    /// Screensaver hidden; stop playback and drop every pending timer.
    Deactivate,
    /// Periodic sync pass.  `actual` is mpv's time-pos, if it reported one.
    SyncTick { now: f64, actual: Option<f64> },
    FileLoaded { now: f64 },
    EndOfFile { now: f64 },
    LoadFailed,
    WatchdogFired { generation: u64 },
    RetryDue { generation: u64, now: f64 },
    RateRestoreDue { generation: u64 },
    /// mpv reported pause=true without us asking.
    Paused,
    /// mpv was respawned; whatever it had loaded is gone.
    PlayerRestarted { now: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    Load { entry_index: usize, media_file: String },
    Seek { offset_secs: f64 },
    Resume,
    SetSpeed { rate: f64, correction: bool },
    Stop,
    CancelTimers,
    ArmWatchdog { generation: u64, after: Duration },
    ScheduleRetry { generation: u64, after: Duration },
    ScheduleRateRestore { generation: u64, after: Duration },
}

pub struct SyncEngine {
    playlist: Playlist,
    policy: DriftPolicy,
    retry_delay: Duration,
    load_watchdog: Duration,
    max_load_retries: u32,

    active: bool,
    phase: ScreensaverPhase,
    loaded_entry: Option<usize>,
    load_in_flight: bool,
    /// The loaded entry was started at EOF before the clock reached it.
    advanced_early: bool,
    load_generation: u64,
    rate_generation: u64,
    correcting: bool,
    rate: f64,
    retries: u32,
    expected: Option<PlaybackPosition>,
    last_drift: Option<f64>,
}

impl SyncEngine {
    pub fn new(playlist: Playlist, config: &SyncConfig) -> Self {
        Self {
            playlist,
            policy: config.drift_policy(),
            retry_delay: config.retry_delay(),
            load_watchdog: config.load_watchdog(),
            max_load_retries: config.max_load_retries,
            active: false,
            phase: ScreensaverPhase::Idle,
            loaded_entry: None,
            load_in_flight: false,
            advanced_early: false,
            load_generation: 0,
            rate_generation: 0,
            correcting: false,
            rate: 1.0,
            retries: 0,
            expected: None,
            last_drift: None,
        }
    }

    pub fn phase(&self) -> ScreensaverPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn loaded_entry(&self) -> Option<usize> {
        self.loaded_entry
    }

    pub fn expected(&self) -> Option<PlaybackPosition> {
        self.expected
    }

    pub fn last_drift(&self) -> Option<f64> {
        self.last_drift
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn is_correcting(&self) -> bool {
        self.correcting
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn handle(&mut self, event: SyncEvent) -> Vec<SyncAction> {
        match event {
            SyncEvent::Activate { now } => self.activate(now),
            SyncEvent::Deactivate => self.deactivate(),
            SyncEvent::SyncTick { now, actual } => self.sync_tick(now, actual),
            SyncEvent::FileLoaded { now } => self.file_loaded(now),
            SyncEvent::EndOfFile { now } => self.end_of_file(now),
            SyncEvent::LoadFailed => self.load_failed(),
            SyncEvent::WatchdogFired { generation } => self.watchdog_fired(generation),
            SyncEvent::RetryDue { generation, now } => self.retry_due(generation, now),
            SyncEvent::RateRestoreDue { generation } => self.rate_restore_due(generation),
            SyncEvent::Paused => self.paused(),
            SyncEvent::PlayerRestarted { now } => self.player_restarted(now),
        }
    }

    fn activate(&mut self, now: f64) -> Vec<SyncAction> {
        if self.active {
            return Vec::new();
        }
        info!("sync: activate");
        self.active = true;
        self.retries = 0;
        self.resolve_and_load(now)
    }

    fn deactivate(&mut self) -> Vec<SyncAction> {
        if !self.active {
            return Vec::new();
        }
        info!("sync: deactivate");
        self.active = false;
        self.phase = ScreensaverPhase::Idle;
        self.loaded_entry = None;
        self.load_in_flight = false;
        self.expected = None;
        // Invalidate every timer armed so far.
        self.load_generation += 1;
        self.rate_generation += 1;

        let mut actions = vec![SyncAction::CancelTimers];
        if self.correcting || self.rate != 1.0 {
            actions.push(self.set_rate(1.0, false));
        }
        self.correcting = false;
        actions.push(SyncAction::Stop);
        actions
    }

    /// Resolve "now" and start loading the entry it names.  Suppressed while
    /// another load is in flight.
    fn resolve_and_load(&mut self, now: f64) -> Vec<SyncAction> {
        let position = self.playlist.resolve(now);
        self.load_position(position)
    }

    fn load_position(&mut self, position: PlaybackPosition) -> Vec<SyncAction> {
        if self.load_in_flight {
            debug!("sync: load already in flight, skipping");
            return Vec::new();
        }
        let Some(entry) = self.playlist.get(position.entry_index) else {
            return Vec::new();
        };
        let media_file = entry.media_file.clone();

        self.phase = ScreensaverPhase::Loading;
        self.loaded_entry = Some(position.entry_index);
        self.expected = Some(position);
        self.load_in_flight = true;
        self.advanced_early = false;
        self.load_generation += 1;

        info!(
            "sync: loading entry {} ({}) target offset {:.2}s",
            position.entry_index, media_file, position.offset_secs
        );

        let mut actions = Vec::new();
        // speed is a player-wide property and survives loadfile
        if self.correcting {
            self.correcting = false;
            self.rate_generation += 1;
            actions.push(self.set_rate(1.0, false));
        }
        actions.push(SyncAction::Load {
            entry_index: position.entry_index,
            media_file,
        });
        actions.push(SyncAction::ArmWatchdog {
            generation: self.load_generation,
            after: self.load_watchdog,
        });
        actions
    }

    fn file_loaded(&mut self, now: f64) -> Vec<SyncAction> {
        if !self.active || self.phase != ScreensaverPhase::Loading {
            debug!("sync: file-loaded ignored in phase {:?}", self.phase);
            return Vec::new();
        }
        self.load_in_flight = false;
        self.retries = 0;

        let position = self.playlist.resolve(now);
        if self.clock_still_behind(position) {
            debug!("sync: clock has not reached entry {:?} yet, starting at 0", self.loaded_entry);
            self.phase = ScreensaverPhase::Playing;
            return vec![SyncAction::Seek { offset_secs: 0.0 }, SyncAction::Resume];
        }
        self.advanced_early = false;
        if Some(position.entry_index) != self.loaded_entry {
            // Crossed an entry boundary while loading.
            info!(
                "sync: schedule moved to entry {} during load, reloading",
                position.entry_index
            );
            return self.load_position(position);
        }

        self.phase = ScreensaverPhase::Playing;
        self.expected = Some(position);
        vec![
            SyncAction::Seek {
                offset_secs: position.offset_secs,
            },
            SyncAction::Resume,
        ]
    }

    fn end_of_file(&mut self, now: f64) -> Vec<SyncAction> {
        if !self.active || self.phase != ScreensaverPhase::Playing {
            return Vec::new();
        }
        self.phase = ScreensaverPhase::Transitioning;

        let position = self.playlist.resolve(now);
        if Some(position.entry_index) != self.loaded_entry {
            return self.load_position(position);
        }
        // Playback ran ahead of the clock; move on rather than replaying the tail.
        let actions = self.load_position(PlaybackPosition {
            entry_index: (position.entry_index + 1) % self.playlist.len(),
            offset_secs: 0.0,
        });
        self.advanced_early = !actions.is_empty();
        actions
    }

    /// True while an early-advanced entry plays and the clock is still in
    /// the entry before it.
    fn clock_still_behind(&self, position: PlaybackPosition) -> bool {
        let Some(loaded) = self.loaded_entry else {
            return false;
        };
        let len = self.playlist.len();
        self.advanced_early && len > 1 && position.entry_index == (loaded + len - 1) % len
    }

    fn load_failed(&mut self) -> Vec<SyncAction> {
        if !self.active {
            return Vec::new();
        }
        self.load_in_flight = false;
        self.retries += 1;

        if self.retries > self.max_load_retries {
            warn!(
                "sync: {} consecutive load failures, waiting for the next sync pass",
                self.retries - 1
            );
            self.phase = ScreensaverPhase::Idle;
            self.loaded_entry = None;
            self.load_generation += 1;
            return vec![SyncAction::Stop];
        }

        warn!(
            "sync: media load failed (attempt {}), retrying in {:?}",
            self.retries, self.retry_delay
        );
        self.phase = ScreensaverPhase::Loading;
        self.load_generation += 1;
        vec![SyncAction::ScheduleRetry {
            generation: self.load_generation,
            after: self.retry_delay,
        }]
    }

    fn retry_due(&mut self, generation: u64, now: f64) -> Vec<SyncAction> {
        if !self.active || generation != self.load_generation || self.load_in_flight {
            return Vec::new();
        }
        self.resolve_and_load(now)
    }

    fn watchdog_fired(&mut self, generation: u64) -> Vec<SyncAction> {
        if generation != self.load_generation || !self.load_in_flight {
            return Vec::new();
        }
        warn!("sync: load watchdog fired, releasing loading state");
        self.load_in_flight = false;
        self.phase = ScreensaverPhase::Idle;
        self.loaded_entry = None;
        self.load_generation += 1;
        Vec::new()
    }

    fn sync_tick(&mut self, now: f64, actual: Option<f64>) -> Vec<SyncAction> {
        if !self.active {
            return Vec::new();
        }
        match self.phase {
            ScreensaverPhase::Idle => {
                self.retries = 0;
                self.resolve_and_load(now)
            }
            ScreensaverPhase::Loading | ScreensaverPhase::Transitioning => Vec::new(),
            ScreensaverPhase::Playing => {
                let position = self.playlist.resolve(now);
                if self.clock_still_behind(position) {
                    // Let the clock catch up instead of reloading the previous entry.
                    return Vec::new();
                }
                self.advanced_early = false;
                self.expected = Some(position);
                if Some(position.entry_index) != self.loaded_entry {
                    return self.load_position(position);
                }
                let Some(actual) = actual else {
                    return Vec::new();
                };
                let drift = check_drift(position.offset_secs, actual);
                self.last_drift = Some(drift);
                debug!(
                    "sync: expected {:.3}s actual {:.3}s drift {:+.3}s",
                    position.offset_secs, actual, drift
                );
                if self.correcting {
                    return Vec::new();
                }
                match self.policy.evaluate(drift) {
                    Correction::InSync => Vec::new(),
                    Correction::Adjust { rate, window } => {
                        info!(
                            "sync: drift {:+.3}s, rate {} for {}ms",
                            drift,
                            rate,
                            window.as_millis()
                        );
                        self.correcting = true;
                        self.rate_generation += 1;
                        vec![
                            self.set_rate(rate, true),
                            SyncAction::ScheduleRateRestore {
                                generation: self.rate_generation,
                                after: window,
                            },
                        ]
                    }
                }
            }
        }
    }

    fn rate_restore_due(&mut self, generation: u64) -> Vec<SyncAction> {
        if !self.correcting || generation != self.rate_generation {
            return Vec::new();
        }
        self.correcting = false;
        vec![self.set_rate(1.0, false)]
    }

    fn paused(&mut self) -> Vec<SyncAction> {
        if self.active && self.phase == ScreensaverPhase::Playing {
            info!("sync: unexpected pause, resuming");
            vec![SyncAction::Resume]
        } else {
            Vec::new()
        }
    }

    fn player_restarted(&mut self, now: f64) -> Vec<SyncAction> {
        self.phase = ScreensaverPhase::Idle;
        self.loaded_entry = None;
        self.load_in_flight = false;
        self.advanced_early = false;
        self.correcting = false;
        self.rate = 1.0;
        self.load_generation += 1;
        self.rate_generation += 1;
        if !self.active {
            return Vec::new();
        }
        self.resolve_and_load(now)
    }

    fn set_rate(&mut self, rate: f64, correction: bool) -> SyncAction {
        self.rate = rate;
        SyncAction::SetSpeed { rate, correction }
    }
}
