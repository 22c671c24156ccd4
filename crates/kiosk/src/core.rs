/// ScreensaverCore — single-owner event loop for attract-mode playback.
///
/// Runs as one task inside the kiosk process.  The UI, the periodic sync
/// ticker, the heartbeat, armed timers and the mpv reader all send
/// `CoreEvent` messages here.  The core owns the `SyncEngine`, the
/// `MpvDriver` and the live `MpvHandle` exclusively; nothing else touches
/// playback.
///
/// Each event is translated into a `SyncEvent` stamped with exactly one
/// clock sample, fed to the engine, and the resulting `SyncAction`s are
/// executed in order.  After every event the published `ScreensaverState`
/// is refreshed and a `BroadcastMessage::StateUpdated` is sent when its
/// revision moved.
///
/// Timers are plain tokio tasks racing a `CancellationToken`.  Deactivation
/// swaps the token, so everything armed for the previous activation dies
/// with it; generation numbers catch whatever fires in between.
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kiosk_shared::clock::SyncClock;
use kiosk_shared::config::{MpvConfig, SyncConfig};
use kiosk_shared::content::resolve_asset;
use kiosk_shared::protocol::MpvHealth;
use kiosk_shared::schedule::Playlist;
use kiosk_shared::state::StateManager;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle, OBS_PAUSE, OBS_SPEED};
use crate::sync::{SyncAction, SyncEngine, SyncEvent};
use crate::BroadcastMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Watchdog,
    Retry,
    RateRestore,
}

/// All inputs into the ScreensaverCore loop.
#[derive(Debug)]
pub enum CoreEvent {
    /// Screensaver view shown.
    Activate,
    /// Screensaver view left.
    Deactivate,
    /// Periodic drift check.
    SyncTick,
    /// Heartbeat — check process liveness.
    HeartbeatTick,
    /// Raw mpv unsolicited event (forwarded from reader task).
    Mpv(MpvEvent),
    Timer { kind: TimerKind, generation: u64 },
    Shutdown,
}

pub struct ScreensaverCore {
    sync_config: SyncConfig,
    engine: SyncEngine,
    clock: Arc<dyn SyncClock>,
    assets_dir: PathBuf,
    state_manager: Arc<StateManager>,
    mpv_driver: MpvDriver,
    /// Live handle to the mpv IO tasks.  `None` when mpv is not connected.
    mpv_handle: Option<MpvHandle>,
    event_tx: mpsc::Sender<CoreEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
    /// Parent of every task the core spawns; cancelled on shutdown.
    shutdown: CancellationToken,
    /// Parent of the currently armed timers; replaced on CancelTimers.
    timers: CancellationToken,
    mpv_health: MpvHealth,
}

impl ScreensaverCore {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        playlist: Playlist,
        sync_config: SyncConfig,
        mpv_config: MpvConfig,
        clock: Arc<dyn SyncClock>,
        assets_dir: PathBuf,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
        event_tx: mpsc::Sender<CoreEvent>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let timers = shutdown.child_token();
        Self {
            engine: SyncEngine::new(playlist, &sync_config),
            sync_config,
            clock,
            assets_dir,
            state_manager: Arc::new(StateManager::new()),
            mpv_driver: MpvDriver::new(mpv_config),
            mpv_handle: None,
            event_tx,
            broadcast_tx,
            shutdown,
            timers,
            mpv_health: MpvHealth::Absent,
        }
    }

    pub fn state_manager(&self) -> Arc<StateManager> {
        Arc::clone(&self.state_manager)
    }

    /// Run the core event loop.  Returns when a `Shutdown` event is received
    /// or the event channel is closed (UI exited).
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<CoreEvent>) -> anyhow::Result<()> {
        info!("ScreensaverCore: starting event loop");

        spawn_ticker(
            self.shutdown.clone(),
            self.event_tx.clone(),
            self.sync_config.heartbeat(),
            || CoreEvent::HeartbeatTick,
        );
        spawn_ticker(
            self.shutdown.clone(),
            self.event_tx.clone(),
            self.sync_config.interval(),
            || CoreEvent::SyncTick,
        );

        loop {
            match event_rx.recv().await {
                None => {
                    info!("ScreensaverCore: event channel closed, shutting down");
                    break;
                }
                Some(CoreEvent::Shutdown) => {
                    info!("ScreensaverCore: shutdown requested");
                    break;
                }
                Some(CoreEvent::Activate) => {
                    self.state_manager.set_active(true).await;
                    let now = self.clock.now_secs();
                    self.apply(SyncEvent::Activate { now }).await;
                }
                Some(CoreEvent::Deactivate) => {
                    self.apply(SyncEvent::Deactivate).await;
                    self.state_manager.set_active(false).await;
                }
                Some(CoreEvent::SyncTick) => self.sync_pass().await,
                Some(CoreEvent::HeartbeatTick) => self.heartbeat().await,
                Some(CoreEvent::Mpv(evt)) => self.handle_mpv_event(evt).await,
                Some(CoreEvent::Timer { kind, generation }) => {
                    let event = match kind {
                        TimerKind::Watchdog => SyncEvent::WatchdogFired { generation },
                        TimerKind::Retry => SyncEvent::RetryDue {
                            generation,
                            now: self.clock.now_secs(),
                        },
                        TimerKind::RateRestore => SyncEvent::RateRestoreDue { generation },
                    };
                    self.apply(event).await;
                }
            }
            self.publish().await;
        }

        self.cleanup().await;
        Ok(())
    }

    /// One periodic resolution pass.  mpv's position is read first and the
    /// clock sampled right after, so both describe the same instant.
    async fn sync_pass(&mut self) {
        if !self.engine.is_active() {
            return;
        }
        let actual = match (&self.mpv_handle, self.engine.phase()) {
            (Some(h), kiosk_shared::protocol::ScreensaverPhase::Playing) => {
                match h.time_pos().await {
                    Ok(pos) => pos,
                    Err(e) => {
                        debug!("ScreensaverCore: time-pos unavailable: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };
        let now = self.clock.now_secs();
        self.apply(SyncEvent::SyncTick { now, actual }).await;
    }

    async fn heartbeat(&mut self) {
        if self.mpv_handle.is_none() {
            return;
        }
        if !self.mpv_driver.process_alive() {
            warn!("ScreensaverCore: heartbeat: mpv process died");
            self.mpv_handle = None;
            self.set_mpv_health(MpvHealth::Dead).await;
            if self.engine.is_active() {
                self.set_mpv_health(MpvHealth::Restarting).await;
                let now = self.clock.now_secs();
                self.apply(SyncEvent::PlayerRestarted { now }).await;
            }
            return;
        }
        let ping = match &self.mpv_handle {
            Some(h) => h.ping().await,
            None => return,
        };
        match ping {
            Ok(()) => self.set_mpv_health(MpvHealth::Running).await,
            Err(e) => {
                self.set_mpv_health(MpvHealth::Degraded(e.to_string()))
                    .await
            }
        }
    }

    async fn handle_mpv_event(&mut self, evt: MpvEvent) {
        if evt.is_tap() {
            info!("ScreensaverCore: tap on video window");
            let _ = self.broadcast_tx.send(BroadcastMessage::ScreensaverTap);
            return;
        }

        if let Some((obs_id, data)) = evt.as_property_change() {
            match obs_id {
                OBS_PAUSE => {
                    if data.as_bool() == Some(true) {
                        self.apply(SyncEvent::Paused).await;
                    }
                }
                OBS_SPEED => debug!("mpv: speed → {}", data),
                _ => {}
            }
            return;
        }

        match evt.event_name() {
            Some("file-loaded") => {
                let now = self.clock.now_secs();
                self.apply(SyncEvent::FileLoaded { now }).await;
            }
            Some("end-file") => {
                let reason = evt.end_file_reason().unwrap_or("unknown");
                info!("mpv: end-file reason={}", reason);
                match reason {
                    "eof" => {
                        let now = self.clock.now_secs();
                        self.apply(SyncEvent::EndOfFile { now }).await;
                    }
                    "error" => {
                        let detail = evt
                            .raw
                            .get("file_error")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown");
                        warn!("mpv: media failed to load: {}", detail);
                        self.apply(SyncEvent::LoadFailed).await;
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    /// Feed one event to the engine and execute everything it asks for.
    /// Failures while executing become new engine events.
    async fn apply(&mut self, event: SyncEvent) {
        let mut queue: VecDeque<SyncAction> = self.engine.handle(event).into();
        while let Some(action) = queue.pop_front() {
            if let Err(e) = self.execute(&action).await {
                warn!("ScreensaverCore: {:?} failed: {}", action, e);
                if matches!(action, SyncAction::Load { .. }) {
                    queue.extend(self.engine.handle(SyncEvent::LoadFailed));
                }
            }
        }
    }

    async fn execute(&mut self, action: &SyncAction) -> anyhow::Result<()> {
        match action {
            SyncAction::Load {
                entry_index,
                media_file,
            } => {
                if let Some(expected) = self.engine.expected() {
                    self.state_manager
                        .set_loading(*entry_index, media_file.clone(), expected)
                        .await;
                }
                let handle = self
                    .ensure_mpv_handle()
                    .await
                    .ok_or_else(|| anyhow::anyhow!("no mpv handle"))?;
                let path = resolve_asset(&self.assets_dir, media_file);
                handle.load_media(&path.to_string_lossy()).await?;
            }
            SyncAction::Seek { offset_secs } => {
                if let Some(h) = &self.mpv_handle {
                    h.seek_absolute(*offset_secs).await?;
                }
            }
            SyncAction::Resume => {
                if let Some(h) = &self.mpv_handle {
                    h.set_pause(false).await?;
                }
            }
            SyncAction::SetSpeed { rate, correction } => {
                self.state_manager
                    .set_playback_rate(*rate, *correction)
                    .await;
                if let Some(h) = &self.mpv_handle {
                    h.set_speed(*rate).await?;
                }
            }
            SyncAction::Stop => {
                if let Some(h) = &self.mpv_handle {
                    h.stop().await?;
                }
            }
            SyncAction::CancelTimers => {
                self.timers.cancel();
                self.timers = self.shutdown.child_token();
            }
            SyncAction::ArmWatchdog { generation, after } => {
                self.arm(TimerKind::Watchdog, *generation, *after)
            }
            SyncAction::ScheduleRetry { generation, after } => {
                self.arm(TimerKind::Retry, *generation, *after)
            }
            SyncAction::ScheduleRateRestore { generation, after } => {
                self.arm(TimerKind::RateRestore, *generation, *after)
            }
        }
        Ok(())
    }

    fn arm(&self, kind: TimerKind, generation: u64, after: Duration) {
        debug!(
            "ScreensaverCore: arm {:?} gen={} in {:?}",
            kind, generation, after
        );
        arm_timer(
            self.timers.clone(),
            self.event_tx.clone(),
            kind,
            generation,
            after,
        );
    }

    /// Copy the engine's view into the published snapshot.
    async fn publish(&mut self) {
        let before = self.state_manager.get_state().await;
        self.state_manager.set_phase(self.engine.phase()).await;
        self.state_manager.set_retries(self.engine.retries()).await;
        if let Some(expected) = self.engine.expected() {
            if before.expected != Some(expected) {
                self.state_manager.set_expected(expected).await;
            }
        }
        if let Some(drift) = self.engine.last_drift() {
            if before.last_drift_secs != Some(drift) {
                self.state_manager.record_drift(drift).await;
            }
        }
        if self.state_manager.get_state().await.rev != before.rev {
            let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
        }
    }

    async fn set_mpv_health(&mut self, health: MpvHealth) {
        if self.mpv_health != health {
            info!(
                "ScreensaverCore: mpv health {:?} → {:?}",
                self.mpv_health, health
            );
            self.mpv_health = health.clone();
            self.state_manager.set_mpv_health(health).await;
            let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
        }
    }

    async fn ensure_mpv_handle(&mut self) -> Option<MpvHandle> {
        if self.mpv_handle.is_some() && !self.mpv_driver.process_alive() {
            warn!("ScreensaverCore: mpv process died, dropping handle");
            self.mpv_handle = None;
            self.set_mpv_health(MpvHealth::Dead).await;
        }

        if self.mpv_handle.is_none() {
            // One forwarder task per connection, feeding mpv events into our loop.
            let (event_tx, mut event_rx) = mpsc::channel::<MpvEvent>(64);
            let core_tx = self.event_tx.clone();
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        evt = event_rx.recv() => match evt {
                            Some(evt) => {
                                if core_tx.send(CoreEvent::Mpv(evt)).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
            });

            self.set_mpv_health(MpvHealth::Starting).await;
            let handle = match self.mpv_driver.spawn_and_connect(event_tx).await {
                Ok(h) => h,
                Err(e) => {
                    warn!("ScreensaverCore: failed to start mpv: {}", e);
                    self.set_mpv_health(MpvHealth::Dead).await;
                    return None;
                }
            };
            self.set_mpv_health(MpvHealth::Running).await;

            handle.observe_all_properties().await;
            handle.bind_tap().await;
            self.mpv_handle = Some(handle);
        }

        self.mpv_handle.clone()
    }

    async fn cleanup(&mut self) {
        info!("ScreensaverCore: cleaning up");
        self.timers.cancel();
        self.shutdown.cancel();
        if let Some(h) = self.mpv_handle.take() {
            let _ = h.stop().await;
            let _ = h.send(serde_json::json!(["quit"])).await;
        }
        self.mpv_driver.kill().await;
    }
}

/// Sleep for `after`, then deliver a timer event unless `token` is
/// cancelled first.
pub fn arm_timer(
    token: CancellationToken,
    tx: mpsc::Sender<CoreEvent>,
    kind: TimerKind,
    generation: u64,
    after: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(after) => {
                let _ = tx.send(CoreEvent::Timer { kind, generation }).await;
            }
        }
    })
}

fn spawn_ticker(
    token: CancellationToken,
    tx: mpsc::Sender<CoreEvent>,
    period: Duration,
    make: fn() -> CoreEvent,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    if tx.send(make()).await.is_err() {
                        break;
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        arm_timer(token, tx, TimerKind::Retry, 7, Duration::from_secs(2));

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        match rx.recv().await {
            Some(CoreEvent::Timer { kind, generation }) => {
                assert_eq!(kind, TimerKind::Retry);
                assert_eq!(generation, 7);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::channel(4);
        let parent = CancellationToken::new();
        let child = parent.child_token();
        let task = arm_timer(child, tx, TimerKind::RateRestore, 1, Duration::from_secs(6));

        parent.cancel();
        task.await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_on_shutdown() {
        let (tx, mut rx) = mpsc::channel(16);
        let token = CancellationToken::new();
        spawn_ticker(token.clone(), tx, Duration::from_secs(10), || {
            CoreEvent::SyncTick
        });

        tokio::time::sleep(Duration::from_secs(25)).await;
        let mut ticks = 0;
        while let Ok(CoreEvent::SyncTick) = rx.try_recv() {
            ticks += 1;
        }
        assert_eq!(ticks, 2);

        token.cancel();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }
}
