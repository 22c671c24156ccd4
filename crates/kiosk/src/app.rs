//! App — component-based event loop for the kiosk.
//!
//! Architecture:
//! - `App` owns all screens and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks.
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Screensaver activation flows out to the core through `core_tx`.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Frame, Terminal};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace, warn};

use kiosk_shared::config::Config;
use kiosk_shared::content::Content;
use kiosk_shared::protocol::{MpvHealth, ScreensaverState};
use kiosk_shared::state::StateManager;

use crate::core::CoreEvent;
use crate::BroadcastMessage;

use crate::{
    action::Action,
    app_state::AppState,
    assets::{self, PreflightReport},
    component::Component,
    components::{
        dashboards::Dashboards, debug_overlay::DebugOverlay, main_menu::MainMenu,
        presentation::Presentation, screensaver::Screensaver,
    },
    idle::{parse_reset_kinds, IdleController, InputKind},
    router::{RouteEvent, Router, Transition, View},
    widgets::toast::{Severity, ToastManager},
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    StateUpdated(ScreensaverState),
    /// Tap on mpv's video window, which sits above the terminal.
    ScreensaverTap,
    Log(String),
    IdleTimeout,
    Preflight(PreflightReport),
}

/// Idle timeouts get a one-slot channel of their own. A full slot already
/// holds a pending timeout.
fn idle_signal() -> (impl Fn() + Send + Sync + 'static, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(1);
    let notify = move || match tx.try_send(()) {
        Ok(()) | Err(mpsc::error::TrySendError::Full(())) => {}
        Err(mpsc::error::TrySendError::Closed(())) => debug!("idle: app loop gone"),
    };
    (notify, rx)
}

/// Idle-relevant kind of a pointer event.
fn input_kind(kind: MouseEventKind) -> InputKind {
    match kind {
        MouseEventKind::Down(_) => InputKind::Tap,
        MouseEventKind::Up(_) => InputKind::Release,
        MouseEventKind::Drag(_) => InputKind::Drag,
        MouseEventKind::Moved => InputKind::Move,
        MouseEventKind::ScrollUp
        | MouseEventKind::ScrollDown
        | MouseEventKind::ScrollLeft
        | MouseEventKind::ScrollRight => InputKind::Scroll,
    }
}

// ── Screens ───────────────────────────────────────────────────────────────────

/// The menu and attract screen live for the whole session; content views
/// exist only while shown.
struct Screens {
    screensaver: Screensaver,
    main_menu: MainMenu,
    dashboards: Option<Dashboards>,
    presentation: Option<Presentation>,
}

impl Screens {
    fn active_mut(&mut self, view: View) -> Option<&mut dyn Component> {
        match view {
            View::Screensaver => Some(&mut self.screensaver as &mut dyn Component),
            View::Menu => Some(&mut self.main_menu as &mut dyn Component),
            View::Dashboards => self.dashboards.as_mut().map(|d| d as &mut dyn Component),
            View::Presentation(_) => self.presentation.as_mut().map(|p| p as &mut dyn Component),
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub state: AppState,

    router: Router,
    screens: Screens,
    debug_overlay: DebugOverlay,
    toast: ToastManager,

    idle_timeout: Duration,
    idle_reset_on: HashSet<InputKind>,
    /// Armed once the message channel exists (in `run`).
    idle: Option<IdleController>,

    core_tx: mpsc::Sender<CoreEvent>,
    state_manager: Arc<StateManager>,

    should_quit: bool,
    /// Full frame area at the last draw; components hit-test inside it.
    screen: Rect,
}

impl App {
    pub fn new(
        content: Arc<Content>,
        assets_dir: PathBuf,
        config: &Config,
        core_tx: mpsc::Sender<CoreEvent>,
        state_manager: Arc<StateManager>,
    ) -> Self {
        let mut state = AppState::new(content, assets_dir, config.presentation.swipe_min_distance);
        state.debug_visible = config.kiosk.debug_overlay;
        Self {
            state,
            router: Router::new(),
            screens: Screens {
                screensaver: Screensaver::new(),
                main_menu: MainMenu::new(),
                dashboards: None,
                presentation: None,
            },
            debug_overlay: DebugOverlay::new(),
            toast: ToastManager::new(),
            idle_timeout: config.idle.timeout(),
            idle_reset_on: parse_reset_kinds(&config.idle.reset_events),
            idle: None,
            core_tx,
            state_manager,
            should_quit: false,
            screen: Rect::default(),
        }
    }

    pub async fn run(mut self, mut broadcast_rx: broadcast::Receiver<BroadcastMessage>) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: broadcast receiver (ScreensaverCore → AppMessage) ─
        let bc_tx = tx.clone();
        let bc_state_manager = Arc::clone(&self.state_manager);
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(msg) => {
                        let app_msg = match msg {
                            BroadcastMessage::StateUpdated => {
                                AppMessage::StateUpdated(bc_state_manager.get_state().await)
                            }
                            BroadcastMessage::ScreensaverTap => AppMessage::ScreensaverTap,
                            BroadcastMessage::Log(s) => AppMessage::Log(s),
                        };
                        if bc_tx.send(app_msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("broadcast receiver lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // ── Asset preflight ───────────────────────────────────────────────────
        let pf_tx = tx.clone();
        let assets_dir = self.state.assets_dir.clone();
        let referenced = self.state.content.referenced_assets();
        self.toast.spinner(format!("checking {} assets", referenced.len()));
        tokio::spawn(async move {
            let report = assets::preflight(&assets_dir, &referenced).await;
            let _ = pf_tx.send(AppMessage::Preflight(report)).await;
        });

        // ── Idle countdown ────────────────────────────────────────────────────
        let (on_idle, mut idle_rx) = idle_signal();
        let mut idle = IdleController::new(self.idle_timeout, self.idle_reset_on.clone(), on_idle);
        idle.start();
        self.idle = Some(idle);

        // The router starts on the attract screen.
        self.send_core(CoreEvent::Activate).await;
        info!("kiosk started on {}", self.state.view.name());

        // ── Periodic timers ───────────────────────────────────────────────────
        // Component maintenance tick (prompt pulse, lightweight expiries).
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Toast expiry check + spinner animation.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut debug_refresh = tokio::time::interval(Duration::from_secs(1));
        debug_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    let mut redraw = self.handle_message(msg).await;
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        let Ok(next) = rx.try_recv() else {
                            break;
                        };
                        drained += 1;
                        redraw |= self.handle_message(next).await;
                    }
                    needs_redraw = redraw;
                }

                Some(()) = idle_rx.recv() => {
                    needs_redraw = self.handle_message(AppMessage::IdleTimeout).await;
                }

                _ = ui_tick.tick() => {
                    let view = self.state.view;
                    let actions = match self.screens.active_mut(view) {
                        Some(c) => c.tick(&self.state),
                        None => Vec::new(),
                    };
                    for action in actions {
                        self.dispatch(action).await;
                    }
                    needs_redraw = view == View::Screensaver;
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }

                _ = debug_refresh.tick() => {
                    self.refresh_idle_remaining();
                    needs_redraw = self.state.debug_visible;
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        info!("kiosk shutting down");
        if let Some(mut idle) = self.idle.take() {
            idle.stop();
        }
        self.send_core(CoreEvent::Shutdown).await;
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    async fn send_core(&self, event: CoreEvent) {
        if let Err(e) = self.core_tx.send(event).await {
            warn!("screensaver core unavailable: {}", e);
        }
    }

    fn refresh_idle_remaining(&mut self) {
        self.state.idle_remaining = self.idle.as_ref().and_then(IdleController::remaining);
    }

    fn note_input(&mut self, kind: InputKind) {
        if let Some(idle) = self.idle.as_mut() {
            idle.notify(kind);
        }
    }

    /// Returns whether the frame needs redrawing.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return false;
                }
                self.note_input(InputKind::Key);
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                self.note_input(input_kind(mouse.kind));
                for action in self.handle_mouse(mouse) {
                    self.dispatch(action).await;
                }
                !matches!(mouse.kind, MouseEventKind::Moved)
            }
            AppMessage::Event(Event::Resize(w, h)) => {
                self.dispatch(Action::Resize(w, h)).await;
                true
            }
            AppMessage::Event(_) => false,
            AppMessage::StateUpdated(next) => {
                self.on_screensaver_state(next);
                self.state.debug_visible
            }
            AppMessage::ScreensaverTap => {
                self.note_input(InputKind::Tap);
                self.dispatch(Action::Route(RouteEvent::ScreensaverTap)).await;
                true
            }
            AppMessage::Log(line) => {
                self.state.push_log(line);
                self.state.debug_visible
            }
            AppMessage::IdleTimeout => {
                self.dispatch(Action::Route(RouteEvent::IdleTimeout)).await;
                true
            }
            AppMessage::Preflight(report) => {
                if report.is_complete() {
                    self.toast.resolve_spinner(Severity::Success, report.summary());
                } else {
                    self.toast.resolve_spinner(Severity::Warning, report.summary());
                }
                self.state.preflight = Some(report);
                true
            }
        }
    }

    /// Player recovery is worth a toast only while the operator is watching.
    fn on_screensaver_state(&mut self, next: ScreensaverState) {
        let was = &self.state.screensaver.mpv_health;
        if self.state.debug_visible && *was != next.mpv_health {
            match (&next.mpv_health, was.is_unhealthy()) {
                (MpvHealth::Running, true) => self.toast.success("player recovered"),
                (MpvHealth::Dead, _) => self.toast.error("player died"),
                _ => {}
            }
        }
        self.state.screensaver = next;
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::F(2) => vec![Action::ToggleDebug],
            KeyCode::Char('q') | KeyCode::Char('c')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                vec![Action::Quit]
            }
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let view = self.state.view;
        let area = self.screen;
        match self.screens.active_mut(view) {
            Some(c) => {
                trace!("mouse {:?} → {:?}", event.kind, c.id());
                c.handle_mouse(event, area, &self.state)
            }
            None => vec![],
        }
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        match action {
            Action::Route(event) => self.route(event).await,
            Action::ToggleDebug => {
                self.state.debug_visible = !self.state.debug_visible;
                self.refresh_idle_remaining();
                info!("debug overlay {}", if self.state.debug_visible { "shown" } else { "hidden" });
            }
            Action::Quit => self.should_quit = true,
            Action::Resize(w, h) => debug!("terminal resized to {}x{}", w, h),
        }
    }

    async fn route(&mut self, event: RouteEvent) {
        let Transition::Changed { from, to } = self.router.handle(&event) else {
            return;
        };
        self.state.view = to;

        // Content views never outlive their visit.
        self.screens.dashboards = None;
        self.screens.presentation = None;
        match to {
            View::Dashboards => {
                self.screens.dashboards = Some(Dashboards::new(&self.state.content));
            }
            View::Presentation(deck) => {
                self.screens.presentation = Some(Presentation::new(
                    deck,
                    &self.state.content,
                    self.state.swipe_min_distance,
                ));
            }
            View::Screensaver | View::Menu => {}
        }

        if from == View::Screensaver {
            self.send_core(CoreEvent::Deactivate).await;
        }
        if to == View::Screensaver {
            self.send_core(CoreEvent::Activate).await;
        }
        if let Some(idle) = self.idle.as_mut() {
            idle.reset();
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.screen = area;
        let view = self.state.view;
        if let Some(c) = self.screens.active_mut(view) {
            c.draw(frame, area, &self.state);
        }
        self.debug_overlay.draw(frame, area, &self.state);
        self.toast.draw(frame, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_shared::content::{DashboardTab, DeckId};

    fn app() -> (App, mpsc::Receiver<CoreEvent>) {
        let mut content = Content::default();
        content.dashboards.tabs.push(DashboardTab {
            id: "incidents".into(),
            label: "Incidents".into(),
            subtitle: String::new(),
            data: serde_json::Value::Null,
        });
        let (core_tx, core_rx) = mpsc::channel(16);
        let app = App::new(
            Arc::new(content),
            PathBuf::new(),
            &Config::default(),
            core_tx,
            Arc::new(StateManager::new()),
        );
        (app, core_rx)
    }

    fn drain(rx: &mut mpsc::Receiver<CoreEvent>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(e) = rx.try_recv() {
            out.push(format!("{:?}", e));
        }
        out
    }

    #[tokio::test]
    async fn test_leaving_and_returning_to_screensaver_toggles_core() {
        let (mut app, mut core_rx) = app();
        app.route(RouteEvent::ScreensaverTap).await;
        assert_eq!(app.state.view, View::Menu);
        assert_eq!(drain(&mut core_rx), vec!["Deactivate".to_string()]);

        app.route(RouteEvent::IdleTimeout).await;
        assert_eq!(app.state.view, View::Screensaver);
        assert_eq!(drain(&mut core_rx), vec!["Activate".to_string()]);
    }

    #[tokio::test]
    async fn test_content_views_mount_fresh_and_unmount_on_home() {
        let (mut app, _core_rx) = app();
        app.route(RouteEvent::ScreensaverTap).await;
        app.route(RouteEvent::CardSelected("/dashboards".into())).await;
        assert!(app.screens.dashboards.is_some());

        app.route(RouteEvent::Home).await;
        assert_eq!(app.state.view, View::Menu);
        assert!(app.screens.dashboards.is_none());

        app.route(RouteEvent::CardSelected("/products".into())).await;
        assert_eq!(app.state.view, View::Presentation(DeckId::Products));
        assert!(app.screens.presentation.is_some());
        assert!(app.screens.dashboards.is_none());
    }

    #[tokio::test]
    async fn test_ignored_route_changes_nothing() {
        let (mut app, mut core_rx) = app();
        app.route(RouteEvent::Home).await;
        assert_eq!(app.state.view, View::Screensaver);
        assert!(drain(&mut core_rx).is_empty());
    }

    #[tokio::test]
    async fn test_operator_keys() {
        let (mut app, _core_rx) = app();
        let f2 = KeyEvent::new(KeyCode::F(2), KeyModifiers::NONE);
        assert_eq!(app.handle_key(f2), vec![Action::ToggleDebug]);
        app.dispatch(Action::ToggleDebug).await;
        assert!(app.state.debug_visible);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_key(ctrl_c), vec![Action::Quit]);
        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_key(ctrl_q), vec![Action::Quit]);
        for plain in ['c', 'q'] {
            let key = KeyEvent::new(KeyCode::Char(plain), KeyModifiers::NONE);
            assert!(app.handle_key(key).is_empty(), "plain '{}' must not quit", plain);
        }
    }

    #[test]
    fn test_idle_signal_is_never_lost() {
        let (notify, mut rx) = idle_signal();
        notify();
        notify();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        notify();
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_pointer_events_map_to_idle_kinds() {
        use ratatui::crossterm::event::MouseButton;
        assert_eq!(input_kind(MouseEventKind::Down(MouseButton::Left)), InputKind::Tap);
        assert_eq!(input_kind(MouseEventKind::Drag(MouseButton::Left)), InputKind::Drag);
        assert_eq!(input_kind(MouseEventKind::ScrollDown), InputKind::Scroll);
        assert_eq!(input_kind(MouseEventKind::Moved), InputKind::Move);
    }
}
