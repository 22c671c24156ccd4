//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this, but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kiosk_shared::content::Content;
use kiosk_shared::protocol::ScreensaverState;

use crate::assets::PreflightReport;
use crate::router::View;

/// How many forwarded WARN/ERROR lines the debug overlay keeps.
pub const LOG_CAPACITY: usize = 50;

pub struct AppState {
    // ── Routing ─────────────────────────────────────────────────────────────
    pub view: View,

    // ── Content ─────────────────────────────────────────────────────────────
    pub content: Arc<Content>,
    pub assets_dir: PathBuf,
    pub preflight: Option<PreflightReport>,

    // ── Screensaver ─────────────────────────────────────────────────────────
    /// Latest snapshot published by the screensaver core.
    pub screensaver: ScreensaverState,

    // ── Idle ────────────────────────────────────────────────────────────────
    pub idle_remaining: Option<Duration>,

    // ── Operator ────────────────────────────────────────────────────────────
    pub debug_visible: bool,
    /// WARN/ERROR lines forwarded from tracing (newest last).
    pub logs: VecDeque<String>,

    // ── Input tuning ────────────────────────────────────────────────────────
    pub swipe_min_distance: u16,
}

impl AppState {
    pub fn new(content: Arc<Content>, assets_dir: PathBuf, swipe_min_distance: u16) -> Self {
        Self {
            view: View::default(),
            content,
            assets_dir,
            preflight: None,
            screensaver: ScreensaverState::default(),
            idle_remaining: None,
            debug_visible: false,
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            swipe_min_distance,
        }
    }

    pub fn push_log(&mut self, line: String) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(line);
    }
}
