//! Action enum — intents produced by components and dispatched by the App.

use crate::router::RouteEvent;

/// Unique identifier for a screen component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Screensaver,
    MainMenu,
    Dashboards,
    Presentation,
    DebugOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Navigation ───────────────────────────────────────────────────────────
    Route(RouteEvent),

    // ── Operator ─────────────────────────────────────────────────────────────
    ToggleDebug,
    Quit,

    // ── System ───────────────────────────────────────────────────────────────
    Resize(u16, u16),
}
