//! Component trait — the interface every kiosk screen implements.
//!
//! - Components own their local interactive state and render themselves.
//! - Components receive `AppState` (read-only) for data they don't own.
//! - Components produce `Vec<Action>`; they never mutate shared state directly.
//! - The App event-loop dispatches those actions and owns routing.

use ratatui::crossterm::event::MouseEvent;
use ratatui::{layout::Rect, Frame};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;

pub trait Component {
    fn id(&self) -> ComponentId;

    /// Handle a pointer event inside `area` (the component's last drawn area).
    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action>;

    /// Called each UI tick. For time-based updates, expiry checks, etc.
    fn tick(&mut self, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState);
}

/// Whether `(column, row)` falls inside `r`.
pub fn hit(r: Rect, column: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && column >= r.x
        && column < r.x + r.width
        && row >= r.y
        && row < r.y + r.height
}
