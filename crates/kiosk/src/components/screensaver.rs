//! Screensaver component — attract screen shown while mpv plays the loop.
//!
//! The video itself runs in mpv's own window; this pane only owns the
//! "touch to start" prompt and turns any tap into a route event.

use ratatui::crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    router::RouteEvent,
    theme::{C_ACCENT, C_ATTRACT_BG, C_ATTRACT_FG},
};

const PROMPT: &str = "Touch the screen to start";

pub struct Screensaver {
    /// Blink phase of the prompt, advanced by `tick`.
    pulse: u8,
}

impl Screensaver {
    pub fn new() -> Self {
        Self { pulse: 0 }
    }
}

impl Default for Screensaver {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Screensaver {
    fn id(&self) -> ComponentId {
        ComponentId::Screensaver
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => vec![Action::Route(RouteEvent::ScreensaverTap)],
            _ => vec![],
        }
    }

    fn tick(&mut self, _state: &AppState) -> Vec<Action> {
        // 100 ms ticks: a full pulse every two seconds.
        self.pulse = (self.pulse + 1) % 20;
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _state: &AppState) {
        let bg = Style::default().bg(C_ATTRACT_BG).fg(C_ATTRACT_FG);
        frame.render_widget(Block::default().style(bg), area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(3),
                Constraint::Length(2),
            ])
            .split(area);

        let prompt_style = if self.pulse < 14 {
            Style::default().fg(C_ATTRACT_FG).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_ATTRACT_FG).add_modifier(Modifier::DIM)
        };
        let prompt = vec![
            Line::from(Span::styled("●", Style::default().fg(C_ACCENT))),
            Line::from(Span::styled(PROMPT, prompt_style)),
        ];
        frame.render_widget(
            Paragraph::new(prompt).alignment(Alignment::Center).style(bg),
            rows[1],
        );
    }
}
