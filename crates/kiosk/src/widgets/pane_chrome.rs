//! PaneChrome — standardized bordered pane with active styling and badges.

use crate::theme::{style_border, style_border_active, C_INK, C_SLATE};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};

/// A badge shown in the top-right of the pane header (e.g. "DEAD", "3 missing").
pub struct Badge<'a> {
    pub text: &'a str,
    pub color: Color,
}

/// Renders a bordered pane with consistent styling and optional badge.
pub fn pane_chrome<'a>(title: &'a str, active: bool, badge: Option<Badge<'a>>) -> Block<'a> {
    let border_style = if active {
        style_border_active()
    } else {
        style_border()
    };

    let title_style = if active {
        Style::default().fg(C_INK).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(C_SLATE)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Line::from(Span::styled(format!(" {} ", title), title_style)));

    if let Some(b) = badge {
        block.title_top(
            Line::from(Span::styled(
                format!(" {} ", b.text),
                Style::default().fg(b.color).add_modifier(Modifier::BOLD),
            ))
            .right_aligned(),
        )
    } else {
        block
    }
}

/// A popup rectangle `percent_x` wide and `height` rows tall, centred in `r`.
pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}
