//! Colour palette and style constants for the kiosk screens.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(236, 240, 245);
pub const C_PAPER: Color = Color::Rgb(255, 255, 255);
pub const C_ACCENT: Color = Color::Rgb(255, 0, 0);
pub const C_INK: Color = Color::Rgb(68, 83, 106);
pub const C_SLATE: Color = Color::Rgb(106, 127, 152);
pub const C_MUTED: Color = Color::Rgb(150, 162, 178);
pub const C_PANEL_BORDER: Color = Color::Rgb(200, 208, 218);
pub const C_PANEL_BORDER_ACTIVE: Color = Color::Rgb(255, 0, 0);
pub const C_SELECTION_BG: Color = Color::Rgb(255, 228, 228);
pub const C_ATTRACT_BG: Color = Color::Rgb(12, 14, 20);
pub const C_ATTRACT_FG: Color = Color::Rgb(225, 230, 238);
pub const C_TOAST_INFO: Color = Color::Rgb(40, 110, 200);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(30, 150, 80);
pub const C_TOAST_WARNING: Color = Color::Rgb(200, 130, 0);
pub const C_TOAST_ERROR: Color = Color::Rgb(220, 40, 40);
pub const C_BADGE_OK: Color = Color::Rgb(30, 150, 80);
pub const C_BADGE_ERR: Color = Color::Rgb(220, 40, 40);
pub const C_BADGE_PENDING: Color = Color::Rgb(200, 130, 0);
pub const C_OVERLAY_BG: Color = Color::Rgb(18, 18, 26);
pub const C_OVERLAY_FG: Color = Color::Rgb(210, 210, 225);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_INK).bg(C_BG)
}

pub fn style_paper() -> Style {
    Style::default().fg(C_INK).bg(C_PAPER)
}

pub fn style_title() -> Style {
    Style::default().fg(C_INK).add_modifier(Modifier::BOLD)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SLATE)
}

pub fn style_accent() -> Style {
    Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
}

pub fn style_selected() -> Style {
    Style::default()
        .bg(C_SELECTION_BG)
        .fg(C_ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn style_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

pub fn style_border_active() -> Style {
    Style::default().fg(C_PANEL_BORDER_ACTIVE)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}
