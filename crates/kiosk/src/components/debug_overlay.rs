//! DebugOverlay component — operator popup with screensaver sync telemetry,
//! idle countdown, asset preflight and recent WARN/ERROR lines.

use ratatui::crossterm::event::MouseEvent;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use kiosk_shared::protocol::MpvHealth;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_BADGE_ERR, C_BADGE_OK, C_BADGE_PENDING, C_MUTED, C_OVERLAY_BG, C_OVERLAY_FG},
    widgets::pane_chrome::centered_rect,
};

/// Log lines shown at the bottom of the overlay.
const LOG_LINES: usize = 8;

pub struct DebugOverlay;

impl DebugOverlay {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DebugOverlay {
    fn default() -> Self {
        Self::new()
    }
}

fn row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<14}", label), Style::default().fg(C_MUTED)),
        Span::styled(value, Style::default().fg(C_OVERLAY_FG)),
    ])
}

fn health_span(health: &MpvHealth) -> Span<'static> {
    let (text, color) = match health {
        MpvHealth::Absent => ("absent".to_string(), C_MUTED),
        MpvHealth::Starting => ("starting".to_string(), C_BADGE_PENDING),
        MpvHealth::Running => ("running".to_string(), C_BADGE_OK),
        MpvHealth::Degraded(reason) => (format!("degraded: {}", reason), C_BADGE_PENDING),
        MpvHealth::Dead => ("dead".to_string(), C_BADGE_ERR),
        MpvHealth::Restarting => ("restarting".to_string(), C_BADGE_PENDING),
    };
    Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn secs(v: Option<f64>) -> String {
    v.map(|s| format!("{:+.3} s", s)).unwrap_or_else(|| "—".to_string())
}

/// Text content of the overlay, newest log line last.
pub fn overlay_lines(state: &AppState) -> Vec<Line<'static>> {
    let ss = &state.screensaver;
    let mut lines = vec![
        row("view", state.view.name().to_string()),
        row(
            "phase",
            format!("{}{}", ss.phase.label(), if ss.active { "" } else { " (inactive)" }),
        ),
        row(
            "entry",
            match (ss.current_entry, &ss.current_media) {
                (Some(i), Some(m)) => format!("#{} {}", i, m),
                (Some(i), None) => format!("#{}", i),
                _ => "—".to_string(),
            },
        ),
        row(
            "expected",
            ss.expected
                .map(|p| format!("#{} @ {:.2} s", p.entry_index, p.offset_secs))
                .unwrap_or_else(|| "—".to_string()),
        ),
        row("last drift", secs(ss.last_drift_secs)),
        row("rate", format!("{:.2}×", ss.playback_rate)),
        row("corrections", ss.corrections.to_string()),
        row("retries", ss.retries.to_string()),
        Line::from(vec![
            Span::styled(format!(" {:<14}", "mpv"), Style::default().fg(C_MUTED)),
            health_span(&ss.mpv_health),
        ]),
        row(
            "idle in",
            state
                .idle_remaining
                .map(|d| format!("{} s", d.as_secs()))
                .unwrap_or_else(|| "—".to_string()),
        ),
        row(
            "assets",
            state
                .preflight
                .as_ref()
                .map(|r| r.summary())
                .unwrap_or_else(|| "checking…".to_string()),
        ),
        Line::from(""),
    ];

    let skip = state.logs.len().saturating_sub(LOG_LINES);
    for log in state.logs.iter().skip(skip) {
        lines.push(Line::from(Span::styled(
            format!(" {}", log),
            Style::default().fg(C_BADGE_PENDING),
        )));
    }
    lines.push(Line::from(Span::styled(" F2 to close", Style::default().fg(C_MUTED))));
    lines
}

impl Component for DebugOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::DebugOverlay
    }

    fn handle_mouse(&mut self, _event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        if !state.debug_visible {
            return;
        }
        let lines = overlay_lines(state);
        let popup = centered_rect(70, (lines.len() as u16 + 2).min(area.height), area);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(C_MUTED))
                        .title(Span::styled(
                            " debug ",
                            Style::default().fg(C_OVERLAY_FG).add_modifier(Modifier::BOLD),
                        )),
                )
                .style(Style::default().bg(C_OVERLAY_BG).fg(C_OVERLAY_FG))
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_shared::schedule::PlaybackPosition;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_overlay_shows_sync_telemetry() {
        let mut state = AppState::new(Arc::default(), PathBuf::new(), 5);
        state.screensaver.active = true;
        state.screensaver.expected = Some(PlaybackPosition {
            entry_index: 1,
            offset_secs: 5.0,
        });
        state.screensaver.last_drift_secs = Some(0.3);
        state.screensaver.playback_rate = 1.05;
        state.screensaver.mpv_health = MpvHealth::Dead;
        state.push_log("12:00:00 [WARN] mpv: load failed".into());

        let out = text(&overlay_lines(&state));
        assert!(out.contains("#1 @ 5.00 s"));
        assert!(out.contains("+0.300 s"));
        assert!(out.contains("1.05×"));
        assert!(out.contains("dead"));
        assert!(out.contains("load failed"));
        assert!(out.contains("checking…"));
    }

    #[test]
    fn test_only_newest_logs_are_listed() {
        let mut state = AppState::new(Arc::default(), PathBuf::new(), 5);
        for i in 0..20 {
            state.push_log(format!("log {:02}", i));
        }
        let out = text(&overlay_lines(&state));
        assert!(!out.contains("log 11"));
        assert!(out.contains("log 12"));
        assert!(out.contains("log 19"));
    }
}
