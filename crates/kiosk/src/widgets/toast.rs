//! Operator toasts: short-lived status lines drawn in the top-right corner.
//!
//! Visitors never see playback errors; toasts only carry start-up and
//! operator information (asset preflight, player recovery).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::theme::{C_PAPER, C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn icon(self) -> &'static str {
        match self {
            Severity::Info => "·",
            Severity::Success => "✓",
            Severity::Warning => "!",
            Severity::Error => "✗",
        }
    }

    fn style(self) -> Style {
        let fg = match self {
            Severity::Info => C_TOAST_INFO,
            Severity::Success => C_TOAST_SUCCESS,
            Severity::Warning => C_TOAST_WARNING,
            Severity::Error => C_TOAST_ERROR,
        };
        Style::default().fg(fg).bg(C_PAPER).add_modifier(Modifier::BOLD)
    }

    fn lifetime(self) -> Duration {
        match self {
            Severity::Info | Severity::Success => Duration::from_secs(3),
            Severity::Warning => Duration::from_secs(5),
            Severity::Error => Duration::from_secs(8),
        }
    }
}

struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    /// Message and frame of the pending-work indicator, if any.
    spinner: Option<(String, usize)>,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            spinner: None,
            max_visible: 4,
        }
    }

    /// Queue a toast; an identical message already queued is replaced.
    pub fn push(&mut self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        self.toasts.retain(|t| t.message != message);
        self.toasts.push_back(Toast {
            message,
            severity,
            expires: Instant::now() + severity.lifetime(),
        });
        while self.toasts.len() > self.max_visible * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error);
    }

    /// Show a persistent spinner until [`resolve_spinner`](Self::resolve_spinner).
    pub fn spinner(&mut self, message: impl Into<String>) {
        self.spinner = Some((message.into(), 0));
    }

    pub fn resolve_spinner(&mut self, severity: Severity, message: impl Into<String>) {
        self.spinner = None;
        self.push(message, severity);
    }

    #[cfg(test)]
    pub fn has_spinner(&self) -> bool {
        self.spinner.is_some()
    }

    /// Drop expired toasts and advance the spinner.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires > now);
        if let Some((_, frame)) = self.spinner.as_mut() {
            *frame = (*frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinner.is_none()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Render in the top-right corner of `area`, spinner first, newest toast next.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(20, 60).min(area.width);
        let mut rows: Vec<(String, Style)> = Vec::new();
        if let Some((message, f)) = &self.spinner {
            rows.push((
                format!(" {} {} ", SPINNER_FRAMES[*f % SPINNER_FRAMES.len()], message),
                Severity::Info.style(),
            ));
        }
        for toast in self.toasts.iter().rev().take(self.max_visible) {
            rows.push((
                format!(" {} {} ", toast.severity.icon(), toast.message),
                toast.severity.style(),
            ));
        }

        for (i, (text, style)) in rows.into_iter().enumerate() {
            let y = area.y + 1 + i as u16;
            if y >= area.y + area.height {
                break;
            }
            let w = (text.chars().count() as u16).min(max_width);
            let toast_area = Rect {
                x: area.x + area.width.saturating_sub(w + 1),
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            frame.render_widget(Paragraph::new(Line::from(Span::styled(text, style))), toast_area);
        }
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse() {
        let mut t = ToastManager::new();
        t.push("assets: 12 ok", Severity::Info);
        t.push("assets: 12 ok", Severity::Info);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_queue_is_capped() {
        let mut t = ToastManager::new();
        for i in 0..20 {
            t.push(format!("missing {}", i), Severity::Warning);
        }
        assert_eq!(t.len(), 8);
    }

    #[test]
    fn test_spinner_resolves_into_toast() {
        let mut t = ToastManager::new();
        t.spinner("checking assets");
        assert!(t.has_spinner());
        t.tick();
        t.resolve_spinner(Severity::Success, "assets: 3 ok");
        assert!(!t.has_spinner());
        assert_eq!(t.len(), 1);
        assert!(!t.is_empty());
    }
}
