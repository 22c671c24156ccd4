//! MainMenu component — the card grid visitors land on after the attract screen.
//!
//! Stays mounted for the whole session; only its visibility changes.

use ratatui::crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};

use kiosk_shared::content::Card;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::{hit, Component},
    router::RouteEvent,
    theme::{style_accent, style_default, style_muted, style_paper, style_secondary, style_title},
    widgets::pane_chrome::pane_chrome,
};

const HEADER_HEIGHT: u16 = 3;
const CARD_HEIGHT: u16 = 7;
const LOGO_WIDTH: u16 = 14;

pub struct MainMenu {
    logo: Rect,
    /// Last drawn card rects with the route each opens.
    cards: Vec<(Rect, String)>,
}

impl MainMenu {
    pub fn new() -> Self {
        Self {
            logo: Rect::default(),
            cards: Vec::new(),
        }
    }

    fn columns_for(width: u16) -> usize {
        if width >= 120 {
            4
        } else if width >= 60 {
            2
        } else {
            1
        }
    }

    /// Lay out `count` cards in a grid below the header.
    fn card_rects(area: Rect, count: usize) -> Vec<Rect> {
        if count == 0 || area.width == 0 {
            return Vec::new();
        }
        let columns = Self::columns_for(area.width).min(count);
        let width = area.width / columns as u16;
        (0..count)
            .map(|i| {
                let (row, col) = (i / columns, i % columns);
                Rect {
                    x: area.x + col as u16 * width,
                    y: area.y + row as u16 * CARD_HEIGHT,
                    width,
                    height: CARD_HEIGHT,
                }
                .intersection(area)
            })
            .collect()
    }

    fn draw_card(frame: &mut Frame, rect: Rect, card: &Card) {
        let inner_rect = Rect {
            x: rect.x + 1,
            y: rect.y,
            width: rect.width.saturating_sub(2),
            height: rect.height.saturating_sub(1),
        };
        let block = pane_chrome(&card.title, false, None).style(style_paper());
        let inner = block.inner(inner_rect);
        frame.render_widget(block, inner_rect);

        let mut lines = vec![Line::from(Span::styled(card.title.clone(), style_title()))];
        if !card.subtitle.is_empty() {
            lines.push(Line::from(Span::styled(card.subtitle.clone(), style_secondary())));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("▣ {}", card.icon_path()), style_muted())));
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }
}

impl Default for MainMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for MainMenu {
    fn id(&self) -> ComponentId {
        ComponentId::MainMenu
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if !matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) {
            return vec![];
        }
        if hit(self.logo, event.column, event.row) {
            return vec![Action::Route(RouteEvent::LogoTap)];
        }
        self.cards
            .iter()
            .find(|(r, _)| hit(*r, event.column, event.row))
            .map(|(_, route)| vec![Action::Route(RouteEvent::CardSelected(route.clone()))])
            .unwrap_or_default()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        frame.render_widget(Block::default().style(style_default()), area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
            .split(area);

        let header = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(LOGO_WIDTH), Constraint::Min(0)])
            .split(chunks[0]);

        self.logo = header[0];
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled(" ● ", style_accent()),
                    Span::styled("kiosk", style_title()),
                ]),
            ]),
            header[0],
        );
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled("Choose a topic", style_secondary())),
            ]),
            header[1],
        );

        let cards = &state.content.cards;
        let rects = Self::card_rects(chunks[1], cards.len());
        self.cards.clear();
        for (rect, card) in rects.into_iter().zip(cards.iter()) {
            if rect.height < 3 {
                continue;
            }
            Self::draw_card(frame, rect, card);
            self.cards.push((rect, card.route.clone()));
        }
    }
}
