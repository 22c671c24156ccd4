//! Presentation component — one slide deck with a thumbnail rail.
//!
//! Rebuilt on every entry, so the deck always opens on its first slide.

use ratatui::crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};

use kiosk_shared::content::{Content, DeckId, Slide};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::{hit, Component},
    presentation::{Gesture, PresentationViewer, SwipeTracker, ThumbnailRail},
    router::RouteEvent,
    theme::{
        style_accent, style_default, style_muted, style_paper, style_secondary, style_selected,
        style_title, C_SLATE,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

const HOME_LABEL: &str = " ⌂ Home ";
const RAIL_WIDTH: u16 = 24;
const THUMB_HEIGHT: u16 = 3;
const EMPTY_DECK: &str = "No slides in this presentation";

#[derive(Default)]
struct Areas {
    home: Rect,
    up: Rect,
    down: Rect,
    slide: Rect,
    /// Visible thumbnails with the slide index each opens.
    thumbs: Vec<(Rect, usize)>,
}

pub struct Presentation {
    deck: DeckId,
    slides: Vec<Slide>,
    viewer: PresentationViewer,
    swipe: SwipeTracker,
    rail: ThumbnailRail,
    /// How many thumbnails fit in the rail at the last draw.
    visible: usize,
    areas: Areas,
}

impl Presentation {
    pub fn new(deck: DeckId, content: &Content, swipe_min_distance: u16) -> Self {
        let slides = content.deck(deck).slides.clone();
        Self {
            deck,
            viewer: PresentationViewer::new(slides.len()),
            slides,
            swipe: SwipeTracker::new(swipe_min_distance),
            rail: ThumbnailRail::default(),
            visible: 0,
            areas: Areas::default(),
        }
    }

    pub fn current(&self) -> usize {
        self.viewer.current()
    }

    fn follow_current(&mut self) {
        self.rail.ensure_visible(self.viewer.current(), self.visible);
    }

    fn apply_gesture(&mut self, gesture: Gesture) {
        let changed = match gesture {
            Gesture::SwipeLeft => self.viewer.next(),
            Gesture::SwipeRight => self.viewer.prev(),
            Gesture::Tap { .. } => false,
        };
        if changed {
            self.follow_current();
        }
    }

    fn handle_press(&mut self, column: u16, row: u16) -> Vec<Action> {
        if hit(self.areas.home, column, row) {
            return vec![Action::Route(RouteEvent::Home)];
        }
        if hit(self.areas.up, column, row) {
            if self.viewer.prev() {
                self.follow_current();
            }
            return vec![];
        }
        if hit(self.areas.down, column, row) {
            if self.viewer.next() {
                self.follow_current();
            }
            return vec![];
        }
        if let Some(&(_, index)) = self.areas.thumbs.iter().find(|(r, _)| hit(*r, column, row)) {
            if self.viewer.jump(index) {
                self.follow_current();
            }
            return vec![];
        }
        if hit(self.areas.slide, column, row) {
            self.swipe.press(column, row);
        }
        vec![]
    }

    fn draw_rail(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);
        self.areas.up = rows[0];
        self.areas.down = rows[2];
        let arrow = |s: &'static str| Paragraph::new(Span::styled(s, style_accent())).alignment(Alignment::Center);
        frame.render_widget(arrow("▲"), rows[0]);
        frame.render_widget(arrow("▼"), rows[2]);

        self.visible = usize::from(rows[1].height / THUMB_HEIGHT);
        self.rail.clamp(self.slides.len(), self.visible);
        self.rail.ensure_visible(self.viewer.current(), self.visible);

        self.areas.thumbs.clear();
        let current = self.viewer.current();
        for (slot, index) in (self.rail.offset..self.slides.len()).take(self.visible).enumerate() {
            let rect = Rect::new(
                rows[1].x,
                rows[1].y + slot as u16 * THUMB_HEIGHT,
                rows[1].width,
                THUMB_HEIGHT,
            );
            let slide = &self.slides[index];
            let active = index == current;
            let block = pane_chrome("", active, None).style(style_paper());
            let inner = block.inner(rect);
            frame.render_widget(block, rect);
            let label = slide.thumbnail.as_deref().unwrap_or(&slide.image);
            let style = if active { style_selected() } else { style_secondary() };
            frame.render_widget(
                Paragraph::new(Span::styled(format!("{:>2} {}", index + 1, label), style)),
                inner,
            );
            self.areas.thumbs.push((rect, index));
        }
    }

    fn draw_slide(&mut self, frame: &mut Frame, area: Rect) {
        self.areas.slide = area;
        let counter = format!("{} / {}", self.viewer.current() + 1, self.viewer.len());
        let block = pane_chrome(
            self.deck.title(),
            true,
            Some(Badge {
                text: &counter,
                color: C_SLATE,
            }),
        )
        .style(style_paper());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(slide) = self.slides.get(self.viewer.current()) else {
            return;
        };
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(slide.image.clone(), style_title())),
        ];
        if let Some(thumb) = &slide.thumbnail {
            lines.push(Line::from(Span::styled(format!("thumbnail: {}", thumb), style_muted())));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("◀ swipe ▶", style_muted())));
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            inner,
        );
    }
}

impl Component for Presentation {
    fn id(&self) -> ComponentId {
        ComponentId::Presentation
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => self.handle_press(event.column, event.row),
            MouseEventKind::Drag(MouseButton::Left) => {
                self.swipe.drag(event.column);
                vec![]
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(gesture) = self.swipe.release(event.column) {
                    self.apply_gesture(gesture);
                }
                vec![]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _state: &AppState) {
        frame.render_widget(Block::default().style(style_default()), area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);
        let header = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(HOME_LABEL.chars().count() as u16),
                Constraint::Min(0),
            ])
            .split(rows[0]);
        self.areas.home = header[0];
        frame.render_widget(
            Paragraph::new(Span::styled(HOME_LABEL, style_accent())),
            header[0],
        );
        frame.render_widget(
            Paragraph::new(Span::styled(format!("  {}", self.deck.title()), style_title())),
            header[1],
        );

        if self.viewer.is_empty() {
            self.areas = Areas {
                home: self.areas.home,
                ..Areas::default()
            };
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled(EMPTY_DECK, style_muted())),
                ])
                .alignment(Alignment::Center),
                rows[1],
            );
            return;
        }

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(RAIL_WIDTH), Constraint::Min(0)])
            .split(rows[1]);
        self.draw_rail(frame, body[0]);
        self.draw_slide(frame, body[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, crossterm::event::KeyModifiers, Terminal};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn content(slides: u32) -> Content {
        let mut c = Content::default();
        c.ngfw_presentation.slides = (1..=slides)
            .map(|id| Slide {
                id,
                image: format!("ngfw/{}.png", id),
                thumbnail: Some(format!("ngfw/thumbs/{}.png", id)),
            })
            .collect();
        c
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn setup(slides: u32) -> (Presentation, AppState) {
        let c = content(slides);
        let mut p = Presentation::new(DeckId::Ngfw, &c, 5);
        let state = AppState::new(Arc::new(c), PathBuf::new(), 5);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| p.draw(f, f.area(), &state)).unwrap();
        (p, state)
    }

    #[test]
    fn test_swipe_left_advances_and_tap_does_not() {
        let (mut p, state) = setup(4);
        let area = Rect::new(0, 0, 100, 30);
        let (x, y) = (p.areas.slide.x + 40, p.areas.slide.y + 5);

        p.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), x, y), area, &state);
        p.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), x, y), area, &state);
        assert_eq!(p.current(), 0);

        p.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), x, y), area, &state);
        p.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), x - 10, y), area, &state);
        p.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), x - 10, y), area, &state);
        assert_eq!(p.current(), 1);
    }

    #[test]
    fn test_thumbnail_tap_jumps() {
        let (mut p, state) = setup(4);
        let area = Rect::new(0, 0, 100, 30);
        let (rect, index) = p.areas.thumbs[2];
        assert_eq!(index, 2);
        p.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), rect.x + 1, rect.y + 1), area, &state);
        assert_eq!(p.current(), 2);
    }

    #[test]
    fn test_down_button_scrolls_rail_to_follow() {
        let (mut p, state) = setup(20);
        let area = Rect::new(0, 0, 100, 30);
        let visible = p.visible;
        assert!(visible > 0 && visible < 20);
        let down = p.areas.down;
        for _ in 0..visible {
            p.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), down.x, down.y), area, &state);
        }
        assert_eq!(p.current(), visible);
        assert_eq!(p.rail.offset, 1);
    }

    #[test]
    fn test_home_routes_home_and_empty_deck_has_no_rail() {
        let (mut p, state) = setup(0);
        assert!(p.areas.thumbs.is_empty());
        let area = Rect::new(0, 0, 100, 30);
        assert_eq!(
            p.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 1, 0), area, &state),
            vec![Action::Route(RouteEvent::Home)]
        );
    }
}
