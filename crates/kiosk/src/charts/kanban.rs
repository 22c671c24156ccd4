//! Technique coverage board.
//!
//! Columns carry an optional coverage badge; cards are ordered by their
//! `order` field and coloured by coverage class.  Cards with sub-techniques
//! expand in place.  The whole board scales with the zoom level, anchored at
//! the top-left corner, inside a fixed-size drawing.

use std::collections::BTreeSet;

use kiosk_shared::content::{KanbanBoard, KanbanColumn, Progress, Technique};

use super::drawing::{Anchor, Drawing, HitArea, Rgb, Shape};
use super::fmt_value;

const PAD: f64 = 24.0;
const COLUMN_WIDTH: f64 = 360.0;
const COLUMN_GAP: f64 = 24.0;
const HEADER_HEIGHT: f64 = 80.0;
const CARD_HEIGHT: f64 = 150.0;
const CARD_GAP: f64 = 16.0;
const SUB_ROW: f64 = 36.0;
const MIN_SIZE: f64 = 400.0;

const ZOOM_MIN: u8 = 2;
const ZOOM_MAX: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Full,
    Partial,
    None,
    NoData,
}

impl Coverage {
    pub fn of(progress: Option<Progress>) -> Coverage {
        match progress {
            None => Coverage::NoData,
            Some(p) if p.done == p.total => Coverage::Full,
            Some(p) if p.done == 0 => Coverage::None,
            Some(_) => Coverage::Partial,
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Coverage::Full => Rgb(0x2E, 0x9E, 0x5B),
            Coverage::Partial => Rgb(0xF2, 0xA9, 0x00),
            Coverage::None => Rgb::RED,
            Coverage::NoData => Rgb::SLATE,
        }
    }
}

/// Zoom level and expanded cards.
#[derive(Debug, Clone, PartialEq)]
pub struct KanbanView {
    /// Zoom in tenths, so repeated steps never drift.
    zoom_tenths: u8,
    expanded: BTreeSet<String>,
}

impl Default for KanbanView {
    fn default() -> Self {
        Self {
            zoom_tenths: 10,
            expanded: BTreeSet::new(),
        }
    }
}

impl KanbanView {
    pub fn zoom(&self) -> f64 {
        f64::from(self.zoom_tenths) / 10.0
    }

    pub fn zoom_percent(&self) -> u32 {
        u32::from(self.zoom_tenths) * 10
    }

    pub fn zoom_in(&mut self) -> bool {
        if self.zoom_tenths >= ZOOM_MAX {
            return false;
        }
        self.zoom_tenths += 1;
        true
    }

    pub fn zoom_out(&mut self) -> bool {
        if self.zoom_tenths <= ZOOM_MIN {
            return false;
        }
        self.zoom_tenths -= 1;
        true
    }

    pub fn toggle(&mut self, technique_id: &str) {
        if !self.expanded.remove(technique_id) {
            self.expanded.insert(technique_id.to_string());
        }
    }

    pub fn is_expanded(&self, technique_id: &str) -> bool {
        self.expanded.contains(technique_id)
    }
}

fn sorted_techniques(column: &KanbanColumn) -> Vec<&Technique> {
    let mut cards: Vec<&Technique> = column.techniques.iter().collect();
    cards.sort_by_key(|t| t.order);
    cards
}

fn card_height(technique: &Technique, view: &KanbanView) -> f64 {
    if !technique.subtechniques.is_empty() && view.is_expanded(&technique.id) {
        CARD_HEIGHT + technique.subtechniques.len() as f64 * SUB_ROW + 12.0
    } else {
        CARD_HEIGHT
    }
}

fn column_height(column: &KanbanColumn, view: &KanbanView) -> f64 {
    HEADER_HEIGHT
        + column
            .techniques
            .iter()
            .map(|t| card_height(t, view) + CARD_GAP)
            .sum::<f64>()
}

pub fn render(board: &KanbanBoard, view: &KanbanView) -> Drawing {
    let n = board.columns.len() as f64;
    let width = (PAD * 2.0 + n * COLUMN_WIDTH + (n - 1.0).max(0.0) * COLUMN_GAP).max(MIN_SIZE);
    let tallest = board
        .columns
        .iter()
        .map(|c| column_height(c, view))
        .fold(0.0, f64::max);
    let height = (tallest + PAD * 2.0).max(MIN_SIZE);
    let mut d = Drawing::new(width, height);
    let z = view.zoom();
    let s = |v: f64| v * z;

    for (i, column) in board.columns.iter().enumerate() {
        let x = PAD + i as f64 * (COLUMN_WIDTH + COLUMN_GAP);
        d.push(Shape::Rect {
            x: s(x),
            y: s(PAD),
            w: s(COLUMN_WIDTH),
            h: s(column_height(column, view)),
            fill: Some(Rgb(0xEE, 0xF1, 0xF5)),
            stroke: None,
            radius: s(12.0),
            opacity: 1.0,
        });
        d.push(Shape::Text {
            at: (s(x + 16.0), s(PAD + 48.0)),
            text: column.title.clone(),
            size: s(24.0),
            color: Rgb::INK,
            anchor: Anchor::Start,
            bold: true,
        });
        if let Some(coverage) = column.coverage {
            d.push(Shape::Rect {
                x: s(x + COLUMN_WIDTH - 96.0),
                y: s(PAD + 20.0),
                w: s(80.0),
                h: s(40.0),
                fill: Some(Rgb::RED),
                stroke: None,
                radius: s(20.0),
                opacity: 1.0,
            });
            d.push(Shape::Text {
                at: (s(x + COLUMN_WIDTH - 56.0), s(PAD + 48.0)),
                text: format!("{}%", fmt_value(coverage)),
                size: s(20.0),
                color: Rgb::WHITE,
                anchor: Anchor::Middle,
                bold: true,
            });
        }

        let mut y = PAD + HEADER_HEIGHT;
        for technique in sorted_techniques(column) {
            let h = card_height(technique, view);
            draw_card(&mut d, technique, view, (x + 12.0, y), h, z);
            y += h + CARD_GAP;
        }
    }
    d
}

fn draw_card(
    d: &mut Drawing,
    technique: &Technique,
    view: &KanbanView,
    origin: (f64, f64),
    h: f64,
    z: f64,
) {
    let s = |v: f64| v * z;
    let (x, y) = origin;
    let w = COLUMN_WIDTH - 24.0;
    let coverage = Coverage::of(technique.progress);

    d.push(Shape::Rect {
        x: s(x),
        y: s(y),
        w: s(w),
        h: s(h),
        fill: Some(Rgb::WHITE),
        stroke: Some(coverage.color()),
        radius: s(8.0),
        opacity: 1.0,
    });
    d.push(Shape::filled_rect(s(x), s(y), s(8.0), s(h), coverage.color(), 1.0));
    d.push(Shape::text((s(x + 20.0), s(y + 30.0)), technique.id.clone(), s(18.0), Rgb::SLATE));
    d.push(Shape::Text {
        at: (s(x + 20.0), s(y + 62.0)),
        text: technique.title.clone(),
        size: s(22.0),
        color: Rgb::INK,
        anchor: Anchor::Start,
        bold: true,
    });
    if let Some(p) = technique.progress {
        d.push(Shape::text(
            (s(x + 20.0), s(y + 96.0)),
            format!("{}/{}", p.done, p.total),
            s(20.0),
            coverage.color(),
        ));
    }
    if !technique.tags.is_empty() {
        let tags = technique
            .tags
            .iter()
            .map(|t| format!("# {}", t))
            .collect::<Vec<_>>()
            .join("  ");
        d.push(Shape::text((s(x + 20.0), s(y + 128.0)), tags, s(16.0), Rgb::SLATE));
    }

    if technique.subtechniques.is_empty() {
        return;
    }
    let expanded = view.is_expanded(&technique.id);
    d.push(Shape::centered_text(
        (s(x + w - 28.0), s(y + 30.0)),
        if expanded { "▲" } else { "▼" },
        s(20.0),
        Rgb::INK,
    ));
    d.region(
        technique.id.clone(),
        HitArea::Rect {
            x: s(x),
            y: s(y),
            w: s(w),
            h: s(CARD_HEIGHT),
        },
    );
    if expanded {
        for (k, sub) in technique.subtechniques.iter().enumerate() {
            let row_y = y + CARD_HEIGHT + k as f64 * SUB_ROW + 20.0;
            d.push(Shape::text(
                (s(x + 28.0), s(row_y)),
                format!("{}  {}", sub.id, sub.title),
                s(16.0),
                Rgb::INK,
            ));
        }
    }
}
