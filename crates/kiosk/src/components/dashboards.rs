//! Dashboards component — tab bar, one chart per tab, and the positive-import
//! navigator.
//!
//! Built fresh every time the view is entered: tab datasets are parsed once
//! here, and the active tab, chart selection, kanban zoom and navigator index
//! all start over on remount.

use ratatui::crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};
use tracing::debug;

use kiosk_shared::content::{Content, NavigatorItem, TabDataset};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    charts::{self, ChartState, Drawing},
    component::{hit, Component},
    router::RouteEvent,
    theme::{
        style_accent, style_default, style_muted, style_paper, style_secondary, style_selected,
        style_title,
    },
    widgets::{
        drawing_canvas::{hit_at, render_drawing},
        pane_chrome::pane_chrome,
    },
};

const HOME_LABEL: &str = " ⌂ Home ";

struct Tab {
    label: String,
    subtitle: String,
    dataset: TabDataset,
}

/// Hit-test rects from the last frame.
#[derive(Default)]
struct Areas {
    home: Rect,
    tabs: Vec<Rect>,
    zoom_out: Rect,
    zoom_in: Rect,
    chart: Rect,
    /// Fitted chart rect as painted; pointer mapping uses this, not `chart`.
    fitted: Rect,
    navigator: Vec<Rect>,
}

pub struct Dashboards {
    tabs: Vec<Tab>,
    active: usize,
    chart: ChartState,
    navigator_active: usize,
    /// Drawing painted in the last frame, kept for hit testing.
    drawing: Option<Drawing>,
    areas: Areas,
}

impl Dashboards {
    pub fn new(content: &Content) -> Self {
        let tabs: Vec<Tab> = content
            .dashboards
            .tabs
            .iter()
            .map(|t| {
                let dataset = TabDataset::parse(&t.id, &t.data);
                if let TabDataset::Unavailable(reason) = &dataset {
                    debug!("dashboards: tab '{}' unavailable: {}", t.id, reason);
                }
                Tab {
                    label: t.label.clone(),
                    subtitle: t.subtitle.clone(),
                    dataset,
                }
            })
            .collect();
        Self {
            tabs,
            active: 0,
            chart: ChartState::default(),
            navigator_active: 0,
            drawing: None,
            areas: Areas::default(),
        }
    }

    fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    fn select_tab(&mut self, index: usize) -> bool {
        if index == self.active || index >= self.tabs.len() {
            return false;
        }
        self.active = index;
        self.chart = ChartState::default();
        self.navigator_active = 0;
        self.drawing = None;
        true
    }

    fn is_kanban(&self) -> bool {
        matches!(self.active_tab().map(|t| &t.dataset), Some(TabDataset::Kanban(_)))
    }

    fn tap_chart(&mut self, column: u16, row: u16) -> bool {
        let Some(drawing) = self.drawing.as_ref() else {
            return false;
        };
        let key = hit_at(drawing, self.areas.fitted, column, row).map(str::to_string);
        let Some(tab) = self.tabs.get(self.active) else {
            return false;
        };
        self.chart.tap(&tab.dataset, key.as_deref())
    }

    fn handle_tap(&mut self, column: u16, row: u16) -> Vec<Action> {
        if hit(self.areas.home, column, row) {
            return vec![Action::Route(RouteEvent::Home)];
        }
        if let Some(i) = self.areas.tabs.iter().position(|r| hit(*r, column, row)) {
            self.select_tab(i);
            return vec![];
        }
        if hit(self.areas.zoom_in, column, row) {
            self.chart.kanban.zoom_in();
            return vec![];
        }
        if hit(self.areas.zoom_out, column, row) {
            self.chart.kanban.zoom_out();
            return vec![];
        }
        if let Some(i) = self.areas.navigator.iter().position(|r| hit(*r, column, row)) {
            self.navigator_active = i;
            return vec![];
        }
        if hit(self.areas.chart, column, row) {
            self.tap_chart(column, row);
        }
        vec![]
    }

    fn draw_header(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(HOME_LABEL.chars().count() as u16),
                Constraint::Min(0),
            ])
            .split(area);
        self.areas.home = chunks[0];
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(HOME_LABEL, style_accent()))),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled("  Dashboards", style_title()))),
            chunks[1],
        );
    }

    /// One-row tab bar; each label's rect is recorded for taps.
    fn draw_tab_bar(&mut self, frame: &mut Frame, area: Rect) {
        self.areas.tabs.clear();
        let mut spans = Vec::new();
        let mut x = area.x;
        for (i, tab) in self.tabs.iter().enumerate() {
            let text = format!(" {} ", tab.label);
            let width = (text.chars().count() as u16).min((area.x + area.width).saturating_sub(x));
            let style = if i == self.active {
                style_selected()
            } else {
                style_secondary()
            };
            self.areas.tabs.push(Rect::new(x, area.y, width, 1));
            spans.push(Span::styled(text, style));
            spans.push(Span::raw(" "));
            x = x.saturating_add(width + 1);
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_zoom_bar(&mut self, frame: &mut Frame, area: Rect) {
        let out_label = " − ";
        let in_label = " + ";
        let percent = format!(" {:>3}% ", self.chart.kanban.zoom_percent());
        self.areas.zoom_out = Rect::new(area.x, area.y, 3, 1).intersection(area);
        self.areas.zoom_in = Rect::new(area.x + 3 + percent.chars().count() as u16, area.y, 3, 1)
            .intersection(area);
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(out_label, style_selected()),
                Span::styled(percent, style_title()),
                Span::styled(in_label, style_selected()),
                Span::styled("  scroll to zoom", style_muted()),
            ])),
            area,
        );
    }

    fn draw_navigator(&mut self, frame: &mut Frame, area: Rect, items: &[NavigatorItem]) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(area);

        let list_block = pane_chrome("Solution classes", false, None).style(style_paper());
        let list_area = list_block.inner(chunks[0]);
        frame.render_widget(list_block, chunks[0]);

        self.areas.navigator.clear();
        let active = self.navigator_active.min(items.len().saturating_sub(1));
        let mut y = list_area.y;
        for (i, item) in items.iter().enumerate() {
            // Two rows per entry so long class names stay tappable.
            let rect = Rect::new(list_area.x, y, list_area.width, 2).intersection(list_area);
            if rect.height == 0 {
                break;
            }
            let style = if i == active {
                style_selected()
            } else {
                style_secondary()
            };
            frame.render_widget(
                Paragraph::new(Span::styled(item.solution_class.clone(), style))
                    .wrap(Wrap { trim: true }),
                rect,
            );
            self.areas.navigator.push(rect);
            y = y.saturating_add(2);
        }

        let Some(item) = items.get(active) else {
            return;
        };
        let detail_block = pane_chrome(&item.solution_class, true, None).style(style_paper());
        let detail_area = detail_block.inner(chunks[1]);
        frame.render_widget(detail_block, chunks[1]);
        frame.render_widget(
            Paragraph::new(navigator_lines(item)).wrap(Wrap { trim: false }),
            detail_area,
        );
    }
}

fn bullets<'a>(lines: &mut Vec<Line<'a>>, heading: &'a str, items: &'a Option<Vec<String>>) {
    let Some(items) = items.as_ref().filter(|v| !v.is_empty()) else {
        return;
    };
    lines.push(Line::from(Span::styled(heading, style_muted())));
    for item in items {
        lines.push(Line::from(vec![
            Span::styled(" ► ", style_accent()),
            Span::raw(item.as_str()),
        ]));
    }
}

fn navigator_lines(item: &NavigatorItem) -> Vec<Line<'_>> {
    let heading = style_title().add_modifier(Modifier::UNDERLINED);
    let mut lines = vec![Line::from(Span::styled("Foreign vendors", heading))];
    if !item.foreign_vendors.description.is_empty() {
        lines.push(Line::from(item.foreign_vendors.description.as_str()));
    }
    bullets(&mut lines, "VM solutions", &item.foreign_vendors.vm_solutions);
    bullets(
        &mut lines,
        "Vulnerability scanners",
        &item.foreign_vendors.vulnerability_scanners,
    );
    bullets(&mut lines, "Vendors", &item.foreign_vendors.vendors);

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Domestic product", heading)));
    lines.push(Line::from(Span::styled(item.product_pt.as_str(), style_accent())));

    let cert = &item.certification_and_description;
    if cert.certification.is_some() || !cert.description.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Certification", heading)));
        if let Some(c) = &cert.certification {
            lines.push(Line::from(c.as_str()));
        }
        for d in &cert.description {
            lines.push(Line::from(vec![
                Span::styled(" ► ", style_accent()),
                Span::raw(d.as_str()),
            ]));
        }
    }
    lines
}

impl Component for Dashboards {
    fn id(&self) -> ComponentId {
        ComponentId::Dashboards
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => self.handle_tap(event.column, event.row),
            MouseEventKind::ScrollUp if self.is_kanban() && hit(self.areas.chart, event.column, event.row) => {
                self.chart.kanban.zoom_in();
                vec![]
            }
            MouseEventKind::ScrollDown if self.is_kanban() && hit(self.areas.chart, event.column, event.row) => {
                self.chart.kanban.zoom_out();
                vec![]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _state: &AppState) {
        frame.render_widget(Block::default().style(style_default()), area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        self.draw_header(frame, rows[0]);
        self.draw_tab_bar(frame, rows[1]);

        self.areas.zoom_in = Rect::default();
        self.areas.zoom_out = Rect::default();
        self.areas.navigator.clear();
        self.areas.chart = Rect::default();
        self.areas.fitted = Rect::default();

        let Some(tab) = self.tabs.get(self.active) else {
            self.drawing = None;
            frame.render_widget(
                Paragraph::new(Span::styled(charts::PLACEHOLDER_MESSAGE, style_muted())),
                rows[3],
            );
            return;
        };
        let subtitle = tab.subtitle.clone();
        let dataset = tab.dataset.clone();

        let mut body = rows[3];
        if let TabDataset::Kanban(_) = dataset {
            self.draw_zoom_bar(frame, rows[2]);
        } else {
            frame.render_widget(
                Paragraph::new(Span::styled(subtitle.clone(), style_secondary())),
                rows[2],
            );
        }

        match &dataset {
            TabDataset::Navigator(items) => {
                self.drawing = None;
                self.draw_navigator(frame, body, items);
            }
            other => {
                body = body.inner(ratatui::layout::Margin::new(1, 0));
                self.areas.chart = body;
                self.drawing = charts::render(&subtitle, other, &self.chart);
                if let Some(drawing) = self.drawing.as_ref() {
                    self.areas.fitted = render_drawing(frame, body, drawing);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::HitArea;
    use kiosk_shared::content::{Dashboards as DashboardsContent, DashboardTab};
    use ratatui::{backend::TestBackend, crossterm::event::KeyModifiers, Terminal};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn tab(id: &str, data: serde_json::Value) -> DashboardTab {
        DashboardTab {
            id: id.into(),
            label: id.to_uppercase(),
            subtitle: format!("{} subtitle", id),
            data,
        }
    }

    fn content() -> Content {
        Content {
            dashboards: DashboardsContent {
                tabs: vec![
                    tab(
                        "motivation",
                        json!([{"label": "Money", "value": 60}, {"label": "Espionage", "value": 40}]),
                    ),
                    tab("kanban", json!({"columns": []})),
                    tab(
                        "positive-import",
                        json!([
                            {"solutionClass": "VM", "foreignVendors": {"description": "d"}, "productPT": "MaxPatrol VM", "certificationAndDescription": {}},
                            {"solutionClass": "NGFW", "foreignVendors": {"description": "d"}, "productPT": "PT NGFW", "certificationAndDescription": {}}
                        ]),
                    ),
                    tab("sectors", serde_json::Value::Null),
                ],
            },
            ..Content::default()
        }
    }

    fn tap(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn draw(d: &mut Dashboards, state: &AppState) {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| d.draw(f, f.area(), state)).unwrap();
    }

    fn setup() -> (Dashboards, AppState) {
        let c = content();
        let d = Dashboards::new(&c);
        let state = AppState::new(Arc::new(c), PathBuf::new(), 5);
        (d, state)
    }

    fn centre_cell(d: &Dashboards, key: &str) -> (u16, u16) {
        let drawing = d.drawing.as_ref().unwrap();
        let region = drawing.regions.iter().find(|r| r.key == key).unwrap();
        let HitArea::Rect { x, y, w, h } = region.area else {
            panic!("expected a rect region");
        };
        let fitted = d.areas.fitted;
        let col = fitted.x + ((x + w / 2.0) / drawing.width * f64::from(fitted.width)) as u16;
        let row = fitted.y + ((y + h / 2.0) / drawing.height * f64::from(fitted.height)) as u16;
        (col, row)
    }

    #[test]
    fn test_tabs_parsed_once_at_mount() {
        let (d, _) = setup();
        assert_eq!(d.tabs.len(), 4);
        assert!(matches!(d.tabs[0].dataset, TabDataset::Motivation(_)));
        assert!(matches!(d.tabs[3].dataset, TabDataset::Unavailable(_)));
    }

    #[test]
    fn test_home_button_routes_home() {
        let (mut d, state) = setup();
        draw(&mut d, &state);
        let area = Rect::new(0, 0, 120, 40);
        assert_eq!(
            d.handle_mouse(tap(1, 0), area, &state),
            vec![Action::Route(RouteEvent::Home)]
        );
    }

    #[test]
    fn test_bar_tap_selects_and_tab_switch_resets() {
        let (mut d, state) = setup();
        draw(&mut d, &state);
        let (col, row) = centre_cell(&d, "Money");
        let area = Rect::new(0, 0, 120, 40);
        assert!(d.handle_mouse(tap(col, row), area, &state).is_empty());
        assert_eq!(d.chart.selected.as_deref(), Some("Money"));

        let kanban_tab = d.areas.tabs[1];
        d.handle_mouse(tap(kanban_tab.x, kanban_tab.y), area, &state);
        assert_eq!(d.active, 1);
        assert_eq!(d.chart, ChartState::default());
    }

    #[test]
    fn test_kanban_zoom_buttons_and_scroll() {
        let (mut d, state) = setup();
        let area = Rect::new(0, 0, 120, 40);
        assert!(d.select_tab(1));
        draw(&mut d, &state);
        let zoom_in = d.areas.zoom_in;
        d.handle_mouse(tap(zoom_in.x, zoom_in.y), area, &state);
        assert_eq!(d.chart.kanban.zoom_percent(), 110);

        let chart = d.areas.chart;
        let scroll = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: chart.x + 1,
            row: chart.y + 1,
            modifiers: KeyModifiers::NONE,
        };
        d.handle_mouse(scroll, area, &state);
        d.handle_mouse(scroll, area, &state);
        assert_eq!(d.chart.kanban.zoom_percent(), 90);
    }

    #[test]
    fn test_navigator_item_tap_changes_detail() {
        let (mut d, state) = setup();
        let area = Rect::new(0, 0, 120, 40);
        assert!(d.select_tab(2));
        draw(&mut d, &state);
        assert!(d.drawing.is_none());
        assert_eq!(d.areas.navigator.len(), 2);
        let second = d.areas.navigator[1];
        d.handle_mouse(tap(second.x, second.y), area, &state);
        assert_eq!(d.navigator_active, 1);
    }

    #[test]
    fn test_missing_data_renders_placeholder() {
        let (mut d, state) = setup();
        assert!(d.select_tab(3));
        draw(&mut d, &state);
        let drawing = d.drawing.as_ref().unwrap();
        assert!(drawing.has_text(charts::PLACEHOLDER_MESSAGE));
    }
}
