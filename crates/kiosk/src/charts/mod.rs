//! Dashboard chart renderers.
//!
//! Every renderer is a pure function of the tab subtitle, its dataset and
//! the local selection; the result is a [`Drawing`] in chart units.

pub mod drawing;
pub mod import;
pub mod incidents;
pub mod kanban;
pub mod motivation;
pub mod sectors;

use kiosk_shared::content::TabDataset;

pub use drawing::{Anchor, Drawing, HitArea, Rgb, Shape};
pub use kanban::KanbanView;

pub const PLACEHOLDER_MESSAGE: &str = "In development";

/// Per-tab interactive state.  Reset whenever the dashboards view mounts or
/// the active tab changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartState {
    /// Key of the emphasized bar, segment or point.
    pub selected: Option<String>,
    pub kanban: KanbanView,
}

impl ChartState {
    /// Apply a tap that landed on `key` (or on empty chart space) and report
    /// whether anything changed.
    pub fn tap(&mut self, dataset: &TabDataset, key: Option<&str>) -> bool {
        match dataset {
            // Segments toggle; taps outside the ring are ignored.
            TabDataset::Sectors(_) => match key {
                Some(k) if self.selected.as_deref() == Some(k) => {
                    self.selected = None;
                    true
                }
                Some(k) => {
                    self.selected = Some(k.to_string());
                    true
                }
                None => false,
            },
            // Bars select; empty space clears.
            TabDataset::Motivation(_) | TabDataset::Incidents(_) | TabDataset::Import(_) => {
                let next = key.map(str::to_string);
                if next == self.selected {
                    return false;
                }
                self.selected = next;
                true
            }
            TabDataset::Kanban(_) => match key {
                Some(k) => {
                    self.kanban.toggle(k);
                    true
                }
                None => false,
            },
            TabDataset::Navigator(_) | TabDataset::Unavailable(_) => false,
        }
    }
}

/// Render a dataset.  The navigator is a text layout and has no drawing.
pub fn render(subtitle: &str, dataset: &TabDataset, state: &ChartState) -> Option<Drawing> {
    let selected = state.selected.as_deref();
    let drawing = match dataset {
        TabDataset::Incidents(points) => incidents::render(points, selected),
        TabDataset::Sectors(shares) => sectors::render(shares, selected),
        TabDataset::Motivation(bars) => motivation::render(bars, selected),
        TabDataset::Import(groups) => import::render(groups, selected),
        TabDataset::Kanban(board) => kanban::render(board, &state.kanban),
        TabDataset::Navigator(_) => return None,
        TabDataset::Unavailable(_) => Drawing::placeholder(subtitle, PLACEHOLDER_MESSAGE),
    };
    Some(drawing)
}

/// Plot area inside a chart's padding, with a fixed value axis.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub max: f64,
}

impl PlotArea {
    pub fn new(size: (f64, f64), padding: [f64; 4], max: f64) -> Self {
        let [top, right, bottom, left] = padding;
        Self {
            left,
            top,
            width: size.0 - left - right,
            height: size.1 - top - bottom,
            max,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Y of `value`, clamped to the axis range.
    pub fn y(&self, value: f64) -> f64 {
        let ratio = (value / self.max).clamp(0.0, 1.0);
        self.bottom() - ratio * self.height
    }

    /// Horizontal grid lines with right-aligned labels at the given values.
    pub fn grid(&self, d: &mut Drawing, values: &[f64], label: impl Fn(f64) -> String, size: f64) {
        let grid = Rgb::RED.over(Rgb::WHITE, 0.2);
        for &v in values {
            let y = self.y(v);
            d.push(Shape::line((self.left, y), (self.right(), y), grid));
            d.push(Shape::Text {
                at: (self.left - 20.0, y),
                text: label(v),
                size,
                color: Rgb::INK,
                anchor: Anchor::End,
                bold: false,
            });
        }
    }

    /// Left and bottom axis lines.
    pub fn axes(&self, d: &mut Drawing) {
        d.push(Shape::Line {
            from: (self.left, self.top),
            to: (self.left, self.bottom()),
            color: Rgb::SLATE,
            width: 3.0,
        });
        d.push(Shape::Line {
            from: (self.left, self.bottom()),
            to: (self.right(), self.bottom()),
            color: Rgb::SLATE,
            width: 3.0,
        });
    }
}

/// Integers without a fractional part, otherwise one decimal.
pub(crate) fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.1}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_shared::content::{MotivationBar, SectorShare};

    fn sectors() -> TabDataset {
        TabDataset::Sectors(vec![SectorShare {
            label: "Energy".into(),
            value: 1.0,
            color: "#FF0000".into(),
        }])
    }

    #[test]
    fn test_sector_taps_toggle() {
        let ds = sectors();
        let mut state = ChartState::default();
        assert!(state.tap(&ds, Some("Energy")));
        assert_eq!(state.selected.as_deref(), Some("Energy"));
        assert!(state.tap(&ds, Some("Energy")));
        assert_eq!(state.selected, None);
        assert!(!state.tap(&ds, None));
    }

    #[test]
    fn test_bar_taps_select_and_background_clears() {
        let ds = TabDataset::Motivation(vec![MotivationBar {
            label: "Money".into(),
            value: 10.0,
        }]);
        let mut state = ChartState::default();
        assert!(state.tap(&ds, Some("Money")));
        assert!(!state.tap(&ds, Some("Money")));
        assert!(state.tap(&ds, None));
        assert_eq!(state.selected, None);
    }

    #[test]
    fn test_unavailable_renders_placeholder() {
        let ds = TabDataset::Unavailable("no data".into());
        let d = render("Kanban", &ds, &ChartState::default()).expect("drawing");
        assert!(d.has_text(PLACEHOLDER_MESSAGE));
        assert!(d.has_text("Kanban"));
    }

    #[test]
    fn test_navigator_has_no_drawing() {
        let ds = TabDataset::Navigator(Vec::new());
        assert!(render("Navigator", &ds, &ChartState::default()).is_none());
    }

    #[test]
    fn test_plot_area_scales_and_clamps() {
        let area = PlotArea::new((1800.0, 850.0), [100.0, 60.0, 60.0, 100.0], 5000.0);
        assert_eq!(area.width, 1640.0);
        assert_eq!(area.height, 690.0);
        assert_eq!(area.y(0.0), 790.0);
        assert_eq!(area.y(5000.0), 100.0);
        assert_eq!(area.y(9000.0), 100.0);
        assert_eq!(area.y(2500.0), 445.0);
    }

    #[test]
    fn test_fmt_value() {
        assert_eq!(fmt_value(42.0), "42");
        assert_eq!(fmt_value(12.5), "12.5");
    }
}
