//! Import substitution: paired foreign/domestic bars per year, 0..100 %.

use kiosk_shared::content::ImportGroup;

use super::drawing::{Anchor, Drawing, HitArea, Rgb, Shape};
use super::{fmt_value, PlotArea};

const SIZE: (f64, f64) = (2700.0, 1400.0);
const PADDING: [f64; 4] = [80.0, 100.0, 220.0, 180.0];
const MAX_VALUE: f64 = 100.0;
const GROUP_WIDTH: f64 = 680.0;
const BAR_WIDTH: f64 = 320.0;
const BAR_GAP: f64 = 40.0;
/// Shares at or above this get the large label.
const BIG_LABEL_FROM: f64 = 70.0;

pub fn render(groups: &[ImportGroup], selected: Option<&str>) -> Drawing {
    let mut d = Drawing::new(SIZE.0, SIZE.1);
    let area = PlotArea::new(SIZE, PADDING, MAX_VALUE);
    let grid: Vec<f64> = (0..11u8).rev().map(|i| f64::from(i) * 10.0).collect();
    area.grid(&mut d, &grid, |v| format!("{}%", fmt_value(v)), 36.0);
    area.axes(&mut d);

    let n = groups.len() as f64;
    let spacing = (area.width - GROUP_WIDTH * n) / (n + 1.0);
    for (i, group) in groups.iter().enumerate() {
        let gx = area.left + spacing + (GROUP_WIDTH + spacing) * i as f64;
        let active = selected == Some(group.year.as_str());
        let bars = [
            (gx, group.foreign, Rgb::SLATE, "Foreign"),
            (gx + BAR_WIDTH + BAR_GAP, group.domestic, Rgb::RED, "Domestic"),
        ];
        for (x, value, color, caption) in bars {
            let y = area.y(value);
            d.push(Shape::Rect {
                x,
                y,
                w: BAR_WIDTH,
                h: area.bottom() - y,
                fill: Some(color),
                stroke: None,
                radius: 16.0,
                opacity: 0.5,
            });
            let big = value >= BIG_LABEL_FROM;
            d.push(Shape::Text {
                at: (x + BAR_WIDTH / 2.0, y - if big { 10.0 } else { 35.0 }),
                text: format!("{}%", fmt_value(value)),
                size: if big { 96.0 } else { 64.0 },
                color: Rgb::INK,
                anchor: Anchor::Middle,
                bold: true,
            });
            let cx = x + BAR_WIDTH / 2.0;
            d.push(Shape::centered_text((cx, area.bottom() + 40.0), caption, 36.0, Rgb(0, 0, 0)));
            d.push(Shape::centered_text((cx, area.bottom() + 85.0), "solutions", 36.0, Rgb(0, 0, 0)));
        }

        let underline = if active { Rgb::RED } else { Rgb::INK };
        d.push(Shape::Line {
            from: (gx, area.bottom() + 110.0),
            to: (gx + GROUP_WIDTH, area.bottom() + 110.0),
            color: underline,
            width: 3.0,
        });
        d.push(Shape::Text {
            at: (gx + GROUP_WIDTH / 2.0, area.bottom() + 170.0),
            text: group.year.clone(),
            size: 64.0,
            color: underline,
            anchor: Anchor::Middle,
            bold: true,
        });
        d.region(
            group.year.clone(),
            HitArea::Rect {
                x: gx,
                y: area.top,
                w: GROUP_WIDTH,
                h: area.height + 180.0,
            },
        );
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<ImportGroup> {
        vec![
            ImportGroup {
                year: "2022".into(),
                foreign: 80.0,
                domestic: 20.0,
            },
            ImportGroup {
                year: "2025".into(),
                foreign: 30.0,
                domestic: 70.0,
            },
        ]
    }

    #[test]
    fn test_percent_axis_and_labels() {
        let d = render(&groups(), None);
        assert!(d.has_text("100%"));
        assert!(d.has_text("0%"));
        assert!(d.has_text("80%"));
        assert!(d.has_text("2025"));
    }

    #[test]
    fn test_bars_scale_to_hundred() {
        let d = render(&groups(), None);
        let heights: Vec<f64> = d
            .shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Rect { h, .. } => Some(*h),
                _ => None,
            })
            .collect();
        // Plot height 1100.
        let expected = [880.0, 220.0, 330.0, 770.0];
        assert_eq!(heights.len(), expected.len());
        for (h, e) in heights.iter().zip(expected) {
            assert!((h - e).abs() < 1e-6, "{} != {}", h, e);
        }
    }

    #[test]
    fn test_groups_keyed_by_year() {
        let d = render(&groups(), None);
        let keys: Vec<_> = d.regions.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2022", "2025"]);
    }
}
