//! Attacker motivation: vertical bars on a fixed 0..70 axis.

use kiosk_shared::content::MotivationBar;

use super::drawing::{Anchor, Drawing, HitArea, Rgb, Shape};
use super::{fmt_value, PlotArea};

const SIZE: (f64, f64) = (2700.0, 1400.0);
const PADDING: [f64; 4] = [80.0, 100.0, 150.0, 180.0];
const MAX_VALUE: f64 = 70.0;
const BAR_WIDTH: f64 = 320.0;
const LABEL_LINE: f64 = 48.0;

pub fn render(bars: &[MotivationBar], selected: Option<&str>) -> Drawing {
    let mut d = Drawing::new(SIZE.0, SIZE.1);
    let area = PlotArea::new(SIZE, PADDING, MAX_VALUE);
    let grid: Vec<f64> = (0..8u8).rev().map(|i| f64::from(i) * 10.0).collect();
    area.grid(&mut d, &grid, fmt_value, 36.0);
    area.axes(&mut d);

    let n = bars.len() as f64;
    let spacing = (area.width - BAR_WIDTH * n) / (n + 1.0);
    for (i, bar) in bars.iter().enumerate() {
        let x = area.left + spacing + (BAR_WIDTH + spacing) * i as f64;
        let y = area.y(bar.value);
        let h = area.bottom() - y;
        let active = selected == Some(bar.label.as_str());

        d.push(Shape::Rect {
            x,
            y,
            w: BAR_WIDTH,
            h,
            fill: Some(Rgb(0xFF, 0x64, 0x64)),
            stroke: active.then_some(Rgb::RED),
            radius: 16.0,
            opacity: if active { 1.0 } else { 0.8 },
        });
        d.push(Shape::Text {
            at: (x + BAR_WIDTH / 2.0, y - 20.0),
            text: fmt_value(bar.value),
            size: if active { 108.0 } else { 48.0 },
            color: Rgb::INK,
            anchor: Anchor::Middle,
            bold: true,
        });
        for (line_no, line) in bar.label.split('\n').enumerate() {
            d.push(Shape::centered_text(
                (
                    x + BAR_WIDTH / 2.0,
                    area.bottom() + 50.0 + line_no as f64 * LABEL_LINE,
                ),
                line,
                36.0,
                Rgb::INK,
            ));
        }
        d.region(
            bar.label.clone(),
            HitArea::Rect {
                x,
                y: y.min(area.bottom() - 40.0),
                w: BAR_WIDTH,
                h: h.max(40.0),
            },
        );
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars() -> Vec<MotivationBar> {
        vec![
            MotivationBar {
                label: "Financial\ngain".into(),
                value: 35.0,
            },
            MotivationBar {
                label: "Espionage".into(),
                value: 70.0,
            },
        ]
    }

    fn rects(d: &Drawing) -> Vec<(f64, f64, f64)> {
        d.shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Rect { x, y, h, .. } => Some((*x, *y, *h)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_bar_height_is_proportional_to_fixed_max() {
        let d = render(&bars(), None);
        let r = rects(&d);
        // Plot height 1170: 35/70 is half, 70/70 is full.
        assert_eq!(r[0].2, 585.0);
        assert_eq!(r[1].2, 1170.0);
        assert_eq!(r[1].1, 80.0);
    }

    #[test]
    fn test_bars_are_evenly_spaced() {
        let d = render(&bars(), None);
        let r = rects(&d);
        // (2420 - 640) / 3 between and around two bars.
        let spacing = (2420.0 - 640.0) / 3.0;
        assert!((r[0].0 - (180.0 + spacing)).abs() < 1e-9);
        assert!((r[1].0 - r[0].0 - (320.0 + spacing)).abs() < 1e-9);
    }

    #[test]
    fn test_multiline_labels_split() {
        let d = render(&bars(), None);
        assert!(d.has_text("Financial"));
        assert!(d.has_text("gain"));
        assert!(!d.has_text("Financial\ngain"));
    }

    #[test]
    fn test_selected_value_is_emphasized() {
        let d = render(&bars(), Some("Espionage"));
        let size = d.shapes.iter().find_map(|s| match s {
            Shape::Text { text, size, .. } if text == "70" && *size > 40.0 => Some(*size),
            _ => None,
        });
        assert_eq!(size, Some(108.0));
        let mid = rects(&d)[1].0 + 100.0;
        assert_eq!(d.hit(mid, 600.0), Some("Espionage"));
    }
}
