//! Incident share by sector: donut with leader-line labels and a legend.

use std::f64::consts::{FRAC_PI_2, TAU};

use kiosk_shared::content::SectorShare;

use super::drawing::{Anchor, Drawing, HitArea, Rgb, Shape};

const SIZE: (f64, f64) = (1700.0, 1100.0);
const CENTER: (f64, f64) = (600.0, 550.0);
const OUTER: f64 = 320.0;
const INNER: f64 = 250.0;
const LEADER_BEND: f64 = 80.0;
const LEGEND_X: f64 = 1260.0;
const LEGEND_ROW: f64 = 60.0;

/// Whole-percent share of `value` in `total`.
pub fn percentage(value: f64, total: f64) -> i64 {
    if total <= 0.0 {
        return 0;
    }
    (value / total * 100.0).round() as i64
}

pub fn render(shares: &[SectorShare], selected: Option<&str>) -> Drawing {
    let mut d = Drawing::new(SIZE.0, SIZE.1);
    let total: f64 = shares.iter().map(|s| s.value.max(0.0)).sum();
    let mut angle = -FRAC_PI_2;

    for share in shares {
        let sweep = if total > 0.0 {
            share.value.max(0.0) / total * TAU
        } else {
            0.0
        };
        let (start, end) = (angle, angle + sweep);
        angle = end;
        let color = Rgb::from_hex(&share.color).unwrap_or(Rgb::SLATE);
        let active = selected == Some(share.label.as_str());
        let dimmed = selected.is_some() && !active;

        d.push(Shape::Ring {
            center: CENTER,
            inner: INNER,
            outer: if active { OUTER + 12.0 } else { OUTER },
            start,
            end,
            fill: color,
            opacity: if dimmed { 0.5 } else { 1.0 },
        });
        d.region(
            share.label.clone(),
            HitArea::Ring {
                center: CENTER,
                inner: INNER,
                outer: OUTER,
                start,
                end,
            },
        );

        // Leader line: radial out of the segment middle, then horizontal.
        let mid = (start + end) / 2.0;
        let at = |r: f64| (CENTER.0 + r * mid.cos(), CENTER.1 + r * mid.sin());
        let origin = at(OUTER);
        let bend = at(OUTER + LEADER_BEND);
        let direction = if mid.cos() > 0.0 { 1.0 } else { -1.0 };
        let mut length = (share.label.chars().count() as f64 * 8.0 + 80.0).max(120.0);
        if active {
            length += 30.0;
        }
        let end_x = bend.0 + direction * length;
        d.push(Shape::Polyline {
            points: vec![origin, bend, (end_x, bend.1)],
            color: Rgb::RED,
            width: 2.0,
        });

        let anchor = if direction > 0.0 { Anchor::End } else { Anchor::Start };
        let size = if active { 22.0 } else { 18.0 };
        d.push(Shape::Text {
            at: (end_x, bend.1 - 18.0),
            text: share.label.clone(),
            size,
            color: Rgb::INK,
            anchor,
            bold: active,
        });
        d.push(Shape::Text {
            at: (end_x, bend.1 + size),
            text: format!("{}%", percentage(share.value, total)),
            size,
            color: Rgb::RED,
            anchor,
            bold: active,
        });
    }

    d.push(Shape::Text {
        at: CENTER,
        text: "Incidents".to_string(),
        size: 48.0,
        color: Rgb::INK,
        anchor: Anchor::Middle,
        bold: true,
    });

    let legend_top = CENTER.1 - shares.len() as f64 * LEGEND_ROW / 2.0;
    for (i, share) in shares.iter().enumerate() {
        let y = legend_top + i as f64 * LEGEND_ROW;
        let color = Rgb::from_hex(&share.color).unwrap_or(Rgb::SLATE);
        let active = selected == Some(share.label.as_str());
        d.push(Shape::filled_rect(LEGEND_X, y, 28.0, 28.0, color, 1.0));
        d.push(Shape::Text {
            at: (LEGEND_X + 44.0, y + 22.0),
            text: share.label.clone(),
            size: 22.0,
            color: Rgb::INK,
            anchor: Anchor::Start,
            bold: active,
        });
        d.region(
            share.label.clone(),
            HitArea::Rect {
                x: LEGEND_X,
                y,
                w: SIZE.0 - LEGEND_X,
                h: LEGEND_ROW - 8.0,
            },
        );
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(label: &str, value: f64) -> SectorShare {
        SectorShare {
            label: label.to_string(),
            value,
            color: "#FF0000".to_string(),
        }
    }

    fn sample() -> Vec<SectorShare> {
        vec![share("Energy", 1.0), share("Finance", 1.0), share("Retail", 2.0)]
    }

    fn opacities(d: &Drawing) -> Vec<f64> {
        d.shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Ring { opacity, .. } => Some(*opacity),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_percentages_round() {
        assert_eq!(percentage(1.0, 3.0), 33);
        assert_eq!(percentage(2.0, 3.0), 67);
        assert_eq!(percentage(1.0, 0.0), 0);
        let d = render(&sample(), None);
        assert!(d.has_text("25%"));
        assert!(d.has_text("50%"));
    }

    #[test]
    fn test_first_segment_starts_at_twelve_oclock() {
        let d = render(&sample(), None);
        // Just right of the top of the ring belongs to the first sector.
        assert_eq!(d.hit(CENTER.0 + 5.0, CENTER.1 - 280.0), Some("Energy"));
        // Left half is the last (largest) sector.
        assert_eq!(d.hit(CENTER.0 - 280.0, CENTER.1), Some("Retail"));
        // The hole is not interactive.
        assert_eq!(d.hit(CENTER.0, CENTER.1), None);
    }

    #[test]
    fn test_selection_dims_the_rest() {
        assert_eq!(opacities(&render(&sample(), None)), vec![1.0, 1.0, 1.0]);
        assert_eq!(
            opacities(&render(&sample(), Some("Finance"))),
            vec![0.5, 1.0, 0.5]
        );
    }

    #[test]
    fn test_legend_rows_are_hit_targets() {
        let d = render(&sample(), None);
        let top = CENTER.1 - 3.0 * LEGEND_ROW / 2.0;
        assert_eq!(d.hit(LEGEND_X + 10.0, top + LEGEND_ROW + 10.0), Some("Finance"));
    }

    #[test]
    fn test_bad_colour_falls_back() {
        let mut shares = sample();
        shares[0].color = "tomato".into();
        let d = render(&shares, None);
        assert!(d.shapes.iter().any(|s| matches!(
            s,
            Shape::Ring { fill, .. } if *fill == Rgb::SLATE
        )));
    }
}
