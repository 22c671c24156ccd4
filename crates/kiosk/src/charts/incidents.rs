//! Incident growth: line + area chart on a fixed 0..5000 axis.

use kiosk_shared::content::IncidentPoint;

use super::drawing::{Anchor, Drawing, HitArea, Rgb, Shape};
use super::{fmt_value, PlotArea};

const SIZE: (f64, f64) = (1800.0, 850.0);
const PADDING: [f64; 4] = [100.0, 60.0, 60.0, 100.0];
const MAX_VALUE: f64 = 5000.0;
/// The shaded area starts at this value, not at zero.
const AREA_BASELINE: f64 = 1000.0;
const MARKER_RADIUS: f64 = 13.0;

pub fn render(points: &[IncidentPoint], selected: Option<&str>) -> Drawing {
    let mut d = Drawing::new(SIZE.0, SIZE.1);
    let area = PlotArea::new(SIZE, PADDING, MAX_VALUE);

    area.grid(
        &mut d,
        &[5000.0, 4000.0, 3000.0, 2000.0, 1000.0, 0.0],
        fmt_value,
        20.0,
    );
    area.axes(&mut d);

    let step = if points.len() > 1 {
        area.width / (points.len() - 1) as f64
    } else {
        0.0
    };
    let x_of = |i: usize| {
        if points.len() == 1 {
            area.left + area.width / 2.0
        } else {
            area.left + i as f64 * step
        }
    };
    let coords: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (x_of(i), area.y(p.value)))
        .collect();

    if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
        let base = area.y(AREA_BASELINE);
        let mut polygon = vec![(first.0, base)];
        polygon.extend(coords.iter().copied());
        polygon.push((last.0, base));
        d.push(Shape::Polygon {
            points: polygon,
            fill: Rgb::RED,
            opacity: 0.3,
        });
    }
    d.push(Shape::Polyline {
        points: coords.clone(),
        color: Rgb::RED,
        width: 3.0,
    });

    for (i, (p, &(x, y))) in points.iter().zip(&coords).enumerate() {
        let key = p.year.to_string();
        d.push(Shape::line((x, y), (x, area.bottom()), Rgb::RED.over(Rgb::WHITE, 0.3)));
        d.push(Shape::Text {
            at: (x, area.bottom() + 35.0),
            text: key.clone(),
            size: 20.0,
            color: Rgb(0, 0, 0),
            anchor: if i == 0 { Anchor::Start } else { Anchor::Middle },
            bold: false,
        });

        // The first year is the reference point: no marker, no labels.
        if i == 0 {
            continue;
        }
        let active = selected == Some(key.as_str());
        d.push(Shape::Circle {
            center: (x, y),
            r: if active { MARKER_RADIUS * 1.5 } else { MARKER_RADIUS },
            fill: Rgb::RED,
            stroke: Some(Rgb::WHITE),
        });
        d.push(Shape::Line {
            from: (x, y - 17.0),
            to: (x, y - 90.0),
            color: Rgb::RED,
            width: 2.0,
        });
        d.push(Shape::Text {
            at: (x - 10.0, y - 65.0),
            text: fmt_value(p.value),
            size: 32.0,
            color: Rgb::INK,
            anchor: Anchor::End,
            bold: true,
        });
        d.push(Shape::Text {
            at: (x - 10.0, y - 35.0),
            text: format!("+{}%", fmt_value(p.growth)),
            size: 24.0,
            color: Rgb::RED,
            anchor: Anchor::End,
            bold: active,
        });
        d.region(
            key,
            HitArea::Rect {
                x: x - 40.0,
                y: y - 100.0,
                w: 80.0,
                h: 140.0,
            },
        );
    }
    d
}
