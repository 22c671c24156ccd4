//! Paints a chart [`Drawing`] on a braille `Canvas` and maps pointer cells
//! back into drawing coordinates.
//!
//! Drawings are y-down; the canvas is y-up, so every y is flipped against the
//! drawing height.  Filled shapes are sampled at braille-dot resolution.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points, Rectangle},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::charts::{Anchor, Drawing, HitArea, Rgb, Shape};

/// Chart paper colour; opacities blend against it.
pub const PAPER: Rgb = Rgb::WHITE;

/// Text smaller than this fraction of a terminal row is not printed.
const MIN_TEXT_ROWS: f64 = 0.35;

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Largest sub-rectangle of `area` with the drawing's aspect ratio, centred.
/// Terminal cells are treated as twice as tall as they are wide.
pub fn fitted_area(drawing: &Drawing, area: Rect) -> Rect {
    if drawing.width <= 0.0 || drawing.height <= 0.0 || area.width == 0 || area.height == 0 {
        return Rect::new(area.x, area.y, 0, 0);
    }
    let scale = (f64::from(area.width) / drawing.width)
        .min(f64::from(area.height) * 2.0 / drawing.height);
    let width = ((drawing.width * scale).round() as u16).clamp(1, area.width);
    let height = ((drawing.height * scale / 2.0).round() as u16).clamp(1, area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Drawing coordinates at the centre of terminal cell `(column, row)`, or
/// `None` outside the fitted area.
pub fn pointer_to_drawing(drawing: &Drawing, fitted: Rect, column: u16, row: u16) -> Option<(f64, f64)> {
    if fitted.width == 0
        || fitted.height == 0
        || column < fitted.x
        || row < fitted.y
        || column >= fitted.x + fitted.width
        || row >= fitted.y + fitted.height
    {
        return None;
    }
    let fx = (f64::from(column - fitted.x) + 0.5) / f64::from(fitted.width);
    let fy = (f64::from(row - fitted.y) + 0.5) / f64::from(fitted.height);
    Some((fx * drawing.width, fy * drawing.height))
}

/// Hit-test a pointer cell against the drawing's regions.
pub fn hit_at<'a>(drawing: &'a Drawing, fitted: Rect, column: u16, row: u16) -> Option<&'a str> {
    let (x, y) = pointer_to_drawing(drawing, fitted, column, row)?;
    drawing.hit(x, y)
}

pub fn polygon_contains(points: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Render `drawing` into `area`, letterboxed to its aspect ratio.
/// Returns the fitted rectangle for later pointer mapping.
pub fn render_drawing(frame: &mut Frame, area: Rect, drawing: &Drawing) -> Rect {
    let fitted = fitted_area(drawing, area);
    if fitted.width > 0 && fitted.height > 0 {
        frame.render_widget(drawing_canvas(drawing, fitted), fitted);
    }
    fitted
}

pub fn drawing_canvas<'a>(
    drawing: &'a Drawing,
    fitted: Rect,
) -> Canvas<'a, impl Fn(&mut Context) + 'a> {
    let painter = Painter::new(drawing, fitted);
    Canvas::default()
        .marker(Marker::Braille)
        .background_color(color(PAPER))
        .x_bounds([0.0, drawing.width])
        .y_bounds([0.0, drawing.height])
        .paint(move |ctx| painter.paint(ctx))
}

struct Painter<'a> {
    drawing: &'a Drawing,
    /// Drawing units per braille dot.
    dot: (f64, f64),
    /// Drawing units per terminal cell.
    cell: (f64, f64),
}

impl<'a> Painter<'a> {
    fn new(drawing: &'a Drawing, fitted: Rect) -> Self {
        let cols = f64::from(fitted.width.max(1));
        let rows = f64::from(fitted.height.max(1));
        Self {
            drawing,
            dot: (drawing.width / (cols * 2.0), drawing.height / (rows * 4.0)),
            cell: (drawing.width / cols, drawing.height / rows),
        }
    }

    fn flip(&self, y: f64) -> f64 {
        self.drawing.height - y
    }

    fn paint(&self, ctx: &mut Context) {
        // Fills first, outlines next, text last.
        for shape in &self.drawing.shapes {
            self.fill(ctx, shape);
        }
        ctx.layer();
        for shape in &self.drawing.shapes {
            self.stroke(ctx, shape);
        }
        ctx.layer();
        for shape in &self.drawing.shapes {
            if let Shape::Text {
                at,
                text,
                size,
                color: c,
                anchor,
                bold,
            } = shape
            {
                self.text(ctx, *at, text, *size, *c, *anchor, *bold);
            }
        }
    }

    /// Sample every braille dot inside `bbox` and plot those `inside` accepts.
    fn sample(
        &self,
        ctx: &mut Context,
        bbox: (f64, f64, f64, f64),
        fill: Rgb,
        inside: impl Fn(f64, f64) -> bool,
    ) {
        let (x0, y0, x1, y1) = bbox;
        let mut coords = Vec::new();
        let mut y = (y0 / self.dot.1).floor() * self.dot.1 + self.dot.1 / 2.0;
        while y <= y1 {
            let mut x = (x0 / self.dot.0).floor() * self.dot.0 + self.dot.0 / 2.0;
            while x <= x1 {
                if inside(x, y) {
                    coords.push((x, self.flip(y)));
                }
                x += self.dot.0;
            }
            y += self.dot.1;
        }
        if !coords.is_empty() {
            ctx.draw(&Points {
                coords: &coords,
                color: color(fill),
            });
        }
    }

    fn fill(&self, ctx: &mut Context, shape: &Shape) {
        match shape {
            Shape::Polygon {
                points,
                fill,
                opacity,
            } => {
                let bbox = points.iter().fold(
                    (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
                    |(a, b, c, d), &(x, y)| (a.min(x), b.min(y), c.max(x), d.max(y)),
                );
                self.sample(ctx, bbox, fill.over(PAPER, *opacity), |x, y| {
                    polygon_contains(points, x, y)
                });
            }
            Shape::Rect {
                x,
                y,
                w,
                h,
                fill: Some(fill),
                opacity,
                ..
            } => {
                self.sample(ctx, (*x, *y, x + w, y + h), fill.over(PAPER, *opacity), |_, _| {
                    true
                });
            }
            Shape::Circle {
                center, r, fill, ..
            } => {
                let (cx, cy, r) = (center.0, center.1, *r);
                self.sample(ctx, (cx - r, cy - r, cx + r, cy + r), *fill, |x, y| {
                    (x - cx).hypot(y - cy) <= r
                });
            }
            Shape::Ring {
                center,
                inner,
                outer,
                start,
                end,
                fill,
                opacity,
            } => {
                let area = HitArea::Ring {
                    center: *center,
                    inner: *inner,
                    outer: *outer,
                    start: *start,
                    end: *end,
                };
                let bbox = (
                    center.0 - outer,
                    center.1 - outer,
                    center.0 + outer,
                    center.1 + outer,
                );
                self.sample(ctx, bbox, fill.over(PAPER, *opacity), |x, y| {
                    area.contains(x, y)
                });
            }
            _ => {}
        }
    }

    fn stroke(&self, ctx: &mut Context, shape: &Shape) {
        let line = |ctx: &mut Context, a: (f64, f64), b: (f64, f64), c: Rgb| {
            ctx.draw(&CanvasLine {
                x1: a.0,
                y1: self.flip(a.1),
                x2: b.0,
                y2: self.flip(b.1),
                color: color(c),
            });
        };
        match shape {
            Shape::Line { from, to, color: c, .. } => line(ctx, *from, *to, *c),
            Shape::Polyline { points, color: c, .. } => {
                for pair in points.windows(2) {
                    line(ctx, pair[0], pair[1], *c);
                }
            }
            Shape::Rect {
                x,
                y,
                w,
                h,
                stroke: Some(c),
                ..
            } => ctx.draw(&Rectangle {
                x: *x,
                y: self.flip(y + h),
                width: *w,
                height: *h,
                color: color(*c),
            }),
            Shape::Circle {
                center,
                r,
                stroke: Some(c),
                ..
            } => ctx.draw(&Circle {
                x: center.0,
                y: self.flip(center.1),
                radius: *r,
                color: color(*c),
            }),
            _ => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &self,
        ctx: &mut Context,
        at: (f64, f64),
        text: &str,
        size: f64,
        fg: Rgb,
        anchor: Anchor,
        bold: bool,
    ) {
        if text.is_empty() || size / self.cell.1 < MIN_TEXT_ROWS {
            return;
        }
        let span_width = text.width() as f64 * self.cell.0;
        let x = match anchor {
            Anchor::Start => at.0,
            Anchor::Middle => at.0 - span_width / 2.0,
            Anchor::End => at.0 - span_width,
        }
        .clamp(0.0, self.drawing.width);
        let mut style = Style::default().fg(color(fg)).bg(color(PAPER));
        if bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        ctx.print(x, self.flip(at.1), Span::styled(text.to_string(), style));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{buffer::Buffer, widgets::Widget};

    fn drawing(w: f64, h: f64) -> Drawing {
        Drawing::new(w, h)
    }

    #[test]
    fn test_fit_preserves_aspect_with_tall_cells() {
        // 2:1 drawing in a 100x50 area: 100 cells wide means 25 rows tall.
        let fitted = fitted_area(&drawing(200.0, 100.0), Rect::new(0, 0, 100, 50));
        assert_eq!(fitted, Rect::new(0, 12, 100, 25));

        // Width-limited by height instead.
        let fitted = fitted_area(&drawing(100.0, 100.0), Rect::new(10, 0, 100, 20));
        assert_eq!(fitted, Rect::new(40, 0, 40, 20));
    }

    #[test]
    fn test_empty_area_fits_nothing() {
        let fitted = fitted_area(&drawing(100.0, 100.0), Rect::new(3, 4, 0, 10));
        assert_eq!(fitted.width, 0);
        assert_eq!(pointer_to_drawing(&drawing(100.0, 100.0), fitted, 3, 4), None);
    }

    #[test]
    fn test_pointer_maps_to_cell_centre() {
        let d = drawing(100.0, 50.0);
        let fitted = Rect::new(10, 5, 10, 5);
        assert_eq!(pointer_to_drawing(&d, fitted, 10, 5), Some((5.0, 5.0)));
        assert_eq!(pointer_to_drawing(&d, fitted, 19, 9), Some((95.0, 45.0)));
        assert_eq!(pointer_to_drawing(&d, fitted, 20, 9), None);
        assert_eq!(pointer_to_drawing(&d, fitted, 9, 5), None);
    }

    #[test]
    fn test_hit_through_pointer() {
        let mut d = drawing(100.0, 50.0);
        d.region("bar", HitArea::Rect { x: 50.0, y: 0.0, w: 50.0, h: 50.0 });
        let fitted = Rect::new(0, 0, 10, 5);
        assert_eq!(hit_at(&d, fitted, 7, 2), Some("bar"));
        assert_eq!(hit_at(&d, fitted, 2, 2), None);
    }

    #[test]
    fn test_polygon_contains() {
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!(polygon_contains(&square, 5.0, 5.0));
        assert!(!polygon_contains(&square, 15.0, 5.0));
        assert!(!polygon_contains(&square[..2], 5.0, 0.0));
    }

    #[test]
    fn test_text_lands_in_buffer() {
        let mut d = drawing(400.0, 100.0);
        d.push(Shape::text((0.0, 50.0), "Hello", 20.0, Rgb::INK));
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        drawing_canvas(&d, area).render(area, &mut buf);
        let rows: Vec<String> = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .filter_map(|x| buf.cell((x, y)).map(|c| c.symbol().to_string()))
                    .collect()
            })
            .collect();
        assert!(rows.iter().any(|r| r.contains("Hello")), "{:?}", rows);
    }
}
