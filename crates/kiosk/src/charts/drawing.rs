//! Resolution-independent vector model the dashboard charts render into.
//!
//! Coordinates follow SVG conventions: origin top-left, y grows downward,
//! angles in radians measured clockwise from 3 o'clock.  The same drawing is
//! painted on the terminal canvas, exported as SVG and hit-tested.

use std::f64::consts::TAU;
use std::fmt::Write as _;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
    pub const RED: Rgb = Rgb(0xFF, 0x00, 0x00);
    pub const SLATE: Rgb = Rgb(0x6A, 0x7F, 0x98);
    pub const INK: Rgb = Rgb(0x44, 0x53, 0x6A);

    /// Parse `#RRGGBB` or `#RGB`.
    pub fn from_hex(s: &str) -> Option<Rgb> {
        let hex = s.trim().strip_prefix('#')?;
        let channel = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
        match hex.len() {
            6 => Some(Rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
            3 => {
                let expand = |v: u8| v * 17;
                Some(Rgb(
                    expand(channel(0, 1)?),
                    expand(channel(1, 1)?),
                    expand(channel(2, 1)?),
                ))
            }
            _ => None,
        }
    }

    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// Blend toward `background` as if drawn with the given opacity.
    pub fn over(self, background: Rgb, opacity: f64) -> Rgb {
        let a = opacity.clamp(0.0, 1.0);
        let mix = |f: u8, b: u8| (f64::from(f) * a + f64::from(b) * (1.0 - a)).round() as u8;
        Rgb(
            mix(self.0, background.0),
            mix(self.1, background.1),
            mix(self.2, background.2),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Start,
    Middle,
    End,
}

impl Anchor {
    fn svg(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Rgb,
        width: f64,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        color: Rgb,
        width: f64,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        fill: Rgb,
        opacity: f64,
    },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
        radius: f64,
        opacity: f64,
    },
    Circle {
        center: (f64, f64),
        r: f64,
        fill: Rgb,
        stroke: Option<Rgb>,
    },
    /// Annular segment between two radii, `start..end` clockwise.
    Ring {
        center: (f64, f64),
        inner: f64,
        outer: f64,
        start: f64,
        end: f64,
        fill: Rgb,
        opacity: f64,
    },
    Text {
        at: (f64, f64),
        text: String,
        size: f64,
        color: Rgb,
        anchor: Anchor,
        bold: bool,
    },
}

impl Shape {
    pub fn line(from: (f64, f64), to: (f64, f64), color: Rgb) -> Shape {
        Shape::Line {
            from,
            to,
            color,
            width: 1.0,
        }
    }

    pub fn text(at: (f64, f64), text: impl Into<String>, size: f64, color: Rgb) -> Shape {
        Shape::Text {
            at,
            text: text.into(),
            size,
            color,
            anchor: Anchor::Start,
            bold: false,
        }
    }

    pub fn centered_text(at: (f64, f64), text: impl Into<String>, size: f64, color: Rgb) -> Shape {
        Shape::Text {
            at,
            text: text.into(),
            size,
            color,
            anchor: Anchor::Middle,
            bold: false,
        }
    }

    pub fn filled_rect(x: f64, y: f64, w: f64, h: f64, fill: Rgb, opacity: f64) -> Shape {
        Shape::Rect {
            x,
            y,
            w,
            h,
            fill: Some(fill),
            stroke: None,
            radius: 0.0,
            opacity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitArea {
    Rect { x: f64, y: f64, w: f64, h: f64 },
    Ring {
        center: (f64, f64),
        inner: f64,
        outer: f64,
        start: f64,
        end: f64,
    },
}

impl HitArea {
    pub fn contains(&self, px: f64, py: f64) -> bool {
        match *self {
            HitArea::Rect { x, y, w, h } => px >= x && px <= x + w && py >= y && py <= y + h,
            HitArea::Ring {
                center,
                inner,
                outer,
                start,
                end,
            } => {
                let (dx, dy) = (px - center.0, py - center.1);
                let dist = dx.hypot(dy);
                if dist < inner || dist > outer {
                    return false;
                }
                let sweep = end - start;
                if sweep >= TAU {
                    return true;
                }
                (dy.atan2(dx) - start).rem_euclid(TAU) <= sweep
            }
        }
    }
}

/// An interactive element, keyed by the data label it represents.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRegion {
    pub key: String,
    pub area: HitArea,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub width: f64,
    pub height: f64,
    pub shapes: Vec<Shape>,
    pub regions: Vec<HitRegion>,
}

impl Drawing {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            shapes: Vec::new(),
            regions: Vec::new(),
        }
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn region(&mut self, key: impl Into<String>, area: HitArea) {
        self.regions.push(HitRegion {
            key: key.into(),
            area,
        });
    }

    /// Key of the topmost region under the point, if any.
    pub fn hit(&self, x: f64, y: f64) -> Option<&str> {
        let key = self
            .regions
            .iter()
            .rev()
            .find(|r| r.area.contains(x, y))
            .map(|r| r.key.as_str());
        debug!("drawing: hit ({:.0}, {:.0}) -> {:?}", x, y, key);
        key
    }

    /// Shown for tabs whose data is missing, empty or malformed.
    pub fn placeholder(subtitle: &str, message: &str) -> Drawing {
        let mut d = Drawing::new(1200.0, 600.0);
        d.push(Shape::Text {
            at: (600.0, 200.0),
            text: subtitle.to_string(),
            size: 40.0,
            color: Rgb::INK,
            anchor: Anchor::Middle,
            bold: true,
        });
        d.push(Shape::centered_text((600.0, 320.0), message, 24.0, Rgb::SLATE));
        d
    }

    /// Whether any text shape carries exactly `text`.
    pub fn has_text(&self, text: &str) -> bool {
        self.shapes
            .iter()
            .any(|s| matches!(s, Shape::Text { text: t, .. } if t == text))
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = num(self.width),
            h = num(self.height)
        );
        for shape in &self.shapes {
            out.push_str("  ");
            write_shape(&mut out, shape);
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }
}

fn write_shape(out: &mut String, shape: &Shape) {
    let _ = match shape {
        Shape::Line {
            from,
            to,
            color,
            width,
        } => write!(
            out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
            num(from.0),
            num(from.1),
            num(to.0),
            num(to.1),
            color.hex(),
            num(*width)
        ),
        Shape::Polyline {
            points,
            color,
            width,
        } => write!(
            out,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
            points_attr(points),
            color.hex(),
            num(*width)
        ),
        Shape::Polygon {
            points,
            fill,
            opacity,
        } => write!(
            out,
            r#"<polygon points="{}" fill="{}" fill-opacity="{}"/>"#,
            points_attr(points),
            fill.hex(),
            num(*opacity)
        ),
        Shape::Rect {
            x,
            y,
            w,
            h,
            fill,
            stroke,
            radius,
            opacity,
        } => write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}" stroke="{}" opacity="{}"/>"#,
            num(*x),
            num(*y),
            num(*w),
            num(*h),
            num(*radius),
            fill.map(Rgb::hex).unwrap_or_else(|| "none".into()),
            stroke.map(Rgb::hex).unwrap_or_else(|| "none".into()),
            num(*opacity)
        ),
        Shape::Circle {
            center,
            r,
            fill,
            stroke,
        } => write!(
            out,
            r#"<circle cx="{}" cy="{}" r="{}" fill="{}" stroke="{}"/>"#,
            num(center.0),
            num(center.1),
            num(*r),
            fill.hex(),
            stroke.map(Rgb::hex).unwrap_or_else(|| "none".into())
        ),
        Shape::Ring {
            center,
            inner,
            outer,
            start,
            end,
            fill,
            opacity,
        } => write!(
            out,
            r#"<path d="{}" fill="{}" opacity="{}"/>"#,
            ring_path(*center, *inner, *outer, *start, *end),
            fill.hex(),
            num(*opacity)
        ),
        Shape::Text {
            at,
            text,
            size,
            color,
            anchor,
            bold,
        } => write!(
            out,
            r#"<text x="{}" y="{}" font-size="{}" fill="{}" text-anchor="{}"{}>{}</text>"#,
            num(at.0),
            num(at.1),
            num(*size),
            color.hex(),
            anchor.svg(),
            if *bold { r#" font-weight="bold""# } else { "" },
            escape(text)
        ),
    };
}

fn ring_path(c: (f64, f64), inner: f64, outer: f64, start: f64, end: f64) -> String {
    // A full circle cannot be expressed as a single arc.
    let end = if end - start >= TAU { start + TAU - 1e-4 } else { end };
    let large = if end - start > std::f64::consts::PI { 1 } else { 0 };
    let p = |r: f64, a: f64| (c.0 + r * a.cos(), c.1 + r * a.sin());
    let (os, oe, ie, is) = (p(outer, start), p(outer, end), p(inner, end), p(inner, start));
    format!(
        "M {} {} A {} {} 0 {} 1 {} {} L {} {} A {} {} 0 {} 0 {} {} Z",
        num(os.0),
        num(os.1),
        num(outer),
        num(outer),
        large,
        num(oe.0),
        num(oe.1),
        num(ie.0),
        num(ie.1),
        num(inner),
        num(inner),
        large,
        num(is.0),
        num(is.1)
    )
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", num(*x), num(*y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Two decimals, trailing zeros trimmed.
fn num(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
