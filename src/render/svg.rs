use std::collections::BTreeMap;

use crate::foundation::core::{BezPath, Canvas, EntityId, Margin, Year};
use crate::layout::context::Attributes;
use crate::render::backend::Renderer;

/// Primitive each element is drawn as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    Bar,
    Dot,
}

/// Axis tick in plot-local pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// Chart furniture drawn around the elements. Everything is optional.
#[derive(Clone, Debug, Default)]
pub struct Overlay {
    pub year: Option<Year>,
    pub axis_title: Option<String>,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
    pub trails: Vec<(EntityId, BezPath)>,
    pub cells: Vec<BezPath>,
    pub highlight: Option<EntityId>,
}

/// Retained element set serialized to an SVG document on demand.
#[derive(Clone, Debug)]
pub struct SvgRenderer {
    mark: Mark,
    nodes: BTreeMap<EntityId, Attributes>,
}

impl SvgRenderer {
    pub fn new(mark: Mark) -> Self {
        Self {
            mark,
            nodes: BTreeMap::new(),
        }
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &EntityId) -> Option<&Attributes> {
        self.nodes.get(id)
    }

    /// Serialize the retained elements plus `overlay` for `canvas`.
    pub fn document(&self, canvas: Canvas, margin: Margin, overlay: &Overlay) -> String {
        let (w, h) = margin.inner_size(canvas);
        let mut out = String::with_capacity(4096 + self.nodes.len() * 256);
        out.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{cw}" height="{ch}" viewBox="0 0 {cw} {ch}" font-family="sans-serif" font-size="12">"#,
            cw = canvas.width,
            ch = canvas.height
        ));
        out.push_str(&format!(
            r#"<rect width="{}" height="{}" fill="white"/>"#,
            canvas.width, canvas.height
        ));
        out.push_str(&format!(
            r#"<g transform="translate({},{})">"#,
            num(margin.left),
            num(margin.top)
        ));

        self.push_axes(&mut out, w, h, overlay);
        for (id, path) in &overlay.trails {
            let class = if overlay.highlight.as_ref() == Some(id) {
                "country highlight"
            } else {
                "country"
            };
            let stroke = if overlay.highlight.as_ref() == Some(id) {
                "#d62728"
            } else {
                "#dddddd"
            };
            out.push_str(&format!(
                r#"<path class="{class}" data-id="{}" d="{}" fill="none" stroke="{stroke}"/>"#,
                escape(id.as_str()),
                path.to_svg()
            ));
        }
        for (id, a) in &self.nodes {
            let hl = overlay.highlight.as_ref() == Some(id);
            match self.mark {
                Mark::Bar => push_bar(&mut out, id, a, hl),
                Mark::Dot => push_dot(&mut out, id, a, hl),
            }
        }
        for cell in &overlay.cells {
            out.push_str(&format!(
                r#"<path class="voronoi" d="{}" fill="none" stroke="none" pointer-events="all"/>"#,
                cell.to_svg()
            ));
        }
        if let Some(year) = overlay.year {
            out.push_str(&format!(
                r#"<text class="year" x="-10" y="-10" text-anchor="end" font-size="24" font-weight="bold">{year}</text>"#
            ));
        }
        out.push_str("</g></svg>");
        out
    }

    fn push_axes(&self, out: &mut String, w: f64, h: f64, overlay: &Overlay) {
        if let Some(title) = &overlay.axis_title {
            out.push_str(&format!(
                r#"<text class="axis-title" x="{}" y="-30" text-anchor="middle">{}</text>"#,
                num(w / 2.0),
                escape(title)
            ));
        }
        // Bars carry a short axis above the plot; the scatter grid spans the whole plot.
        let (y1, y2, label_y) = match self.mark {
            Mark::Bar => (-11.0, -5.0, -14.0),
            Mark::Dot => (0.0, h, -3.0),
        };
        for t in &overlay.x_ticks {
            let x = num(t.position);
            out.push_str(&format!(
                r##"<line class="tick x" x1="{x}" x2="{x}" y1="{}" y2="{}" stroke="#cccccc"/><text x="{x}" y="{}" text-anchor="middle" font-size="10">{}</text>"##,
                num(y1),
                num(y2),
                num(label_y),
                escape(&t.label)
            ));
        }
        for t in &overlay.y_ticks {
            let y = num(t.position);
            out.push_str(&format!(
                r##"<line class="tick y" x1="0" x2="{}" y1="{y}" y2="{y}" stroke="#cccccc"/><text x="-3" y="{y}" dy="4" text-anchor="end" font-size="10">{}</text>"##,
                num(w),
                escape(&t.label)
            ));
        }
    }
}

impl Renderer for SvgRenderer {
    fn create(&mut self, id: &EntityId, attrs: &Attributes) {
        self.nodes.insert(id.clone(), *attrs);
    }

    fn update(&mut self, id: &EntityId, attrs: &Attributes) {
        self.nodes.insert(id.clone(), *attrs);
    }

    fn destroy(&mut self, id: &EntityId) {
        self.nodes.remove(id);
    }
}

fn push_bar(out: &mut String, id: &EntityId, a: &Attributes, highlight: bool) {
    let name = escape(id.as_str());
    let stroke = if highlight {
        r#" stroke="black""#
    } else {
        ""
    };
    out.push_str(&format!(
        r#"<g class="bar" data-id="{name}" transform="translate({},0)" opacity="{}"><rect x="{}" y="{}" width="{}" height="{}" fill="{}"{stroke}/><text class="country-label" x="{}" y="{}" dx="-3" dy="{}" text-anchor="end">{name}</text></g>"#,
        num(a.offset_x),
        num(a.opacity),
        num(a.x),
        num(a.y),
        num(a.width),
        num(a.height),
        a.fill.to_hex(),
        num(a.x),
        num(a.y),
        num(a.height / 2.0 + 5.0),
    ));
}

fn push_dot(out: &mut String, id: &EntityId, a: &Attributes, highlight: bool) {
    let name = escape(id.as_str());
    out.push_str(&format!(
        r#"<circle data-id="{name}" cx="{}" cy="{}" r="{}" fill="{}" opacity="{}" transform="translate({},0)"/>"#,
        num(a.x),
        num(a.y),
        num(a.radius),
        a.fill.to_hex(),
        num(a.opacity),
        num(a.offset_x),
    ));
    if highlight {
        out.push_str(&format!(
            r#"<text class="country-label highlight" x="{}" y="{}" dx="-5" dy="4" text-anchor="end">{name}</text>"#,
            num(a.x),
            num(a.y)
        ));
    }
}

/// Fixed-precision number without trailing zeros.
fn num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/svg.rs"]
mod tests;
