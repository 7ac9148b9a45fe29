/// In-memory SVG document surface
use std::collections::HashMap;
use std::fmt::Write;

use crate::geometry::Polygon;
use crate::math::Point2;
use crate::projection::Viewport;
use crate::scene::{PolygonStyle, RenderSurface};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

struct SvgPolygon {
    style: PolygonStyle,
    points: Vec<Point2>,
}

/// A render surface that builds a standalone SVG 1.1 document.
pub struct SvgDocument {
    viewport: Viewport,
    handles: HashMap<String, SvgPolygon>,
    order: Vec<String>,
}

impl SvgDocument {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            handles: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Value of the `points` attribute for `id`, or `None` for unknown ids.
    pub fn points_attr(&self, id: &str) -> Option<String> {
        self.handles.get(id).map(|h| format_points(&h.points))
    }

    /// Serialize the document with polygons in draw order.
    pub fn render(&self) -> String {
        let (w, h) = (self.viewport.width, self.viewport.height);
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            r#"<svg xmlns="{SVG_NS}" version="1.1" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        for id in &self.order {
            if let Some(handle) = self.handles.get(id) {
                let _ = writeln!(
                    out,
                    r#"  <polygon id="{}" points="{}" style="{}"/>"#,
                    id,
                    format_points(&handle.points),
                    handle.style.css()
                );
            }
        }
        out.push_str("</svg>\n");
        out
    }
}

/// `points` attribute value: `x,y` pairs separated by spaces. Fewer than three
/// points cannot form a polygon and produce an empty string.
pub fn format_points(points: &[Point2]) -> String {
    if points.len() < 3 {
        return String::new();
    }
    let mut out = String::with_capacity(points.len() * 16);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:.2},{:.2}", p.x, p.y);
    }
    out
}

impl RenderSurface for SvgDocument {
    fn attach(&mut self, polygon: &Polygon) {
        let handle = SvgPolygon {
            style: PolygonStyle::from_polygon(polygon),
            points: Vec::with_capacity(polygon.vertices().len()),
        };
        if self.handles.insert(polygon.id().to_string(), handle).is_none() {
            self.order.push(polygon.id().to_string());
        }
    }

    fn set_draw_order(&mut self, ids: &[String]) {
        self.order.clear();
        self.order.extend(ids.iter().filter(|id| self.handles.contains_key(*id)).cloned());
    }

    fn update_points(&mut self, id: &str, points: &[Option<Point2>]) {
        if let Some(handle) = self.handles.get_mut(id) {
            handle.points.clear();
            handle.points.extend(points.iter().flatten().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rgb;
    use crate::math::Vec3;

    fn tri(id: &str) -> Polygon {
        Polygon::filled(id, vec![Vec3::zeros(), Vec3::x(), Vec3::y()], Rgb::new(10, 20, 30))
            .unwrap()
    }

    #[test]
    fn test_render_in_draw_order() {
        let mut doc = SvgDocument::new(Viewport::new(100.0, 50.0));
        doc.attach(&tri("a"));
        doc.attach(&tri("b"));
        doc.set_draw_order(&["b".to_string(), "a".to_string(), "zzz".to_string()]);
        doc.update_points(
            "a",
            &[
                Some(Point2::new(1.0, 2.0)),
                Some(Point2::new(3.0, 4.0)),
                Some(Point2::new(5.5, 6.25)),
            ],
        );

        let svg = doc.render();
        assert!(svg.starts_with(
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="100""#
        ));
        let b = svg.find(r#"id="b""#).unwrap();
        let a = svg.find(r#"id="a""#).unwrap();
        assert!(b < a);
        assert!(svg.contains(r#"points="1.00,2.00 3.00,4.00 5.50,6.25""#));
        assert!(svg.contains("fill:rgb(10,20,30);fill-opacity:1"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_skipped_points_are_omitted() {
        let mut doc = SvgDocument::new(Viewport::default());
        let quad = Polygon::filled(
            "q",
            vec![Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::z()],
            Rgb::new(0, 0, 0),
        )
        .unwrap();
        doc.attach(&quad);

        let p = Some(Point2::new(1.0, 1.0));
        doc.update_points("q", &[p, None, p, p]);
        assert_eq!(doc.points_attr("q").unwrap(), "1.00,1.00 1.00,1.00 1.00,1.00");

        doc.update_points("q", &[p, None, None, p]);
        assert_eq!(doc.points_attr("q").unwrap(), "");
        assert!(!doc.render().contains("NaN"));
    }
}
