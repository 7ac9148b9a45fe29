/// Polygon collections, their screen-space buffers, and the render surface contract
use std::collections::HashMap;

use crate::error::RenderError;
use crate::geometry::{Polygon, Rgb};
use crate::math::Point2;

/// Projected points for one polygon, one slot per vertex.
///
/// A slot is `None` when that vertex could not be projected this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenPolygon {
    points: Vec<Option<Point2>>,
}

impl ScreenPolygon {
    fn with_len(len: usize) -> Self {
        Self {
            points: vec![None; len],
        }
    }

    pub fn points(&self) -> &[Option<Point2>] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [Option<Point2>] {
        &mut self.points
    }

    /// The points that survived projection, in vertex order.
    pub fn visible(&self) -> impl Iterator<Item = Point2> + '_ {
        self.points.iter().flatten().copied()
    }
}

/// Polygons in draw order plus their screen buffers.
#[derive(Debug, Clone)]
pub struct Scene {
    polygons: Vec<Polygon>,
    screen: HashMap<String, ScreenPolygon>,
}

impl Scene {
    pub fn new(polygons: Vec<Polygon>) -> Result<Self, RenderError> {
        let mut screen = HashMap::with_capacity(polygons.len());
        for polygon in &polygons {
            let buffer = ScreenPolygon::with_len(polygon.vertices().len());
            if screen.insert(polygon.id().to_string(), buffer).is_some() {
                return Err(RenderError::DuplicatePolygonId(polygon.id().to_string()));
            }
        }
        Ok(Self { polygons, screen })
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn polygons_mut(&mut self) -> &mut [Polygon] {
        &mut self.polygons
    }

    pub fn polygon(&self, id: &str) -> Option<&Polygon> {
        self.polygons.iter().find(|p| p.id() == id)
    }

    pub fn screen(&self, id: &str) -> Option<&ScreenPolygon> {
        self.screen.get(id)
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Polygon ids in their current order.
    pub fn draw_order(&self) -> Vec<String> {
        self.polygons.iter().map(|p| p.id().to_string()).collect()
    }

    /// Reorder polygons in place with a stable sort.
    pub(crate) fn sort_polygons_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Polygon, &Polygon) -> std::cmp::Ordering,
    {
        self.polygons.sort_by(compare);
    }

    /// Visit each polygon, in order, alongside its screen buffer.
    pub(crate) fn for_each_with_screen<F>(&mut self, mut visit: F)
    where
        F: FnMut(&Polygon, &mut ScreenPolygon),
    {
        for polygon in &self.polygons {
            if let Some(buffer) = self.screen.get_mut(polygon.id()) {
                visit(polygon, buffer);
            }
        }
    }
}

/// How a polygon is drawn: filled, or outlined with a stroke width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolygonStyle {
    Fill { color: Rgb, opacity: f64 },
    Stroke { color: Rgb, opacity: f64, width: f64 },
}

impl PolygonStyle {
    pub fn from_polygon(polygon: &Polygon) -> Self {
        if polygon.stroke() > 0.0 {
            Self::Stroke {
                color: polygon.color(),
                opacity: polygon.opacity(),
                width: polygon.stroke(),
            }
        } else {
            Self::Fill {
                color: polygon.color(),
                opacity: polygon.opacity(),
            }
        }
    }

    pub fn color(&self) -> Rgb {
        match *self {
            Self::Fill { color, .. } | Self::Stroke { color, .. } => color,
        }
    }

    /// Inline SVG `style` attribute value.
    pub fn css(&self) -> String {
        match self {
            Self::Fill { color, opacity } => {
                format!("fill:{};fill-opacity:{}", color.css(), opacity)
            }
            Self::Stroke { color, opacity, width } => {
                format!("stroke:{};stroke-opacity:{};stroke-width:{}", color.css(), opacity, width)
            }
        }
    }
}

/// A drawing target that keeps one handle per polygon.
///
/// Handles are created once by [`RenderSurface::attach`]; afterwards only
/// their draw order and point lists change.
pub trait RenderSurface {
    /// Create the handle for `polygon`, styled from its color, opacity and stroke.
    fn attach(&mut self, polygon: &Polygon);

    /// Restack handles so `ids[0]` is drawn first (furthest back).
    fn set_draw_order(&mut self, ids: &[String]);

    /// Replace the point list of the handle for `id`. `None` slots are skipped.
    fn update_points(&mut self, id: &str, points: &[Option<Point2>]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn tri(id: &str) -> Polygon {
        Polygon::filled(id, vec![Vec3::zeros(), Vec3::x(), Vec3::y()], Rgb::new(1, 2, 3)).unwrap()
    }

    #[test]
    fn test_screen_buffers_match_vertex_count() {
        let scene = Scene::new(vec![tri("a"), tri("b")]).unwrap();
        assert_eq!(scene.screen("a").unwrap().points().len(), 3);
        assert_eq!(scene.draw_order(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Scene::new(vec![tri("a"), tri("a")]).unwrap_err();
        assert_eq!(err, RenderError::DuplicatePolygonId("a".into()));
    }

    #[test]
    fn test_style_css() {
        let fill = PolygonStyle::from_polygon(&tri("a"));
        assert_eq!(fill.css(), "fill:rgb(1,2,3);fill-opacity:1");

        let outlined = Polygon::new(
            "o",
            vec![Vec3::zeros(), Vec3::x(), Vec3::y()],
            Rgb::new(9, 8, 7),
            0.5,
            2.0,
            false,
        )
        .unwrap();
        assert_eq!(
            PolygonStyle::from_polygon(&outlined).css(),
            "stroke:rgb(9,8,7);stroke-opacity:0.5;stroke-width:2"
        );
    }
}
