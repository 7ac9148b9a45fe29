/// Half-block cell rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use gable_core::{Point2, Polygon, PolygonStyle, RenderSurface, Rgb};
use std::collections::HashMap;
use std::io::Write;

/// Upper half block: foreground paints the top pixel, background the bottom.
const HALF_BLOCK: char = '\u{2580}';

struct CellPolygon {
    style: PolygonStyle,
    points: Vec<Point2>,
}

/// Rasterizes projected polygons into a pixel grid two pixels tall per
/// terminal cell.
///
/// There is no depth buffer: polygons are filled in draw order, so later
/// polygons overdraw earlier ones.
pub struct CellRenderer {
    width: usize,
    height: usize,
    pixels: Vec<Option<Rgb>>,
    handles: HashMap<String, CellPolygon>,
    order: Vec<String>,
}

impl CellRenderer {
    /// `columns` x `rows` terminal cells.
    pub fn new(columns: usize, rows: usize) -> Self {
        let (width, height) = (columns, rows * 2);
        Self {
            width,
            height,
            pixels: vec![None; width * height],
            handles: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Pixel grid size, which is also the viewport the session projects into.
    pub fn pixel_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, columns: usize, rows: usize) {
        self.width = columns;
        self.height = rows * 2;
        self.pixels = vec![None; self.width * self.height];
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            None
        }
    }

    /// Repaint the pixel grid from the current handles.
    pub fn rasterize(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = None);
        for id in &self.order {
            let Some(handle) = self.handles.get(id) else {
                continue;
            };
            if handle.points.len() < 3 {
                continue;
            }
            match handle.style {
                PolygonStyle::Fill { color, .. } => {
                    fill_polygon(&mut self.pixels, self.width, self.height, &handle.points, color)
                }
                PolygonStyle::Stroke { color, .. } => {
                    stroke_polygon(&mut self.pixels, self.width, self.height, &handle.points, color)
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let rows = self.height / 2;
        for row in 0..rows {
            for x in 0..self.width {
                let top = self.pixels[(row * 2) * self.width + x];
                let bottom = self.pixels[(row * 2 + 1) * self.width + x];
                writer.queue(SetForegroundColor(to_color(top)))?;
                writer.queue(SetBackgroundColor(to_color(bottom)))?;
                writer.queue(Print(HALF_BLOCK))?;
            }
            writer.queue(ResetColor)?;
            if row + 1 < rows {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderSurface for CellRenderer {
    fn attach(&mut self, polygon: &Polygon) {
        let handle = CellPolygon {
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

fn to_color(pixel: Option<Rgb>) -> Color {
    match pixel {
        Some(Rgb { r, g, b }) => Color::Rgb { r, g, b },
        None => Color::Reset,
    }
}

/// Scanline fill: a pixel is inside when its center is crossed by an odd
/// number of edges to its left.
fn fill_polygon(
    pixels: &mut [Option<Rgb>],
    width: usize,
    height: usize,
    points: &[Point2],
    color: Rgb,
) {
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min).floor().max(0.0) as usize;
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max).ceil();
    if max_y < 0.0 {
        return;
    }
    let max_y = (max_y as usize).min(height.saturating_sub(1));

    let mut crossings = Vec::with_capacity(points.len());
    for y in min_y..=max_y {
        let sy = y as f64 + 0.5;
        crossings.clear();
        for (i, a) in points.iter().enumerate() {
            let b = &points[(i + 1) % points.len()];
            if (a.y <= sy && b.y > sy) || (b.y <= sy && a.y > sy) {
                crossings.push(a.x + (sy - a.y) / (b.y - a.y) * (b.x - a.x));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().max(0.0) as usize;
            let end = (span[1] - 0.5).floor();
            if end < 0.0 {
                continue;
            }
            let end = (end as usize).min(width.saturating_sub(1));
            for x in start..=end {
                pixels[y * width + x] = Some(color);
            }
        }
    }
}

/// Outline the polygon, closing it back to the first point.
fn stroke_polygon(
    pixels: &mut [Option<Rgb>],
    width: usize,
    height: usize,
    points: &[Point2],
    color: Rgb,
) {
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        let Some((a, b)) = clip_segment(*a, *b, width as f64, height as f64) else {
            continue;
        };
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().max(1.0) as usize;
        for s in 0..=steps {
            let t = s as f64 / steps as f64;
            let x = (a.x + (b.x - a.x) * t).floor();
            let y = (a.y + (b.y - a.y) * t).floor();
            if x >= 0.0 && y >= 0.0 && (x as usize) < width && (y as usize) < height {
                pixels[y as usize * width + x as usize] = Some(color);
            }
        }
    }
}

/// Liang-Barsky clip of segment `a`-`b` to the box `[0, width] x [0, height]`.
///
/// Keeps the stepping in [`stroke_polygon`] bounded by the grid size no matter
/// how far off screen a vertex projected.
fn clip_segment(a: Point2, b: Point2, width: f64, height: f64) -> Option<(Point2, Point2)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [(-d.x, a.x), (d.x, width - a.x), (-d.y, a.y), (d.y, height - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((a + d * t0, a + d * t1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gable_core::Vec3;

    fn square(id: &str, color: Rgb, stroke: f64) -> Polygon {
        Polygon::new(
            id,
            vec![Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::z()],
            color,
            1.0,
            stroke,
            false,
        )
        .unwrap()
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Option<Point2>> {
        vec![
            Some(Point2::new(x0, y0)),
            Some(Point2::new(x1, y0)),
            Some(Point2::new(x1, y1)),
            Some(Point2::new(x0, y1)),
        ]
    }

    #[test]
    fn test_pixel_grid_is_double_height() {
        let renderer = CellRenderer::new(10, 4);
        assert_eq!(renderer.pixel_size(), (10, 8));
    }

    #[test]
    fn test_later_polygons_overdraw() {
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        let mut renderer = CellRenderer::new(10, 5);
        renderer.attach(&square("back", red, 0.0));
        renderer.attach(&square("front", blue, 0.0));
        renderer.update_points("back", &rect(0.0, 0.0, 10.0, 10.0));
        renderer.update_points("front", &rect(2.0, 2.0, 6.0, 6.0));

        renderer.set_draw_order(&["back".to_string(), "front".to_string()]);
        renderer.rasterize();
        assert_eq!(renderer.pixel(0, 0), Some(red));
        assert_eq!(renderer.pixel(3, 3), Some(blue));

        renderer.set_draw_order(&["front".to_string(), "back".to_string()]);
        renderer.rasterize();
        assert_eq!(renderer.pixel(3, 3), Some(red));
    }

    #[test]
    fn test_stroke_only_outlines() {
        let green = Rgb::new(0, 255, 0);
        let mut renderer = CellRenderer::new(10, 5);
        renderer.attach(&square("outline", green, 1.0));
        renderer.update_points("outline", &rect(1.0, 1.0, 8.0, 8.0));
        renderer.rasterize();
        assert_eq!(renderer.pixel(1, 1), Some(green));
        assert_eq!(renderer.pixel(4, 4), None);
    }

    #[test]
    fn test_stroke_clips_far_vertices() {
        let green = Rgb::new(0, 255, 0);
        let mut renderer = CellRenderer::new(10, 5);
        renderer.attach(&square("spike", green, 1.0));
        renderer.update_points(
            "spike",
            &[
                Some(Point2::new(1.0, 1.0)),
                Some(Point2::new(1.0e12, 1.0)),
                Some(Point2::new(1.0e12, 1.0e12)),
                Some(Point2::new(1.0, 8.0)),
            ],
        );
        renderer.rasterize();
        assert_eq!(renderer.pixel(5, 1), Some(green));
        assert_eq!(renderer.pixel(9, 1), Some(green));
        assert_eq!(renderer.pixel(1, 5), Some(green));
    }

    #[test]
    fn test_clip_segment() {
        let inside = clip_segment(Point2::new(1.0, 1.0), Point2::new(3.0, 2.0), 10.0, 10.0);
        assert_eq!(inside, Some((Point2::new(1.0, 1.0), Point2::new(3.0, 2.0))));

        let (a, b) =
            clip_segment(Point2::new(-10.0, 5.0), Point2::new(20.0, 5.0), 10.0, 10.0).unwrap();
        assert!(a.x.abs() < 1e-9 && (b.x - 10.0).abs() < 1e-9);
        assert_eq!((a.y, b.y), (5.0, 5.0));

        assert!(clip_segment(Point2::new(-5.0, -5.0), Point2::new(-1.0, 20.0), 10.0, 10.0)
            .is_none());
    }

    #[test]
    fn test_offscreen_and_partial_polygons_are_safe() {
        let mut renderer = CellRenderer::new(4, 2);
        renderer.attach(&square("big", Rgb::new(1, 1, 1), 0.0));
        renderer.update_points("big", &rect(-100.0, -100.0, 100.0, 100.0));
        renderer.rasterize();
        assert_eq!(renderer.pixel(3, 3), Some(Rgb::new(1, 1, 1)));

        let (a, b) = (Some(Point2::new(1.0, 1.0)), Some(Point2::new(2.0, 2.0)));
        renderer.update_points("big", &[a, None, None, b]);
        renderer.rasterize();
        assert_eq!(renderer.pixel(1, 1), None);

        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        assert!(!out.is_empty());
    }
}
