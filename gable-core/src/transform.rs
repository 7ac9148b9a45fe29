/// Rigid transforms applied in place to scene geometry
use log::debug;

use crate::math::{centroid, Vec3};
use crate::scene::Scene;

/// A principal rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Cumulative rotation applied around each axis (in radians).
///
/// Geometry is rotated incrementally, so this is a record of what has been
/// applied rather than a source of truth for vertex positions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RotationState {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    pub fn record(&mut self, axis: Axis, angle: f64) {
        match axis {
            Axis::X => self.rotate(angle, 0.0, 0.0),
            Axis::Y => self.rotate(0.0, angle, 0.0),
            Axis::Z => self.rotate(0.0, 0.0, angle),
        }
    }
}

/// Rotate points in place around `axis` through the origin.
///
/// Exactly zero is a no-op, so repeated idle frames add no drift.
pub fn rotate_points(axis: Axis, angle: f64, points: &mut [Vec3]) {
    if angle == 0.0 {
        return;
    }
    let (sin, cos) = angle.sin_cos();
    let (i1, i2) = match axis {
        Axis::X => (1, 2),
        Axis::Y => (0, 2),
        Axis::Z => (0, 1),
    };
    for p in points.iter_mut() {
        let (c1, c2) = (p[i1], p[i2]);
        p[i1] = c1 * cos - c2 * sin;
        p[i2] = c1 * sin + c2 * cos;
    }
}

/// Rotate every vertex of every polygon in the scene.
pub fn rotate(axis: Axis, angle: f64, scene: &mut Scene) {
    if angle == 0.0 {
        return;
    }
    for polygon in scene.polygons_mut() {
        rotate_points(axis, angle, polygon.vertices_mut());
    }
}

/// Translate the scene so the centroid of its polygon centroids sits on the
/// y axis. Heights are left untouched.
///
/// Returns the horizontal offset that was removed.
pub fn center_on_axes(scene: &mut Scene) -> Vec3 {
    let centers: Vec<Vec3> = scene.polygons().iter().map(|p| p.centroid()).collect();
    let mut center = centroid(&centers);
    center.y = 0.0;

    for polygon in scene.polygons_mut() {
        for v in polygon.vertices_mut() {
            v.x -= center.x;
            v.z -= center.z;
        }
    }

    debug!("centered scene on axes, offset ({:.3}, {:.3})", center.x, center.z);
    center
}
