/// Vector and 4x4 matrix kernel
///
/// `Mat4` follows the OpenGL fixed-function conventions (glFrustum, glRotate,
/// gluLookAt) and exposes its elements in row-major order: `m(i * 4 + j)` is
/// row `i`, column `j`. Every constructor has an `_into` or `multiply_into`
/// counterpart where reusing storage matters.
use nalgebra::{Matrix4, Point2 as NPoint2, Vector3, Vector4};

use crate::error::RenderError;

/// A point, direction or offset in world space.
pub type Vec3 = Vector3<f64>;

/// A projected point in screen space (pixels, y down).
pub type Point2 = NPoint2<f64>;

/// Arithmetic mean of a set of points. Returns the origin for an empty slice.
pub fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::zeros();
    }
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p);
    sum / points.len() as f64
}

/// Euclidean distance between two points.
pub fn distance(a: &Vec3, b: &Vec3) -> f64 {
    (a - b).norm()
}

/// 4x4 transformation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4(pub Matrix4<f64>);

impl Mat4 {
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// Build from 16 values in row-major order.
    pub fn from_row_major(m: [f64; 16]) -> Self {
        Self(Matrix4::from_row_slice(&m))
    }

    /// Element at row-major index `i` (0..16).
    pub fn m(&self, i: usize) -> f64 {
        self.0[(i / 4, i % 4)]
    }

    /// All elements in row-major order.
    pub fn to_row_major(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.m(i);
        }
        out
    }

    /// Column `index % 4` as a vector.
    pub fn col(&self, index: usize) -> Vector4<f64> {
        self.0.column(index % 4).into_owned()
    }

    /// `self * rhs`. Non-commutative: `rhs` is applied to points first.
    pub fn multiply(&self, rhs: &Mat4) -> Mat4 {
        Mat4(self.0 * rhs.0)
    }

    /// `self * rhs` written into `out` without allocating a new matrix.
    pub fn multiply_into(&self, rhs: &Mat4, out: &mut Mat4) {
        self.0.mul_to(&rhs.0, &mut out.0);
    }

    pub fn transpose(&self) -> Mat4 {
        Mat4(self.0.transpose())
    }

    pub fn transpose_into(&self, out: &mut Mat4) {
        self.0.transpose_to(&mut out.0);
    }

    pub fn scale(x: f64, y: f64, z: f64) -> Mat4 {
        Self::from_row_major([
            x, 0.0, 0.0, 0.0, //
            0.0, y, 0.0, 0.0, //
            0.0, 0.0, z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn translate(x: f64, y: f64, z: f64) -> Mat4 {
        Self::from_row_major([
            1.0, 0.0, 0.0, x, //
            0.0, 1.0, 0.0, y, //
            0.0, 0.0, 1.0, z, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Viewing frustum with the camera at the apex (glFrustum layout).
    pub fn frustum(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Mat4 {
        Self::from_row_major([
            2.0 * near / (right - left),
            0.0,
            (right + left) / (right - left),
            0.0,
            0.0,
            2.0 * near / (top - bottom),
            (top + bottom) / (top - bottom),
            0.0,
            0.0,
            0.0,
            -(far + near) / (far - near),
            -2.0 * far * near / (far - near),
            0.0,
            0.0,
            -1.0,
            0.0,
        ])
    }

    /// Perspective transform. `fov` is the top-to-bottom field of view in radians.
    pub fn perspective(fov: f64, aspect: f64, near: f64, far: f64) -> Result<Mat4, RenderError> {
        if !(fov.is_finite() && aspect.is_finite() && near.is_finite() && far.is_finite()) {
            return Err(RenderError::InvalidFrustum("parameters must be finite".into()));
        }
        if fov <= 0.0 {
            return Err(RenderError::InvalidFrustum(format!("fov must be > 0, got {fov}")));
        }
        if aspect <= 0.0 {
            return Err(RenderError::InvalidFrustum(format!("aspect must be > 0, got {aspect}")));
        }
        if near <= 0.0 || near >= far {
            return Err(RenderError::InvalidFrustum(format!(
                "need 0 < near < far, got near={near} far={far}"
            )));
        }
        let top = (fov / 2.0).tan() * near;
        let right = top * aspect;
        Ok(Self::frustum(-right, right, -top, top, near, far))
    }

    /// Rotation of `angle` degrees around the axis `(x, y, z)`.
    ///
    /// Identity when the angle is zero or the axis has zero length.
    pub fn rotate(angle: f64, x: f64, y: f64, z: f64) -> Mat4 {
        let len = (x * x + y * y + z * z).sqrt();
        if angle == 0.0 || len == 0.0 {
            return Self::identity();
        }
        let (x, y, z) = (x / len, y / len, z / len);
        let a = angle.to_radians();
        let (s, c) = a.sin_cos();
        let t = 1.0 - c;

        Self::from_row_major([
            x * x * t + c,
            x * y * t - z * s,
            x * z * t + y * s,
            0.0,
            y * x * t + z * s,
            y * y * t + c,
            y * z * t - x * s,
            0.0,
            z * x * t - y * s,
            z * y * t + x * s,
            z * z * t + c,
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ])
    }

    /// View matrix placing the camera at `eye`, looking at `center`.
    ///
    /// `up` must not be parallel to `eye - center`.
    pub fn look_at(eye: &Vec3, center: &Vec3, up: &Vec3) -> Mat4 {
        let forward = (eye - center).normalize();
        let right = up.cross(&forward).normalize();
        let true_up = forward.cross(&right).normalize();

        Self::from_row_major([
            right.x,
            right.y,
            right.z,
            -right.dot(eye),
            true_up.x,
            true_up.y,
            true_up.z,
            -true_up.dot(eye),
            forward.x,
            forward.y,
            forward.z,
            -forward.dot(eye),
            0.0,
            0.0,
            0.0,
            1.0,
        ])
    }

    /// Transform a point (w = 1) and return the homogeneous result.
    pub fn transform_point(&self, p: &Vec3) -> Vector4<f64> {
        self.0 * Vector4::new(p.x, p.y, p.z, 1.0)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        self.multiply(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_mat_eq(a: &Mat4, b: &Mat4) {
        for i in 0..16 {
            assert!((a.m(i) - b.m(i)).abs() < EPS, "m[{i}]: {} vs {}", a.m(i), b.m(i));
        }
    }

    fn sample() -> Mat4 {
        Mat4::from_row_major([
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, 12.0, //
            13.0, 14.0, 15.0, 16.0,
        ])
    }

    #[test]
    fn test_row_major_access() {
        let m = sample();
        assert_eq!(m.m(1), 2.0);
        assert_eq!(m.m(4), 5.0);
        assert_eq!(m.to_row_major()[15], 16.0);
        assert_eq!(m.col(1), Vector4::new(2.0, 6.0, 10.0, 14.0));
        assert_eq!(m.col(5), m.col(1));
    }

    #[test]
    fn test_multiply_identity() {
        let m = sample();
        assert_mat_eq(&m.multiply(&Mat4::identity()), &m);
        assert_mat_eq(&Mat4::identity().multiply(&m), &m);
    }

    #[test]
    fn test_multiply_is_row_major_product() {
        let a = sample();
        let b = Mat4::translate(1.0, 2.0, 3.0);
        let ab = a.multiply(&b);
        // row 0 of a dotted with column 3 of b
        assert!((ab.m(3) - (1.0 + 2.0 * 2.0 + 3.0 * 3.0 + 4.0)).abs() < EPS);
        assert_ne!(ab, b.multiply(&a));
    }

    #[test]
    fn test_multiply_into_matches_multiply() {
        let a = sample();
        let b = Mat4::rotate(30.0, 0.0, 1.0, 0.0);
        let mut out = Mat4::identity();
        a.multiply_into(&b, &mut out);
        assert_mat_eq(&out, &a.multiply(&b));
    }

    #[test]
    fn test_transpose_swaps_indices() {
        let m = sample();
        let t = m.transpose();
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(t.m(i * 4 + j), m.m(j * 4 + i));
            }
        }
        let mut out = Mat4::identity();
        m.transpose_into(&mut out);
        assert_eq!(out, t);
    }

    #[test]
    fn test_translate_and_scale_points() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let moved = Mat4::translate(10.0, 20.0, 30.0).transform_point(&p);
        assert_eq!(moved, Vector4::new(11.0, 22.0, 33.0, 1.0));
        let scaled = Mat4::scale(2.0, 3.0, 4.0).transform_point(&p);
        assert_eq!(scaled, Vector4::new(2.0, 6.0, 12.0, 1.0));
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        assert_eq!(Mat4::rotate(0.0, 0.0, 1.0, 0.0), Mat4::identity());
        assert_eq!(Mat4::rotate(45.0, 0.0, 0.0, 0.0), Mat4::identity());
    }

    #[test]
    fn test_rotate_quarter_turn_about_z() {
        let r = Mat4::rotate(90.0, 0.0, 0.0, 2.0);
        let p = r.transform_point(&Vec3::new(1.0, 0.0, 0.0));
        assert!(p.x.abs() < EPS);
        assert!((p.y - 1.0).abs() < EPS);
        assert!(p.z.abs() < EPS);
    }

    #[test]
    fn test_perspective_frustum_terms() {
        let fov = std::f64::consts::FRAC_PI_2;
        let p = Mat4::perspective(fov, 2.0, 1.0, 11.0).unwrap();
        // top = tan(45deg) * near = 1, right = 2
        assert!((p.m(0) - 0.5).abs() < EPS);
        assert!((p.m(5) - 1.0).abs() < EPS);
        assert!((p.m(10) + 1.2).abs() < EPS);
        assert!((p.m(11) + 2.2).abs() < EPS);
        assert_eq!(p.m(14), -1.0);
        assert_eq!(p.m(15), 0.0);
    }

    #[test]
    fn test_perspective_rejects_bad_input() {
        assert!(Mat4::perspective(0.0, 1.0, 1.0, 10.0).is_err());
        assert!(Mat4::perspective(1.0, 1.0, 10.0, 10.0).is_err());
        assert!(Mat4::perspective(1.0, 1.0, 20.0, 10.0).is_err());
        assert!(Mat4::perspective(f64::NAN, 1.0, 1.0, 10.0).is_err());
    }

    #[test]
    fn test_look_at_basis() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let view = Mat4::look_at(&eye, &Vec3::zeros(), &Vec3::new(0.0, 1.0, 0.0));
        let origin = view.transform_point(&Vec3::zeros());
        assert!(origin.x.abs() < EPS);
        assert!(origin.y.abs() < EPS);
        assert!((origin.z + 5.0).abs() < EPS);
        let eye_in_view = view.transform_point(&eye);
        assert!(eye_in_view.xyz().norm() < EPS);
    }

    #[test]
    fn test_centroid_and_distance() {
        let pts = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0)];
        assert_eq!(centroid(&pts), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(centroid(&[]), Vec3::zeros());
        assert!((distance(&Vec3::zeros(), &Vec3::new(3.0, 4.0, 0.0)) - 5.0).abs() < EPS);
    }
}
