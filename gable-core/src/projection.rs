/// Camera and projection utilities
use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::math::{Mat4, Point2, Vec3};
use crate::scene::Scene;

/// Denominators smaller than this are treated as zero.
pub const PROJECTION_EPSILON: f64 = 1e-9;

/// Camera placement.
///
/// `position` is the offset added to world coordinates before the depth
/// divide, so the point the scene is seen from is `-position` (see
/// [`ProjectionStrategy::eye`]). Zoom moves `position.z`; rotation moves the
/// geometry, never the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
}

impl Camera {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vec3::new(x, y, z),
        }
    }
}

/// Size of the render surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn min_dimension(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn center(&self) -> Point2 {
        Point2::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Project a world point with the pinhole formula.
///
/// `fov` is used as a linear divisor of the smaller viewport dimension, not as
/// an angle. Points whose depth term `point.z + camera.z` is within
/// [`PROJECTION_EPSILON`] of zero, or whose result is not finite, are
/// reported as [`RenderError::DegenerateProjection`].
pub fn project(
    point: &Vec3,
    camera: &Camera,
    viewport: &Viewport,
    fov: f64,
) -> Result<Point2, RenderError> {
    let scale = viewport.min_dimension() / fov;
    let zw = point.z + camera.position.z;
    if zw.abs() < PROJECTION_EPSILON {
        return Err(RenderError::DegenerateProjection { zw });
    }

    let x = viewport.width / 2.0 + scale * (point.x + camera.position.x) / zw;
    let y = viewport.height / 2.0 + scale * (point.y + camera.position.y) / zw;
    if !(x.is_finite() && y.is_finite()) {
        return Err(RenderError::DegenerateProjection { zw });
    }
    Ok(Point2::new(x, y))
}

/// How world points reach the screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionStrategy {
    /// [`project`]: linear divide by depth, `fov` as a raw divisor.
    #[default]
    SimplePinhole,
    /// Perspective frustum times a look-at view matrix, `fov` in radians.
    MatrixPerspective { near: f64, far: f64 },
}

impl ProjectionStrategy {
    /// The world-space point this strategy renders the scene from.
    pub fn eye(&self, camera: &Camera) -> Vec3 {
        -camera.position
    }

    /// Check the parameters that do not depend on the frame.
    pub fn validate(&self) -> Result<(), RenderError> {
        match *self {
            Self::SimplePinhole => Ok(()),
            Self::MatrixPerspective { near, far } => {
                if near.is_finite() && far.is_finite() && near > 0.0 && near < far {
                    Ok(())
                } else {
                    Err(RenderError::InvalidFrustum(format!(
                        "need 0 < near < far, got near={near} far={far}"
                    )))
                }
            }
        }
    }

    /// Fix the per-frame parameters so points can be projected in a tight loop.
    pub fn prepare(
        &self,
        camera: &Camera,
        viewport: &Viewport,
        fov: f64,
    ) -> Result<Projector, RenderError> {
        match *self {
            Self::SimplePinhole => Ok(Projector::Pinhole {
                camera: *camera,
                viewport: *viewport,
                fov,
            }),
            Self::MatrixPerspective { near, far } => {
                let eye = self.eye(camera);
                let view = Mat4::look_at(&eye, &(eye - Vec3::z()), &Vec3::y());
                let projection = Mat4::perspective(fov, viewport.aspect(), near, far)?;
                Ok(Projector::Matrix {
                    mvp: projection.multiply(&view),
                    viewport: *viewport,
                })
            }
        }
    }

    pub fn project(
        &self,
        point: &Vec3,
        camera: &Camera,
        viewport: &Viewport,
        fov: f64,
    ) -> Result<Point2, RenderError> {
        self.prepare(camera, viewport, fov)?.project(point)
    }
}

/// A strategy bound to one frame's camera, viewport and field of view.
#[derive(Debug, Clone, Copy)]
pub enum Projector {
    Pinhole { camera: Camera, viewport: Viewport, fov: f64 },
    Matrix { mvp: Mat4, viewport: Viewport },
}

impl Projector {
    pub fn project(&self, point: &Vec3) -> Result<Point2, RenderError> {
        match self {
            Self::Pinhole { camera, viewport, fov } => project(point, camera, viewport, *fov),
            Self::Matrix { mvp, viewport } => {
                let clip = mvp.transform_point(point);
                // Points at or behind the eye have no meaningful image.
                if clip.w <= PROJECTION_EPSILON {
                    return Err(RenderError::DegenerateProjection { zw: clip.w });
                }
                let ndc_x = clip.x / clip.w;
                let ndc_y = clip.y / clip.w;

                let x = (ndc_x + 1.0) * 0.5 * viewport.width;
                let y = (1.0 - ndc_y) * 0.5 * viewport.height;
                if !(x.is_finite() && y.is_finite()) {
                    return Err(RenderError::DegenerateProjection { zw: clip.w });
                }
                Ok(Point2::new(x, y))
            }
        }
    }
}

/// Outcome of one paint pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintStats {
    pub projected: usize,
    pub skipped: usize,
}

/// Recompute the screen points of every polygon in place.
///
/// Each vertex writes to the slot with its own index; vertices that cannot be
/// projected leave `None` so no NaN reaches the surface. Fails only when the
/// strategy itself cannot be set up (e.g. an invalid frustum).
pub fn paint(
    scene: &mut Scene,
    camera: &Camera,
    viewport: &Viewport,
    fov: f64,
    strategy: &ProjectionStrategy,
) -> Result<PaintStats, RenderError> {
    let projector = strategy.prepare(camera, viewport, fov)?;
    Ok(paint_with(scene, &projector))
}

/// [`paint`] with a projector that is already set up; cannot fail.
pub fn paint_with(scene: &mut Scene, projector: &Projector) -> PaintStats {
    let mut stats = PaintStats::default();

    scene.for_each_with_screen(|polygon, screen| {
        for (slot, vertex) in screen.points_mut().iter_mut().zip(polygon.vertices()) {
            match projector.project(vertex) {
                Ok(point) => {
                    *slot = Some(point);
                    stats.projected += 1;
                }
                Err(err) => {
                    trace!("skipping vertex of '{}': {}", polygon.id(), err);
                    *slot = None;
                    stats.skipped += 1;
                }
            }
        }
    });

    stats
}
