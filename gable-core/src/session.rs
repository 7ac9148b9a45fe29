/// Interactive render session: owns all per-viewer state and runs frames
use std::f64::consts::PI;

use log::{debug, trace};
use rand::Rng;

use crate::config::ViewerConfig;
use crate::depth::reorder;
use crate::error::{ConfigError, RenderError};
use crate::geometry::{build_building, BuildingSpec};
use crate::projection::{paint_with, Camera, PaintStats, ProjectionStrategy, Viewport};
use crate::scene::{RenderSurface, Scene};
use crate::schedule::{FrameScheduler, ManualScheduler, RepaintSlot};
use crate::transform::{center_on_axes, rotate, Axis, RotationState};

/// Camera distance along z, bounded by the building size.
///
/// Values are negative; `closest` is the upper bound and `farthest` the lower.
/// Both bounds are exclusive for wheel input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    pub value: f64,
    pub closest: f64,
    pub farthest: f64,
}

impl Zoom {
    pub fn for_building(spec: &BuildingSpec, min_factor: f64, max_factor: f64) -> Self {
        let max_dimension = spec.max_dimension();
        let closest = -min_factor * max_dimension;
        Self {
            value: closest,
            closest,
            farthest: -max_factor * max_dimension,
        }
    }

    /// Apply a wheel delta. Returns `false` and leaves the zoom untouched when
    /// the result would leave the open interval `(farthest, closest)`.
    pub fn apply(&mut self, delta: f64) -> bool {
        let candidate = self.value + delta;
        if candidate < self.closest && candidate > self.farthest {
            self.value = candidate;
            true
        } else {
            false
        }
    }
}

/// Pointer x of the last drag event, while the pointer is down.
#[derive(Debug, Clone, Copy, Default)]
struct DragState {
    last_x: Option<f64>,
}

/// What a frame did.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub draw_order: Vec<String>,
    pub stats: PaintStats,
}

/// All state for one viewer.
///
/// Input handlers are the only mutation points: they change the camera or
/// rotate the geometry, then request a repaint. [`RenderSession::frame`]
/// sorts and paints at most once per scheduled refresh, reading whatever the
/// state is by then.
pub struct RenderSession<S: FrameScheduler = ManualScheduler> {
    building: BuildingSpec,
    scene: Scene,
    camera: Camera,
    viewport: Viewport,
    fov: f64,
    strategy: ProjectionStrategy,
    zoom: Zoom,
    drag: DragState,
    drag_reference_width: Option<f64>,
    rotation: RotationState,
    repaint: RepaintSlot,
    scheduler: S,
}

impl<S: FrameScheduler> RenderSession<S> {
    /// Build, center and orient the building, and place the camera.
    ///
    /// The config is validated first; a session never runs on settings
    /// [`ViewerConfig::validate`] rejects.
    pub fn new<R: Rng + ?Sized>(
        config: &ViewerConfig,
        scheduler: S,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let building = config.building;
        let mut scene = build_building(&building, rng)?;
        center_on_axes(&mut scene);

        let mut rotation = RotationState::zero();
        rotate(Axis::Y, config.initial_yaw, &mut scene);
        rotation.record(Axis::Y, config.initial_yaw);

        let zoom = Zoom::for_building(&building, config.zoom_min_factor, config.zoom_max_factor);
        let camera = Camera::new(0.0, -building.swa_eave_height, zoom.value);
        reorder(&mut scene, &config.projection.eye(&camera));

        debug!(
            "session ready: {} polygons, camera {:?}, fov {:.4} rad",
            scene.len(),
            camera.position,
            config.fov_radians()
        );

        Ok(Self {
            building,
            scene,
            camera,
            viewport: Viewport::default(),
            fov: config.fov_radians(),
            strategy: config.projection,
            zoom,
            drag: DragState::default(),
            drag_reference_width: None,
            rotation,
            repaint: RepaintSlot::new(),
            scheduler,
        })
    }

    /// Create one surface handle per polygon, in the current draw order.
    pub fn attach<T: RenderSurface + ?Sized>(&self, surface: &mut T) {
        for polygon in self.scene.polygons() {
            surface.attach(polygon);
        }
        surface.set_draw_order(&self.scene.draw_order());
    }

    pub fn on_load(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.request_repaint();
    }

    pub fn on_resize(&mut self, viewport: Viewport) {
        debug!("viewport resized to {}x{}", viewport.width, viewport.height);
        self.viewport = viewport;
        self.request_repaint();
    }

    pub fn on_pointer_down(&mut self, x: f64, _y: f64) {
        self.drag = DragState { last_x: Some(x) };
    }

    /// Horizontal drag spins the building about the vertical axis; a full
    /// reference width of travel is one full turn.
    pub fn on_pointer_move(&mut self, x: f64, _y: f64) {
        let Some(last_x) = self.drag.last_x else {
            return;
        };
        let dx = x - last_x;
        self.drag.last_x = Some(x);

        let width = self.drag_reference_width.unwrap_or(self.viewport.width);
        if dx == 0.0 || width <= 0.0 {
            return;
        }
        self.rotate_by(Axis::Y, PI * dx * 2.0 / width);
    }

    pub fn on_pointer_up(&mut self) {
        self.drag = DragState::default();
    }

    /// Move the camera along z. Out-of-range results are ignored.
    pub fn on_wheel(&mut self, delta_y: f64) {
        if self.zoom.apply(delta_y) {
            self.camera = Camera::new(0.0, -self.building.swa_eave_height, self.zoom.value);
            self.request_repaint();
        } else {
            trace!("zoom {} + {} out of range, ignored", self.zoom.value, delta_y);
        }
    }

    /// Rotate the geometry directly (keyboard input, scripted turns).
    pub fn rotate_by(&mut self, axis: Axis, angle: f64) {
        if angle == 0.0 {
            return;
        }
        rotate(axis, angle, &mut self.scene);
        self.rotation.record(axis, angle);
        self.request_repaint();
    }

    /// Switch projection. An invalid strategy is rejected and the current one kept.
    pub fn set_strategy(&mut self, strategy: ProjectionStrategy) -> Result<(), RenderError> {
        strategy.validate()?;
        debug!("projection strategy set to {:?}", strategy);
        self.strategy = strategy;
        self.request_repaint();
        Ok(())
    }

    /// Width that maps to one full drag turn. Defaults to the viewport width.
    pub fn set_drag_reference_width(&mut self, width: Option<f64>) {
        self.drag_reference_width = width;
    }

    pub fn request_repaint(&mut self) -> bool {
        self.repaint.request(&mut self.scheduler)
    }

    pub fn cancel_repaint(&mut self) {
        self.repaint.cancel(&mut self.scheduler);
    }

    pub fn is_repaint_pending(&self) -> bool {
        self.repaint.is_pending()
    }

    /// Run the pending repaint, if any: depth sort, project, push to `surface`.
    ///
    /// Returns `Ok(None)` when nothing was pending. When the projection cannot
    /// be set up for the current viewport the scene and surface are left
    /// untouched and the repaint stays pending with a fresh frame request.
    pub fn frame<T: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut T,
    ) -> Result<Option<FrameReport>, RenderError> {
        if !self.repaint.is_pending() {
            return Ok(None);
        }
        let projector = match self.strategy.prepare(&self.camera, &self.viewport, self.fov) {
            Ok(projector) => projector,
            Err(err) => {
                self.repaint.rearm(&mut self.scheduler);
                return Err(err);
            }
        };
        self.repaint.begin_frame();

        let eye = self.strategy.eye(&self.camera);
        let draw_order = reorder(&mut self.scene, &eye);
        let stats = paint_with(&mut self.scene, &projector);

        surface.set_draw_order(&draw_order);
        for polygon in self.scene.polygons() {
            if let Some(screen) = self.scene.screen(polygon.id()) {
                surface.update_points(polygon.id(), screen.points());
            }
        }

        trace!("frame painted: {:?}", stats);
        Ok(Some(FrameReport { draw_order, stats }))
    }

    pub fn building(&self) -> &BuildingSpec {
        &self.building
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn fov(&self) -> f64 {
        self.fov
    }

    pub fn strategy(&self) -> &ProjectionStrategy {
        &self.strategy
    }

    pub fn zoom(&self) -> &Zoom {
        &self.zoom
    }

    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}
