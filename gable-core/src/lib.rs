/// Gable Core Library - building geometry and the 3D-to-2D render pipeline
///
/// A frame runs transform -> depth ordering -> projection/paint over a
/// [`Scene`], and hands the projected points to a [`RenderSurface`].
/// [`RenderSession`] owns the per-viewer state and coalesces repaints.

pub mod config;
pub mod depth;
pub mod error;
pub mod geometry;
pub mod math;
pub mod projection;
pub mod scene;
pub mod schedule;
pub mod session;
pub mod svg;
pub mod transform;

// Re-export commonly used types
pub use config::ViewerConfig;
pub use error::{ConfigError, RenderError};
pub use geometry::{build_building, BuildingSpec, Polygon, Rgb};
pub use math::{Mat4, Point2, Vec3};
pub use projection::{paint, project, Camera, PaintStats, ProjectionStrategy, Viewport};
pub use scene::{PolygonStyle, RenderSurface, Scene};
pub use schedule::{FrameScheduler, FrameToken, ManualScheduler, RepaintSlot};
pub use session::{FrameReport, RenderSession, Zoom};
pub use svg::SvgDocument;
pub use transform::{center_on_axes, rotate, Axis, RotationState};
