/// Geometry primitives and the parametric building generator
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::math::{centroid, Vec3};
use crate::scene::Scene;

/// Id of the ground plane emitted by [`build_building`].
pub const GROUND_ID: &str = "ground";

/// An RGB color, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// CSS functional notation, e.g. `rgb(200,30,47)`.
    pub fn css(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// A uniformly random color.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    Rgb::new(rng.gen(), rng.gen(), rng.gen())
}

/// Turns `color` into a gray with the same luminosity as one of its
/// channels, picked at random.
pub fn random_gray_scale<R: Rng + ?Sized>(color: Rgb, rng: &mut R) -> Rgb {
    let level = color.channels()[rng.gen_range(0..3)];
    Rgb::new(level, level, level)
}

/// A flat-shaded convex polygon.
///
/// The vertex count is fixed at construction; transforms rewrite vertex values
/// in place through [`Polygon::vertices_mut`]. Id, color, opacity and stroke
/// never change after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    id: String,
    vertices: Vec<Vec3>,
    color: Rgb,
    opacity: f64,
    stroke: f64,
    force_to_background: bool,
}

impl Polygon {
    pub fn new(
        id: impl Into<String>,
        vertices: Vec<Vec3>,
        color: Rgb,
        opacity: f64,
        stroke: f64,
        force_to_background: bool,
    ) -> Result<Self, RenderError> {
        let id = id.into();
        if vertices.len() < 3 {
            return Err(RenderError::EmptyPolygon {
                id,
                vertices: vertices.len(),
            });
        }
        if let Some(bad) = vertices.iter().position(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(RenderError::InvalidPolygon {
                id,
                reason: format!("vertex {bad} is not finite"),
            });
        }
        if !(0.0..=1.0).contains(&opacity) {
            return Err(RenderError::InvalidPolygon {
                id,
                reason: format!("opacity must be within [0, 1], got {opacity}"),
            });
        }
        if !(stroke.is_finite() && stroke >= 0.0) {
            return Err(RenderError::InvalidPolygon {
                id,
                reason: format!("stroke width must be >= 0, got {stroke}"),
            });
        }

        Ok(Self {
            id,
            vertices,
            color,
            opacity,
            stroke,
            force_to_background,
        })
    }

    /// A filled, fully opaque polygon.
    pub fn filled(
        id: impl Into<String>,
        vertices: Vec<Vec3>,
        color: Rgb,
    ) -> Result<Self, RenderError> {
        Self::new(id, vertices, color, 1.0, 0.0, false)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [Vec3] {
        &mut self.vertices
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Outline width; zero means the polygon is filled.
    pub fn stroke(&self) -> f64 {
        self.stroke
    }

    pub fn force_to_background(&self) -> bool {
        self.force_to_background
    }

    pub fn centroid(&self) -> Vec3 {
        centroid(&self.vertices)
    }
}

/// Parametric description of a gable-roofed building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub width: f64,
    pub length: f64,
    #[serde(alias = "swaEaveHeight")]
    pub swa_eave_height: f64,
    #[serde(alias = "swcEaveHeight")]
    pub swc_eave_height: f64,
}

impl BuildingSpec {
    pub fn new(width: f64, length: f64, swa_eave_height: f64, swc_eave_height: f64) -> Self {
        Self {
            width,
            length,
            swa_eave_height,
            swc_eave_height,
        }
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        let fields = [
            ("width", self.width),
            ("length", self.length),
            ("swa_eave_height", self.swa_eave_height),
            ("swc_eave_height", self.swc_eave_height),
        ];
        for (field, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(RenderError::InvalidGeometrySpec { field, value });
            }
        }
        Ok(())
    }

    pub fn ridge_height(&self) -> f64 {
        self.swa_eave_height + self.swc_eave_height
    }

    pub fn max_dimension(&self) -> f64 {
        self.width.max(self.length)
    }
}

impl Default for BuildingSpec {
    fn default() -> Self {
        Self::new(800.0, 800.0, 240.0, 240.0)
    }
}

/// Generate the building's faces plus a ground plane.
///
/// One corner sits at the world origin; the length runs along +x and the
/// width along -z. Every face gets a random color from `rng`.
pub fn build_building<R: Rng + ?Sized>(
    spec: &BuildingSpec,
    rng: &mut R,
) -> Result<Scene, RenderError> {
    spec.validate()?;

    let back_z = -spec.width;
    let mid_z = back_z / 2.0;
    let end_x = spec.length;
    let swa_eave = spec.swa_eave_height;
    let swc_eave = spec.swc_eave_height;
    let ridge = spec.ridge_height();

    let v = Vec3::new;
    let faces: [(&str, Vec<Vec3>); 6] = [
        (
            "swa",
            vec![
                v(0.0, 0.0, 0.0),
                v(end_x, 0.0, 0.0),
                v(end_x, swa_eave, 0.0),
                v(0.0, swa_eave, 0.0),
            ],
        ),
        (
            "ewb",
            vec![
                v(0.0, 0.0, 0.0),
                v(0.0, 0.0, back_z),
                v(0.0, swc_eave, back_z),
                v(0.0, ridge, mid_z),
                v(0.0, swa_eave, 0.0),
            ],
        ),
        (
            "swc",
            vec![
                v(0.0, 0.0, back_z),
                v(end_x, 0.0, back_z),
                v(end_x, swa_eave, back_z),
                v(0.0, swa_eave, back_z),
            ],
        ),
        (
            "ewd",
            vec![
                v(end_x, 0.0, 0.0),
                v(end_x, 0.0, back_z),
                v(end_x, swc_eave, back_z),
                v(end_x, ridge, mid_z),
                v(end_x, swa_eave, 0.0),
            ],
        ),
        (
            "rpa",
            vec![
                v(0.0, swa_eave, 0.0),
                v(end_x, swa_eave, 0.0),
                v(end_x, ridge, mid_z),
                v(0.0, ridge, mid_z),
            ],
        ),
        (
            "rpc",
            vec![
                v(end_x, swc_eave, back_z),
                v(0.0, swc_eave, back_z),
                v(0.0, ridge, mid_z),
                v(end_x, ridge, mid_z),
            ],
        ),
    ];

    let mut polygons = Vec::with_capacity(faces.len() + 1);
    for (id, vertices) in faces {
        polygons.push(Polygon::filled(id, vertices, random_color(rng))?);
    }
    polygons.push(build_ground(
        -0.5 * spec.length,
        1.5 * spec.length,
        -1.5 * spec.width,
        0.5 * spec.width,
        rng,
    )?);

    debug!(
        "built building {}x{} (ridge {}) with {} polygons",
        spec.length,
        spec.width,
        ridge,
        polygons.len()
    );
    Scene::new(polygons)
}

/// A ground quad at `y = 0`, always drawn behind everything else.
pub fn build_ground<R: Rng + ?Sized>(
    min_x: f64,
    max_x: f64,
    min_z: f64,
    max_z: f64,
    rng: &mut R,
) -> Result<Polygon, RenderError> {
    let vertices = vec![
        Vec3::new(min_x, 0.0, min_z),
        Vec3::new(max_x, 0.0, min_z),
        Vec3::new(max_x, 0.0, max_z),
        Vec3::new(min_x, 0.0, max_z),
    ];
    Polygon::new(GROUND_ID, vertices, random_color(rng), 1.0, 0.0, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_polygon_requires_three_vertices() {
        let err = Polygon::filled("line", vec![Vec3::zeros(), Vec3::x()], Rgb::new(0, 0, 0))
            .unwrap_err();
        assert_eq!(
            err,
            RenderError::EmptyPolygon {
                id: "line".into(),
                vertices: 2
            }
        );
    }

    #[test]
    fn test_polygon_rejects_bad_values() {
        let tri = vec![Vec3::zeros(), Vec3::x(), Vec3::y()];
        assert!(Polygon::new("a", tri.clone(), Rgb::new(1, 2, 3), 1.5, 0.0, false).is_err());
        assert!(Polygon::new("b", tri.clone(), Rgb::new(1, 2, 3), 1.0, -1.0, false).is_err());
        let nan = vec![Vec3::zeros(), Vec3::new(f64::NAN, 0.0, 0.0), Vec3::y()];
        assert!(matches!(
            Polygon::filled("c", nan, Rgb::new(1, 2, 3)),
            Err(RenderError::InvalidPolygon { .. })
        ));
    }

    #[test]
    fn test_build_building_default() {
        let spec = BuildingSpec::new(800.0, 800.0, 240.0, 240.0);
        let scene = build_building(&spec, &mut rng()).unwrap();

        assert_eq!(scene.polygons().len(), 7);
        assert_eq!(spec.ridge_height(), 480.0);

        let ground: Vec<_> = scene.polygons().iter().filter(|p| p.id() == GROUND_ID).collect();
        assert_eq!(ground.len(), 1);
        assert!(ground[0].force_to_background());
        assert_eq!(scene.polygons().iter().filter(|p| p.force_to_background()).count(), 1);

        let max_y = scene
            .polygons()
            .iter()
            .flat_map(|p| p.vertices())
            .map(|v| v.y)
            .fold(f64::MIN, f64::max);
        assert_eq!(max_y, 480.0);
    }

    #[test]
    fn test_build_building_layout() {
        let spec = BuildingSpec::new(400.0, 1000.0, 200.0, 100.0);
        let scene = build_building(&spec, &mut rng()).unwrap();
        let face = |id: &str| scene.polygon(id).unwrap().clone();

        assert_eq!(face("ewb").vertices().len(), 5);
        assert_eq!(face("ewd").vertices().len(), 5);
        for id in ["swa", "swc", "rpa", "rpc"] {
            assert_eq!(face(id).vertices().len(), 4);
        }
        assert_eq!(face("ewd").vertices()[3], Vec3::new(1000.0, 300.0, -200.0));
        assert!(face("swc").vertices().iter().all(|v| v.z == -400.0));

        let ground = face(GROUND_ID);
        assert_eq!(ground.vertices()[0], Vec3::new(-500.0, 0.0, -600.0));
        assert_eq!(ground.vertices()[2], Vec3::new(1500.0, 0.0, 200.0));
        for p in scene.polygons() {
            assert_eq!(p.opacity(), 1.0);
            assert_eq!(p.stroke(), 0.0);
        }
    }

    #[test]
    fn test_build_building_rejects_bad_spec() {
        for spec in [
            BuildingSpec::new(0.0, 800.0, 240.0, 240.0),
            BuildingSpec::new(800.0, -1.0, 240.0, 240.0),
            BuildingSpec::new(800.0, 800.0, f64::NAN, 240.0),
            BuildingSpec::new(800.0, 800.0, 240.0, f64::INFINITY),
        ] {
            assert!(matches!(
                build_building(&spec, &mut rng()),
                Err(RenderError::InvalidGeometrySpec { .. })
            ));
        }
    }

    #[test]
    fn test_seeded_builds_repeat() {
        let spec = BuildingSpec::default();
        let a = build_building(&spec, &mut rng()).unwrap();
        let b = build_building(&spec, &mut rng()).unwrap();
        assert_eq!(a.polygons(), b.polygons());
    }

    #[test]
    fn test_random_gray_scale() {
        let gray = random_gray_scale(Rgb::new(10, 20, 30), &mut rng());
        assert_eq!(gray.r, gray.g);
        assert_eq!(gray.g, gray.b);
        assert!([10, 20, 30].contains(&gray.r));
    }

    #[test]
    fn test_building_spec_json_aliases() {
        let spec: BuildingSpec = serde_json::from_str(
            r#"{"width": 10, "length": 20, "swaEaveHeight": 3, "swcEaveHeight": 4}"#,
        )
        .unwrap();
        assert_eq!(spec, BuildingSpec::new(10.0, 20.0, 3.0, 4.0));
        assert_eq!(spec.max_dimension(), 20.0);
    }
}
