/// Painter's-algorithm draw ordering
use std::cmp::Ordering;
use std::collections::HashMap;

use log::trace;

use crate::math::{distance, Vec3};
use crate::scene::Scene;

/// Sort the scene back to front as seen from `eye` and return the new order.
///
/// Polygons are ordered by the distance from `eye` to their vertex centroid,
/// farthest first. Background polygons are then moved ahead of everything
/// else. Both sorts are stable, so equal distances keep their previous
/// relative order.
pub fn reorder(scene: &mut Scene, eye: &Vec3) -> Vec<String> {
    let distances: HashMap<String, f64> = scene
        .polygons()
        .iter()
        .map(|p| (p.id().to_string(), distance(&p.centroid(), eye)))
        .collect();
    let dist = |id: &str| distances.get(id).copied().unwrap_or(0.0);

    scene.sort_polygons_by(|a, b| dist(b.id()).total_cmp(&dist(a.id())));
    scene.sort_polygons_by(|a, b| match (a.force_to_background(), b.force_to_background()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    });

    let order = scene.draw_order();
    trace!("draw order: {:?}", order);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Polygon, Rgb};

    fn quad_at(id: &str, z: f64, background: bool) -> Polygon {
        let vertices = vec![
            Vec3::new(-1.0, -1.0, z),
            Vec3::new(1.0, -1.0, z),
            Vec3::new(1.0, 1.0, z),
            Vec3::new(-1.0, 1.0, z),
        ];
        Polygon::new(id, vertices, Rgb::new(0, 0, 0), 1.0, 0.0, background).unwrap()
    }

    #[test]
    fn test_farthest_first() {
        let mut scene = Scene::new(vec![
            quad_at("near", -900.0, false),
            quad_at("far", -100.0, false),
            quad_at("mid", -500.0, false),
        ])
        .unwrap();
        let order = reorder(&mut scene, &Vec3::new(0.0, 0.0, -1000.0));
        assert_eq!(order, vec!["far", "mid", "near"]);
        assert_eq!(scene.draw_order(), order);
    }

    #[test]
    fn test_background_always_first() {
        let mut scene = Scene::new(vec![
            quad_at("far", -100.0, false),
            quad_at("ground", -990.0, true),
            quad_at("mid", -500.0, false),
        ])
        .unwrap();
        let order = reorder(&mut scene, &Vec3::new(0.0, 0.0, -1000.0));
        assert_eq!(order, vec!["ground", "far", "mid"]);
    }

    #[test]
    fn test_ties_keep_previous_order() {
        let mut scene = Scene::new(vec![
            quad_at("b", -500.0, false),
            quad_at("a", -500.0, false),
            quad_at("g2", 0.0, true),
            quad_at("g1", 0.0, true),
        ])
        .unwrap();
        let order = reorder(&mut scene, &Vec3::new(0.0, 0.0, -1000.0));
        assert_eq!(order, vec!["g2", "g1", "b", "a"]);
        // a second pass with nothing moved is stable
        assert_eq!(reorder(&mut scene, &Vec3::new(0.0, 0.0, -1000.0)), order);
    }
}
