//! Geometry types shared by the model and walkmesh codecs

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A triangle of a mesh or walkmesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Indices into the owning vertex array.
    pub vertices: [u32; 3],
    /// Surface material (walkmesh material id for collision geometry).
    pub material: u32,
    pub normal: [f32; 3],
    /// Signed plane distance, `-(normal . first vertex)`.
    pub distance: f32,
}

impl Face {
    pub fn new(vertices: [u32; 3], material: u32) -> Self {
        Self {
            vertices,
            material,
            ..Default::default()
        }
    }

    /// Resolve the three corner positions from `positions`.
    pub fn corners(&self, positions: &[[f32; 3]]) -> Option<[Vec3; 3]> {
        let corner = |i: usize| {
            positions
                .get(self.vertices[i] as usize)
                .map(|p| Vec3::from_array(*p))
        };
        Some([corner(0)?, corner(1)?, corner(2)?])
    }

    /// Unit normal of the triangle (zero for degenerate triangles).
    pub fn compute_normal(&self, positions: &[[f32; 3]]) -> [f32; 3] {
        self.corners(positions)
            .map(|[a, b, c]| (b - a).cross(c - a).normalize_or_zero().to_array())
            .unwrap_or_default()
    }

    /// Area of the triangle.
    pub fn area(&self, positions: &[[f32; 3]]) -> f32 {
        self.corners(positions)
            .map(|[a, b, c]| (b - a).cross(c - a).length() * 0.5)
            .unwrap_or_default()
    }
}

/// Signed plane distance of a plane with `normal` through `point`.
pub fn plane_distance(normal: [f32; 3], point: [f32; 3]) -> f32 {
    -Vec3::from_array(normal).dot(Vec3::from_array(point))
}

/// Axis-aligned bounds of a point set as `(min, max)`. Empty input yields zeros.
pub fn bounds(points: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    if points.is_empty() {
        return ([0.0; 3], [0.0; 3]);
    }
    let (min, max) = points.iter().fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(min, max), p| {
            let p = Vec3::from_array(*p);
            (min.min(p), max.max(p))
        },
    );
    (min.to_array(), max.to_array())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

    #[test]
    fn test_face_normal_and_area() {
        let face = Face::new([0, 1, 2], 4);
        assert_eq!(face.compute_normal(&TRIANGLE), [0.0, 0.0, 1.0]);
        assert!((face.area(&TRIANGLE) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_face_is_degenerate() {
        let face = Face::new([0, 1, 9], 4);
        assert_eq!(face.compute_normal(&TRIANGLE), [0.0; 3]);
    }

    #[test]
    fn test_plane_distance() {
        assert_eq!(plane_distance([0.0, 0.0, 1.0], [3.0, 4.0, 2.0]), -2.0);
    }

    #[test]
    fn test_bounds() {
        let (min, max) = bounds(&TRIANGLE);
        assert_eq!(min, [0.0, 0.0, 0.0]);
        assert_eq!(max, [1.0, 1.0, 0.0]);
    }
}
