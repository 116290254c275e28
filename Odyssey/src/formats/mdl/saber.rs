//! Lightsaber blade geometry

use super::constants::{SABER_ENGINE_VERTEX_COUNT, SABER_FACES, SABER_VERTEX_COUNT};
use crate::formats::common::{Face, plane_distance};

/// Indices of the vertices kept from a blade of `count` vertices.
pub fn kept_vertices(count: usize) -> Vec<usize> {
    if count == SABER_ENGINE_VERTEX_COUNT {
        (0..8).chain(88..96).collect()
    } else {
        (0..count.min(SABER_VERTEX_COUNT)).collect()
    }
}

/// The fixed blade triangles over sixteen vertices.
pub fn saber_faces(vertices: &[[f32; 3]]) -> Vec<Face> {
    SABER_FACES
        .iter()
        .map(|&corners| {
            let mut face = Face::new(corners, 0);
            face.normal = face.compute_normal(vertices);
            face.distance = vertices
                .get(corners[0] as usize)
                .map_or(0.0, |&point| plane_distance(face.normal, point));
            face
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_blade_keeps_two_rings() {
        let kept = kept_vertices(176);
        assert_eq!(kept.len(), 16);
        assert_eq!(kept[7], 7);
        assert_eq!(kept[8], 88);
        assert_eq!(kept_vertices(16), (0..16).collect::<Vec<_>>());
        assert_eq!(kept_vertices(10).len(), 10);
    }

    #[test]
    fn test_blade_faces() {
        let vertices: Vec<[f32; 3]> = (0..16).map(|i| [(i % 4) as f32, 0.0, (i / 4) as f32]).collect();
        let faces = saber_faces(&vertices);
        assert_eq!(faces.len(), 12);
        assert_eq!(faces[0].vertices, [0, 4, 1]);
        assert!(faces.iter().all(|face| face.material == 0));
    }
}
