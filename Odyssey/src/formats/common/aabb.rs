//! Axis-aligned bounding box tree construction
//!
//! Builds the flattened, depth-first median-split hierarchy stored by room
//! walkmeshes and by AABB model nodes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::types::Face;
use crate::error::{Error, Result};

/// Deepest recursion the builder accepts.
pub const MAX_TREE_DEPTH: usize = 128;

/// Centroids closer than this to the box center count as coplanar on an axis.
const COPLANAR_EPSILON: f32 = 1e-4;

/// Split attempts before the partition is forced.
const SPLIT_ATTEMPTS: usize = 4;

/// Input triangle for the builder.
#[derive(Debug, Clone, Copy)]
pub struct AabbFace {
    pub index: u32,
    pub vertices: [Vec3; 3],
    pub centroid: Vec3,
}

impl AabbFace {
    pub fn new(index: u32, vertices: [Vec3; 3]) -> Self {
        let centroid = (vertices[0] + vertices[1] + vertices[2]) / 3.0;
        Self {
            index,
            vertices,
            centroid,
        }
    }
}

/// One node of a flattened AABB tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AabbNode {
    pub bbox_min: [f32; 3],
    pub bbox_max: [f32; 3],
    /// Face index for leaves, -1 for internal nodes.
    pub face_index: i32,
    /// 0 for leaves, `1 + axis` for internal nodes.
    pub split_plane: u32,
    /// Index of the left child in the flat list (0 for leaves).
    pub left: u32,
    /// Index of the right child in the flat list (0 for leaves).
    pub right: u32,
}

impl AabbNode {
    pub fn is_leaf(&self) -> bool {
        self.face_index >= 0
    }
}

/// Collect builder input from a mesh. Faces with out-of-range indices are rejected.
pub fn faces_from_mesh(positions: &[[f32; 3]], faces: &[Face]) -> Result<Vec<AabbFace>> {
    faces
        .iter()
        .enumerate()
        .map(|(index, face)| {
            face.corners(positions)
                .map(|corners| AabbFace::new(index as u32, corners))
                .ok_or_else(|| {
                    Error::InvalidInput(format!("face {index} references a missing vertex"))
                })
        })
        .collect()
}

/// Build the flattened tree. The root is always node 0.
pub fn build_aabb_tree(faces: &[AabbFace]) -> Result<Vec<AabbNode>> {
    if faces.is_empty() {
        return Err(Error::EmptyFaceList);
    }
    let mut nodes = Vec::with_capacity(faces.len() * 2);
    build_node(faces.to_vec(), 0, &mut nodes)?;
    Ok(nodes)
}

fn build_node(faces: Vec<AabbFace>, depth: usize, nodes: &mut Vec<AabbNode>) -> Result<()> {
    if depth > MAX_TREE_DEPTH {
        return Err(Error::AabbDepthExceeded { depth });
    }

    let (min, max) = face_bounds(&faces);
    let center = (min + max) * 0.5;

    if let [face] = faces.as_slice() {
        nodes.push(AabbNode {
            bbox_min: min.to_array(),
            bbox_max: max.to_array(),
            face_index: face.index as i32,
            ..Default::default()
        });
        return Ok(());
    }

    let mut axis = longest_axis(max - min);
    if faces
        .iter()
        .all(|f| (f.centroid[axis] - center[axis]).abs() < COPLANAR_EPSILON)
    {
        axis = (axis + 1) % 3;
    }

    let (mut left, mut right) = partition(&faces, axis, center);
    let mut attempts = 1;
    while (left.is_empty() || right.is_empty()) && attempts < SPLIT_ATTEMPTS {
        axis = (axis + 1) % 3;
        (left, right) = partition(&faces, axis, center);
        attempts += 1;
    }
    if left.is_empty() {
        let half = right.len() / 2;
        left = right.drain(..half).collect();
    } else if right.is_empty() {
        let half = left.len() / 2;
        right = left.drain(..half).collect();
    }

    let index = nodes.len();
    nodes.push(AabbNode {
        bbox_min: min.to_array(),
        bbox_max: max.to_array(),
        face_index: -1,
        split_plane: axis as u32 + 1,
        left: 0,
        right: 0,
    });

    nodes[index].left = nodes.len() as u32;
    build_node(left, depth + 1, nodes)?;
    nodes[index].right = nodes.len() as u32;
    build_node(right, depth + 1, nodes)
}

fn longest_axis(extent: Vec3) -> usize {
    if extent.x >= extent.y && extent.x >= extent.z {
        0
    } else if extent.y >= extent.z {
        1
    } else {
        2
    }
}

fn partition(faces: &[AabbFace], axis: usize, center: Vec3) -> (Vec<AabbFace>, Vec<AabbFace>) {
    faces
        .iter()
        .copied()
        .partition(|face| face.centroid[axis] < center[axis])
}

fn face_bounds(faces: &[AabbFace]) -> (Vec3, Vec3) {
    faces
        .iter()
        .flat_map(|face| face.vertices)
        .fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), v| (min.min(v), max.max(v)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(index: u32, offset: [f32; 3]) -> AabbFace {
        let o = Vec3::from_array(offset);
        AabbFace::new(
            index,
            [o, o + Vec3::new(1.0, 0.0, 0.0), o + Vec3::new(0.0, 1.0, 0.0)],
        )
    }

    fn depth_of(nodes: &[AabbNode], index: usize) -> usize {
        let node = &nodes[index];
        if node.is_leaf() {
            1
        } else {
            1 + depth_of(nodes, node.left as usize).max(depth_of(nodes, node.right as usize))
        }
    }

    fn check_invariants(faces: &[AabbFace], nodes: &[AabbNode]) {
        let leaves: Vec<_> = nodes.iter().filter(|n| n.is_leaf()).collect();
        assert_eq!(leaves.len(), faces.len());

        for leaf in &leaves {
            let face = faces.iter().find(|f| f.index as i32 == leaf.face_index).unwrap();
            for v in face.vertices {
                for axis in 0..3 {
                    assert!(leaf.bbox_min[axis] <= v[axis] && v[axis] <= leaf.bbox_max[axis]);
                }
            }
            assert_eq!((leaf.left, leaf.right, leaf.split_plane), (0, 0, 0));
        }

        for node in nodes.iter().filter(|n| !n.is_leaf()) {
            let l = &nodes[node.left as usize];
            let r = &nodes[node.right as usize];
            for axis in 0..3 {
                assert_eq!(node.bbox_min[axis], l.bbox_min[axis].min(r.bbox_min[axis]));
                assert_eq!(node.bbox_max[axis], l.bbox_max[axis].max(r.bbox_max[axis]));
            }
        }
        assert!(depth_of(nodes, 0) <= MAX_TREE_DEPTH);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(build_aabb_tree(&[]), Err(Error::EmptyFaceList)));
    }

    #[test]
    fn test_single_face_is_leaf() {
        let faces = [triangle(7, [0.0; 3])];
        let nodes = build_aabb_tree(&faces).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].face_index, 7);
        assert_eq!(nodes[0].bbox_max, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_two_faces() {
        let faces = [triangle(0, [0.0; 3]), triangle(1, [4.0, 0.0, 0.0])];
        let nodes = build_aabb_tree(&faces).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].face_index, -1);
        assert_eq!(nodes[0].split_plane, 1);
        assert_eq!((nodes[0].left, nodes[0].right), (1, 2));
        assert_eq!(nodes[0].bbox_min, [0.0, 0.0, 0.0]);
        assert_eq!(nodes[0].bbox_max, [5.0, 1.0, 0.0]);
        check_invariants(&faces, &nodes);
    }

    #[test]
    fn test_grid_invariants() {
        let faces: Vec<_> = (0..40)
            .map(|i| triangle(i, [(i % 8) as f32 * 2.0, (i / 8) as f32 * 3.0, (i % 3) as f32]))
            .collect();
        let nodes = build_aabb_tree(&faces).unwrap();
        assert_eq!(nodes.len(), faces.len() * 2 - 1);
        check_invariants(&faces, &nodes);
    }

    #[test]
    fn test_coincident_faces_terminate() {
        let faces: Vec<_> = (0..9).map(|i| triangle(i, [1.0, 1.0, 1.0])).collect();
        let nodes = build_aabb_tree(&faces).unwrap();
        check_invariants(&faces, &nodes);
    }
}
