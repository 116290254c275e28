//! Walkmesh normalization before encode
//!
//! The engine expects walkable faces first. Reordering invalidates every
//! face-indexed table, so adjacency, outer edges, perimeters and the AABB
//! tree are rebuilt from vertex topology.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use super::types::{OuterEdge, Walkmesh, WalkmeshKind, edge_vertices, is_walkable};
use crate::error::{Error, Result};
use crate::formats::common::{build_aabb_tree, faces_from_mesh, plane_distance};

/// Undirected edge key.
type EdgeKey = (u32, u32);

fn edge_key([a, b]: [u32; 2]) -> EdgeKey {
    (a.min(b), a.max(b))
}

/// Reorder faces walkable-first and recompute every derived table.
///
/// # Errors
/// Returns an error if a face references a missing vertex or the AABB
/// builder fails.
pub fn normalize_walkmesh(input: &Walkmesh) -> Result<Walkmesh> {
    let (walkable, blocked): (Vec<_>, Vec<_>) = input
        .faces
        .iter()
        .partition(|face| is_walkable(face.material));
    let walkable_count = walkable.len();

    let mut faces: Vec<_> = walkable.into_iter().chain(blocked).cloned().collect();
    for (index, face) in faces.iter_mut().enumerate() {
        let [first, ..] = face.corners(&input.vertices).ok_or_else(|| {
            Error::InvalidInput(format!(
                "face {index} references a missing vertex {:?}",
                face.vertices
            ))
        })?;
        if face.normal == [0.0; 3] {
            face.normal = face.compute_normal(&input.vertices);
        }
        face.distance = plane_distance(face.normal, first.to_array());
    }

    let aabb_tree = if input.kind == WalkmeshKind::Room && !faces.is_empty() {
        build_aabb_tree(&faces_from_mesh(&input.vertices, &faces)?)?
    } else {
        Vec::new()
    };

    let mut output = Walkmesh {
        faces,
        aabb_tree,
        adjacent_edges: Vec::new(),
        outer_edges: Vec::new(),
        perimeters: Vec::new(),
        ..input.clone()
    };
    output.adjacent_edges = adjacency(&output, walkable_count);
    let (outer_edges, perimeters) = outer_loops(&output, walkable_count);
    output.outer_edges = carry_transitions(input, &output, outer_edges);
    output.perimeters = perimeters;
    Ok(output)
}

/// Walkable edges grouped by undirected vertex pair.
fn walkable_edges(walkmesh: &Walkmesh, walkable_count: usize) -> HashMap<EdgeKey, Vec<u32>> {
    let mut edges: HashMap<EdgeKey, Vec<u32>> = HashMap::new();
    for edge in 0..(walkable_count * 3) as u32 {
        if let Some(pair) = walkmesh.edge_vertices(edge) {
            edges.entry(edge_key(pair)).or_default().push(edge);
        }
    }
    edges
}

fn adjacency(walkmesh: &Walkmesh, walkable_count: usize) -> Vec<[i32; 3]> {
    let edges = walkable_edges(walkmesh, walkable_count);
    (0..walkable_count as u32)
        .map(|face| {
            std::array::from_fn(|k| {
                let edge = face * 3 + k as u32;
                walkmesh
                    .edge_vertices(edge)
                    .and_then(|pair| edges.get(&edge_key(pair)))
                    .and_then(|shared| shared.iter().find(|&&other| other / 3 != face))
                    .map_or(-1, |&other| other as i32)
            })
        })
        .collect()
}

/// Boundary edges traced into closed loops, plus the loop end indices.
fn outer_loops(walkmesh: &Walkmesh, walkable_count: usize) -> (Vec<OuterEdge>, Vec<u32>) {
    let edges = walkable_edges(walkmesh, walkable_count);
    let boundary: Vec<u32> = (0..(walkable_count * 3) as u32)
        .filter(|&edge| {
            walkmesh
                .edge_vertices(edge)
                .and_then(|pair| edges.get(&edge_key(pair)))
                .is_some_and(|shared| shared.len() == 1)
        })
        .collect();

    // boundary edges keyed by their start vertex, in face order
    let mut by_start: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for &edge in &boundary {
        if let Some([start, _]) = walkmesh.edge_vertices(edge) {
            by_start.entry(start).or_default().push(edge);
        }
    }

    let mut visited = vec![false; walkable_count * 3];
    let mut outer = Vec::with_capacity(boundary.len());
    let mut perimeters = Vec::new();

    for &first in &boundary {
        if visited[first as usize] {
            continue;
        }
        let mut edge = first;
        loop {
            visited[edge as usize] = true;
            outer.push(OuterEdge {
                edge,
                transition: None,
            });
            let Some([_, end]) = walkmesh.edge_vertices(edge) else {
                break;
            };
            let next = by_start
                .get(&end)
                .and_then(|candidates| candidates.iter().find(|&&e| !visited[e as usize]));
            match next {
                Some(&next) => edge = next,
                None => break,
            }
        }
        perimeters.push(outer.len() as u32);
    }

    (outer, perimeters)
}

/// Re-associate input transitions with the rebuilt outer edges by vertex pair.
fn carry_transitions(input: &Walkmesh, output: &Walkmesh, mut outer: Vec<OuterEdge>) -> Vec<OuterEdge> {
    let transitions: HashMap<EdgeKey, u32> = input
        .outer_edges
        .iter()
        .filter_map(|outer_edge| {
            let transition = outer_edge.transition?;
            let pair = edge_vertices(&input.faces, outer_edge.edge)?;
            Some((edge_key(pair), transition))
        })
        .collect();

    let mut matched = 0;
    for outer_edge in &mut outer {
        let key = output.edge_vertices(outer_edge.edge).map(edge_key);
        if let Some(&transition) = key.and_then(|key| transitions.get(&key)) {
            outer_edge.transition = Some(transition);
            matched += 1;
        }
    }

    if matched < transitions.len() {
        for (key, transition) in &transitions {
            let found = outer
                .iter()
                .any(|e| output.edge_vertices(e.edge).map(edge_key) == Some(*key));
            if !found {
                warn!(
                    "Dropping transition {} on edge {:?}: edge is not on the walkable boundary",
                    transition, key
                );
            }
        }
    }
    outer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::common::Face;

    /// Unit square split into two walkable triangles plus a blocked flap.
    fn square() -> Walkmesh {
        Walkmesh {
            kind: WalkmeshKind::Room,
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [2.0, 0.0, 0.0],
            ],
            faces: vec![
                Face::new([1, 4, 2], 7),
                Face::new([0, 1, 2], 1),
                Face::new([0, 2, 3], 1),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_walkable_first_and_distances() {
        let out = normalize_walkmesh(&square()).unwrap();
        let materials: Vec<_> = out.faces.iter().map(|f| f.material).collect();
        assert_eq!(materials, vec![1, 1, 7]);
        for face in &out.faces {
            assert_eq!(face.normal, [0.0, 0.0, 1.0]);
            assert_eq!(face.distance, 0.0);
        }
        assert_eq!(out.aabb_tree.iter().filter(|n| n.is_leaf()).count(), 3);
    }

    #[test]
    fn test_adjacency_links_shared_edge() {
        let out = normalize_walkmesh(&square()).unwrap();
        // face 0 = [0,1,2], face 1 = [0,2,3]; shared edge 0-2 is edge 2 of face 0 and edge 0 of face 1
        assert_eq!(out.adjacent_edges, vec![[-1, -1, 3], [2, -1, -1]]);
    }

    #[test]
    fn test_outer_loop_closes() {
        let out = normalize_walkmesh(&square()).unwrap();
        let edges: Vec<_> = out.outer_edges.iter().map(|e| e.edge).collect();
        assert_eq!(edges, vec![0, 1, 4, 5]);
        assert_eq!(out.perimeters, vec![4]);
    }

    #[test]
    fn test_transition_follows_reordering() {
        let mut input = square();
        // edge 3-0 is edge 2 of input face 2
        input.outer_edges = vec![OuterEdge {
            edge: 8,
            transition: Some(5),
        }];
        let out = normalize_walkmesh(&input).unwrap();
        let carried: Vec<_> = out
            .outer_edges
            .iter()
            .filter_map(|e| e.transition.map(|t| (e.edge, t)))
            .collect();
        assert_eq!(carried, vec![(5, 5)]);
    }

    #[test]
    fn test_placeable_has_no_tree() {
        let mut input = square();
        input.kind = WalkmeshKind::PlaceableOrDoor;
        let out = normalize_walkmesh(&input).unwrap();
        assert!(out.aabb_tree.is_empty());
        assert_eq!(out.perimeters, vec![4]);
    }

    #[test]
    fn test_placeable_missing_vertex_is_invalid_input() {
        let mut input = square();
        input.kind = WalkmeshKind::PlaceableOrDoor;
        input.faces.push(Face::new([0, 1, 9], 1));
        let err = normalize_walkmesh(&input).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
