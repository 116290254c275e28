//! Walkmesh structure definitions

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formats::common::{AabbNode, Face};

/// Material ids a creature cannot stand on.
pub const NON_WALKABLE_MATERIALS: [u32; 7] = [0, 2, 7, 8, 15, 17, 19];

pub fn is_walkable(material: u32) -> bool {
    !NON_WALKABLE_MATERIALS.contains(&material)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum WalkmeshKind {
    /// Placeable (PWK) or door (DWK) walkmesh.
    #[default]
    PlaceableOrDoor = 0,
    /// Area room walkmesh (WOK) with an AABB tree.
    Room = 1,
}

impl WalkmeshKind {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::PlaceableOrDoor),
            1 => Ok(Self::Room),
            other => Err(Error::UnknownWalkmeshKind(other)),
        }
    }
}

/// A walkable edge without a walkable neighbour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OuterEdge {
    /// `face * 3 + edge`, where edge `k` runs from vertex `k` to `k + 1`.
    pub edge: u32,
    /// Index of the room this edge leads into.
    pub transition: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Walkmesh {
    pub kind: WalkmeshKind,
    /// Use points relative to the owning object.
    pub relative_use: [[f32; 3]; 2],
    /// Use points in world space.
    pub absolute_use: [[f32; 3]; 2],
    pub position: [f32; 3],
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<Face>,
    /// One entry per walkable face: the `face * 3 + edge` across each edge, or -1.
    pub adjacent_edges: Vec<[i32; 3]>,
    pub outer_edges: Vec<OuterEdge>,
    /// One-based cumulative end index of each outer-edge loop.
    pub perimeters: Vec<u32>,
    pub aabb_tree: Vec<AabbNode>,
}

impl Walkmesh {
    pub fn walkable_face_count(&self) -> usize {
        self.faces.iter().filter(|f| is_walkable(f.material)).count()
    }

    /// The two vertex indices of edge `face * 3 + k`.
    pub fn edge_vertices(&self, edge: u32) -> Option<[u32; 2]> {
        edge_vertices(&self.faces, edge)
    }
}

pub(crate) fn edge_vertices(faces: &[Face], edge: u32) -> Option<[u32; 2]> {
    let face = faces.get((edge / 3) as usize)?;
    let k = (edge % 3) as usize;
    Some([face.vertices[k], face.vertices[(k + 1) % 3]])
}
