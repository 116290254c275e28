//! In-memory model tree
//!
//! A plain scene-graph snapshot: everything the file stores redundantly
//! (mesh bounds, face adjacency, skin bind poses, MDX layout) is left out and
//! rebuilt by the encoder.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::constants::{
    NODE_AABB, NODE_DANGLY, NODE_EMITTER, NODE_HEADER, NODE_LIGHT, NODE_MESH, NODE_REFERENCE,
    NODE_SABER, NODE_SKIN,
};
use crate::error::{Error, Result};
use crate::formats::common::{AabbNode, Face};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Classification {
    #[default]
    Other = 0x00,
    Effect = 0x01,
    Tile = 0x02,
    Character = 0x04,
    Door = 0x08,
    Lightsaber = 0x10,
    Placeable = 0x20,
    Flyer = 0x40,
}

impl Classification {
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0x00 => Self::Other,
            0x01 => Self::Effect,
            0x02 => Self::Tile,
            0x04 => Self::Character,
            0x08 => Self::Door,
            0x10 => Self::Lightsaber,
            0x20 => Self::Placeable,
            0x40 => Self::Flyer,
            other => return Err(Error::UnknownClassification(other)),
        })
    }
}

/// Root of an MDL file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    /// Model this one inherits animations from.
    pub supermodel: Option<String>,
    pub classification: Classification,
    pub subclassification: u8,
    pub affected_by_fog: bool,
    /// Node animations are applied from.
    pub animation_root: Option<String>,
    /// `[min x, min y, min z, max x, max y, max z]`.
    pub bounding_box: [f32; 6],
    pub radius: f32,
    pub animation_scale: f32,
    /// Always a dummy node.
    pub root: ModelNode,
    pub animations: Vec<Animation>,
}

impl Model {
    /// An empty model whose root dummy shares the model's name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            root: ModelNode::new(name.clone(), NodeKind::Dummy),
            name,
            supermodel: None,
            classification: Classification::Other,
            subclassification: 0,
            affected_by_fog: true,
            animation_root: None,
            bounding_box: [0.0; 6],
            radius: 0.0,
            animation_scale: 1.0,
            animations: Vec::new(),
        }
    }

    /// Geometry nodes in pre-order.
    pub fn nodes(&self) -> Vec<&ModelNode> {
        let mut nodes = Vec::new();
        self.root.collect(&mut nodes);
        nodes
    }

    pub fn find_node(&self, name: &str) -> Option<&ModelNode> {
        self.nodes().into_iter().find(|node| node.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    pub name: String,
    /// Index of the node's name in the name table. Decoding fills it in;
    /// encoding ignores it and numbers geometry nodes in pre-order.
    pub node_number: u16,
    pub supernode_number: u16,
    pub position: [f32; 3],
    /// Quaternion `[x, y, z, w]`.
    pub orientation: [f32; 4],
    pub scale: f32,
    pub kind: NodeKind,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            node_number: 0,
            supernode_number: 0,
            position: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
            scale: 1.0,
            kind,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: ModelNode) -> Self {
        self.children.push(child);
        self
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a ModelNode>) {
        out.push(self);
        for child in &self.children {
            child.collect(out);
        }
    }
}

/// Node variant, selected by the type flag word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    #[default]
    Dummy,
    Reference(Reference),
    Trimesh(Mesh),
    Danglymesh { mesh: Mesh, dangly: Dangly },
    Skin { mesh: Mesh, skin: Skin },
    Emitter(Emitter),
    Light(Light),
    Aabb { mesh: Mesh, tree: Vec<AabbNode> },
    Lightsaber(Mesh),
}

impl NodeKind {
    /// Type flag word for this variant.
    pub fn flags(&self) -> u16 {
        NODE_HEADER
            | match self {
                Self::Dummy => 0,
                Self::Reference(_) => NODE_REFERENCE,
                Self::Trimesh(_) => NODE_MESH,
                Self::Danglymesh { .. } => NODE_MESH | NODE_DANGLY,
                Self::Skin { .. } => NODE_MESH | NODE_SKIN,
                Self::Emitter(_) => NODE_EMITTER,
                Self::Light(_) => NODE_LIGHT,
                Self::Aabb { .. } => NODE_MESH | NODE_AABB,
                Self::Lightsaber(_) => NODE_MESH | NODE_SABER,
            }
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match self {
            Self::Trimesh(mesh) | Self::Lightsaber(mesh) => Some(mesh),
            Self::Danglymesh { mesh, .. } | Self::Skin { mesh, .. } | Self::Aabb { mesh, .. } => {
                Some(mesh)
            }
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match self {
            Self::Trimesh(mesh) | Self::Lightsaber(mesh) => Some(mesh),
            Self::Danglymesh { mesh, .. } | Self::Skin { mesh, .. } | Self::Aabb { mesh, .. } => {
                Some(mesh)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub model: String,
    pub reattachable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvAnimation {
    pub direction: [f32; 2],
    pub jitter: f32,
    pub jitter_speed: f32,
}

/// Geometry shared by every mesh variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mesh {
    pub vertices: Vec<[f32; 3]>,
    /// Per-vertex normals; empty when the file carries none.
    pub normals: Vec<[f32; 3]>,
    /// Up to four UV sets, each with one entry per vertex.
    pub uvs: Vec<Vec<[f32; 2]>>,
    pub faces: Vec<Face>,
    pub diffuse_texture: Option<String>,
    pub lightmap_texture: Option<String>,
    pub diffuse: [f32; 3],
    pub ambient: [f32; 3],
    pub self_illum_color: [f32; 3],
    pub alpha: f32,
    pub transparency_hint: u32,
    pub render: bool,
    pub shadow: bool,
    pub has_lightmap: bool,
    pub beaming: bool,
    pub background_geometry: bool,
    pub rotate_texture: bool,
    pub uv_animation: Option<UvAnimation>,
    // TSL only
    pub dirt_enabled: bool,
    pub dirt_texture: u16,
    pub dirt_coord_space: u16,
    pub hide_in_holograms: bool,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            faces: Vec::new(),
            diffuse_texture: None,
            lightmap_texture: None,
            diffuse: [0.8; 3],
            ambient: [0.2; 3],
            self_illum_color: [0.0; 3],
            alpha: 1.0,
            transparency_hint: 0,
            render: true,
            shadow: true,
            has_lightmap: false,
            beaming: false,
            background_geometry: false,
            rotate_texture: false,
            uv_animation: None,
            dirt_enabled: false,
            dirt_texture: 1,
            dirt_coord_space: 1,
            hide_in_holograms: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dangly {
    /// Per-vertex stiffness, 0 (free) to 255 (fixed).
    pub constraints: Vec<f32>,
    pub displacement: f32,
    pub tightness: f32,
    pub period: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneWeight {
    pub bone: String,
    pub weight: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skin {
    /// Up to four influences per vertex.
    pub weights: Vec<Vec<BoneWeight>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flare {
    pub texture: String,
    pub size: f32,
    pub position: f32,
    pub color_shift: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Light {
    pub radius: f32,
    pub multiplier: f32,
    /// Always non-negative; see `negative`.
    pub color: [f32; 3],
    /// Stored on disk as a negated colour.
    pub negative: bool,
    pub shadow_radius: Option<f32>,
    pub vertical_displacement: Option<f32>,
    pub priority: u32,
    pub ambient_only: bool,
    pub dynamic_type: u32,
    pub affect_dynamic: bool,
    pub shadow: bool,
    pub flare: bool,
    pub fading: bool,
    pub flare_radius: f32,
    pub flares: Vec<Flare>,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            radius: 1.0,
            multiplier: 1.0,
            color: [1.0; 3],
            negative: false,
            shadow_radius: None,
            vertical_displacement: None,
            priority: 5,
            ambient_only: false,
            dynamic_type: 1,
            affect_dynamic: true,
            shadow: true,
            flare: false,
            fading: true,
            flare_radius: 0.0,
            flares: Vec::new(),
        }
    }
}

/// Particle behaviour bits of the emitter flag word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterFlags {
    pub p2p: bool,
    pub p2p_select: bool,
    pub affected_by_wind: bool,
    pub tinted: bool,
    pub bounce: bool,
    pub random: bool,
    pub inherit: bool,
    pub inherit_velocity: bool,
    pub inherit_local: bool,
    pub splat: bool,
    pub inherit_particle: bool,
    pub depth_texture: bool,
    /// Bits without a name, kept verbatim.
    pub other_bits: u32,
}

impl EmitterFlags {
    const NAMED: [u32; 12] = [
        0x0001, 0x0002, 0x0004, 0x0008, 0x0010, 0x0020, 0x0040, 0x0080, 0x0100, 0x0200, 0x0400,
        0x0800,
    ];

    pub fn from_bits(bits: u32) -> Self {
        let has = |bit: u32| bits & bit != 0;
        Self {
            p2p: has(0x0001),
            p2p_select: has(0x0002),
            affected_by_wind: has(0x0004),
            tinted: has(0x0008),
            bounce: has(0x0010),
            random: has(0x0020),
            inherit: has(0x0040),
            inherit_velocity: has(0x0080),
            inherit_local: has(0x0100),
            splat: has(0x0200),
            inherit_particle: has(0x0400),
            depth_texture: has(0x0800),
            other_bits: bits & !Self::NAMED.iter().fold(0, |acc, bit| acc | bit),
        }
    }

    pub fn bits(self) -> u32 {
        [
            self.p2p,
            self.p2p_select,
            self.affected_by_wind,
            self.tinted,
            self.bounce,
            self.random,
            self.inherit,
            self.inherit_velocity,
            self.inherit_local,
            self.splat,
            self.inherit_particle,
            self.depth_texture,
        ]
        .iter()
        .zip(Self::NAMED)
        .filter(|(set, _)| **set)
        .fold(self.other_bits, |acc, (_, bit)| acc | bit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emitter {
    pub dead_space: f32,
    pub blast_radius: f32,
    pub blast_length: f32,
    pub branch_count: u32,
    pub control_point_smoothing: f32,
    pub x_grid: u32,
    pub y_grid: u32,
    pub spawn_type: u32,
    pub update: String,
    pub render: String,
    pub blend: String,
    pub texture: String,
    pub chunk_name: String,
    pub two_sided_texture: bool,
    pub looping: bool,
    pub render_order: u16,
    pub frame_blending: bool,
    pub depth_texture_name: String,
    pub flags: EmitterFlags,
    /// Static controller values by label (e.g. `birthrate`, `colorStart`).
    pub controllers: IndexMap<String, Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationEvent {
    pub time: f32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub length: f32,
    pub transition: f32,
    pub animation_root: String,
    pub events: Vec<AnimationEvent>,
    pub root: AnimationNode,
}

/// Keyframe tracks for one geometry node.
///
/// Decoding links the tracks to geometry through the node number. Encoding
/// links them by name and writes the geometry node's number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationNode {
    pub name: String,
    /// Decoded node number; ignored on encode.
    pub node_number: u16,
    /// Rows of `[time, values..]`, or `[time, values.., in.., out..]` for
    /// Bezier tracks. Orientation rows always carry `[x, y, z, w]`.
    pub keyframes: IndexMap<String, Vec<Vec<f32>>>,
    pub children: Vec<AnimationNode>,
}

impl AnimationNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_number: 0,
            keyframes: IndexMap::new(),
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_bytes() {
        assert_eq!(Classification::from_u8(0x04).unwrap(), Classification::Character);
        assert_eq!(Classification::Placeable as u8, 0x20);
        assert!(matches!(
            Classification::from_u8(0x03),
            Err(Error::UnknownClassification(3))
        ));
    }

    #[test]
    fn test_node_flags() {
        assert_eq!(NodeKind::Dummy.flags(), 0x0001);
        assert_eq!(NodeKind::Trimesh(Mesh::default()).flags(), 0x0021);
        assert_eq!(
            NodeKind::Skin {
                mesh: Mesh::default(),
                skin: Skin::default()
            }
            .flags(),
            0x0061
        );
        assert_eq!(NodeKind::Lightsaber(Mesh::default()).flags(), 0x0821);
    }

    #[test]
    fn test_emitter_flags_keep_unknown_bits() {
        let flags = EmitterFlags::from_bits(0x1000 | 0x0200 | 0x0001);
        assert!(flags.p2p && flags.splat && !flags.bounce);
        assert_eq!(flags.other_bits, 0x1000);
        assert_eq!(flags.bits(), 0x1201);
    }

    #[test]
    fn test_pre_order_nodes() {
        let model = Model {
            root: ModelNode::new("root", NodeKind::Dummy)
                .with_child(ModelNode::new("a", NodeKind::Dummy).with_child(ModelNode::new("b", NodeKind::Dummy)))
                .with_child(ModelNode::new("c", NodeKind::Dummy)),
            ..Model::new("root")
        };
        let names: Vec<_> = model.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["root", "a", "b", "c"]);
        assert!(model.find_node("b").is_some());
    }
}
