//! Geometry node decoding

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::{ArrayDef, Session, guard, optional_name};
use crate::error::{Error, Result};
use crate::formats::common::{AabbNode, Face, decompress_xbox_normal};
use crate::formats::mdl::constants::{
    MDX_ABSENT, MDX_NORMAL, MDX_UV_FLAGS, MDX_VERTEX, NODE_AABB, NODE_DANGLY, NODE_EMITTER,
    NODE_HEADER, NODE_HEADER_SIZE, NODE_LIGHT, NODE_MESH, NODE_REFERENCE, NODE_SABER, NODE_SKIN,
};
use crate::formats::mdl::controllers::ControllerSet;
use crate::formats::mdl::saber::{kept_vertices, saber_faces};
use crate::formats::mdl::types::{
    BoneWeight, Dangly, Emitter, EmitterFlags, Flare, Light, Mesh, ModelNode, NodeKind, Reference,
    Skin, UvAnimation,
};

const DUMMY: u16 = NODE_HEADER;
const LIGHT: u16 = NODE_HEADER | NODE_LIGHT;
const EMITTER: u16 = NODE_HEADER | NODE_EMITTER;
const REFERENCE: u16 = NODE_HEADER | NODE_REFERENCE;
const TRIMESH: u16 = NODE_HEADER | NODE_MESH;
const SKIN: u16 = TRIMESH | NODE_SKIN;
const DANGLY: u16 = TRIMESH | NODE_DANGLY;
const AABB: u16 = TRIMESH | NODE_AABB;
const SABER: u16 = TRIMESH | NODE_SABER;

/// Common 80-byte header of geometry and animation nodes.
pub(super) struct NodeHeader {
    pub flags: u16,
    pub supernode_number: u16,
    pub node_number: u16,
    pub position: [f32; 3],
    pub orientation: [f32; 4],
    pub children: ArrayDef,
    pub controller_keys: ArrayDef,
    pub controller_data: ArrayDef,
}

struct MeshHeader {
    faces: ArrayDef,
    diffuse: [f32; 3],
    ambient: [f32; 3],
    transparency_hint: u32,
    diffuse_texture: String,
    lightmap_texture: String,
    uv_animation: Option<UvAnimation>,
    mdx_stride: u32,
    mdx_flags: u32,
    /// Vertex, normal, colour, four UV sets, four tangent spaces.
    mdx_offsets: [u32; 11],
    vertex_count: u16,
    has_lightmap: bool,
    rotate_texture: bool,
    background_geometry: bool,
    shadow: bool,
    beaming: bool,
    render: bool,
    dirt_enabled: bool,
    dirt_texture: u16,
    dirt_coord_space: u16,
    hide_in_holograms: bool,
    mdx_data_offset: u32,
    vertex_array_offset: u32,
}

impl MeshHeader {
    /// Offset of an attribute inside a vertex record, if stored.
    fn field(&self, flag: u32, slot: usize) -> Option<u64> {
        let offset = self.mdx_offsets[slot];
        (self.mdx_flags & flag != 0 && offset != MDX_ABSENT).then_some(u64::from(offset))
    }

    fn record(&self, vertex: usize) -> u64 {
        u64::from(self.mdx_data_offset) + vertex as u64 * u64::from(self.mdx_stride)
    }

    /// Mesh with every non-geometry field filled in.
    fn to_mesh(&self) -> Mesh {
        Mesh {
            diffuse_texture: optional_name(self.diffuse_texture.clone()),
            lightmap_texture: optional_name(self.lightmap_texture.clone()),
            diffuse: self.diffuse,
            ambient: self.ambient,
            transparency_hint: self.transparency_hint,
            render: self.render,
            shadow: self.shadow,
            has_lightmap: self.has_lightmap,
            beaming: self.beaming,
            background_geometry: self.background_geometry,
            rotate_texture: self.rotate_texture,
            uv_animation: self.uv_animation.clone(),
            dirt_enabled: self.dirt_enabled,
            dirt_texture: self.dirt_texture,
            dirt_coord_space: self.dirt_coord_space,
            hide_in_holograms: self.hide_in_holograms,
            ..Mesh::default()
        }
    }
}

struct SkinHeader {
    weights_offset: u32,
    bones_offset: u32,
    bonemap_offset: u32,
    bonemap_count: u32,
}

struct SaberHeader {
    vertices_offset: u32,
    uvs_offset: u32,
    normals_offset: u32,
}

impl Session<'_> {
    pub(super) fn read_node_header(&mut self, offset: u32) -> Result<NodeHeader> {
        self.mdl.seek(u64::from(offset))?;
        let flags = self.mdl.read_u16()?;
        let supernode_number = self.mdl.read_u16()?;
        let node_number = self.mdl.read_u16()?;
        self.mdl.skip(2 + 4 + 4)?; // padding, root and parent offsets
        let position = self.mdl.read_vec3()?;
        let orientation = self.mdl.read_f32_array::<4>()?;
        Ok(NodeHeader {
            flags,
            supernode_number,
            node_number,
            position,
            orientation,
            children: self.read_array()?,
            controller_keys: self.read_array()?,
            controller_data: self.read_array()?,
        })
    }

    pub(super) fn read_node(&mut self, offset: u32, depth: usize) -> Result<ModelNode> {
        guard(self.options.max_depth, offset, depth, &mut self.visited)?;
        let header = self.read_node_header(offset)?;
        let name = self.name(header.node_number)?;
        debug!("Node {:?} at {} (flags {:#06x})", name, offset, header.flags);

        self.mdl.seek(u64::from(offset) + u64::from(NODE_HEADER_SIZE))?;
        let kind = self.read_node_kind(header.flags)?;
        let tracks = self.read_controllers(header.controller_keys, header.controller_data)?;

        let mut node = ModelNode {
            name,
            node_number: header.node_number,
            supernode_number: header.supernode_number,
            position: header.position,
            orientation: header.orientation,
            scale: 1.0,
            kind,
            children: Vec::new(),
        };
        Self::apply_static_controllers(&mut node, tracks);

        self.offset_names.insert(offset, node.name.clone());
        self.node_sets
            .insert(node.node_number, ControllerSet::of(&node.kind));

        for child in self.read_u32s(header.children)? {
            let child = self.read_node(child, depth + 1)?;
            node.children.push(child);
        }
        Ok(node)
    }

    /// Read the variant blocks that follow the node header.
    fn read_node_kind(&mut self, flags: u16) -> Result<NodeKind> {
        Ok(match flags {
            DUMMY => NodeKind::Dummy,
            LIGHT => NodeKind::Light(self.read_light()?),
            EMITTER => NodeKind::Emitter(self.read_emitter()?),
            REFERENCE => NodeKind::Reference(self.read_reference()?),
            TRIMESH => {
                let header = self.read_mesh_header()?;
                NodeKind::Trimesh(self.read_mesh(&header)?)
            }
            SKIN => {
                let header = self.read_mesh_header()?;
                let skin_header = self.read_skin_header()?;
                NodeKind::Skin {
                    mesh: self.read_mesh(&header)?,
                    skin: self.read_skin(&header, &skin_header)?,
                }
            }
            DANGLY => {
                let header = self.read_mesh_header()?;
                let constraints = self.read_array()?;
                let displacement = self.mdl.read_f32()?;
                let tightness = self.mdl.read_f32()?;
                let period = self.mdl.read_f32()?;
                let _vertex_data_offset = self.mdl.read_u32()?;
                NodeKind::Danglymesh {
                    mesh: self.read_mesh(&header)?,
                    dangly: Dangly {
                        constraints: self.read_f32s(constraints)?,
                        displacement,
                        tightness,
                        period,
                    },
                }
            }
            AABB => {
                let header = self.read_mesh_header()?;
                let root = self.mdl.read_u32()?;
                NodeKind::Aabb {
                    mesh: self.read_mesh(&header)?,
                    tree: self.read_aabb_tree(root)?,
                }
            }
            SABER => {
                let header = self.read_mesh_header()?;
                let saber = SaberHeader {
                    vertices_offset: self.mdl.read_u32()?,
                    uvs_offset: self.mdl.read_u32()?,
                    normals_offset: self.mdl.read_u32()?,
                };
                self.mdl.skip(8)?; // inverted counters
                NodeKind::Lightsaber(self.read_saber(&header, &saber)?)
            }
            other => return Err(Error::UnsupportedNodeType(other)),
        })
    }

    // ==================== Light ====================

    fn read_light(&mut self) -> Result<Light> {
        let flare_radius = self.mdl.read_f32()?;
        let _unknown = self.read_array()?;
        let sizes = self.read_array()?;
        let positions = self.read_array()?;
        let color_shifts = self.read_array()?;
        let textures = self.read_array()?;
        let priority = self.mdl.read_u32()?;
        let ambient_only = self.mdl.read_u32()? != 0;
        let dynamic_type = self.mdl.read_u32()?;
        let affect_dynamic = self.mdl.read_u32()? != 0;
        let shadow = self.mdl.read_u32()? != 0;
        let flare = self.mdl.read_u32()? != 0;
        let fading = self.mdl.read_u32()? != 0;

        let sizes = self.read_f32s(sizes)?;
        let positions = self.read_f32s(positions)?;
        let color_shifts = self.read_vec3s(color_shifts)?;
        let mut texture_names = Vec::with_capacity(textures.count as usize);
        for offset in self.read_u32s(textures)? {
            self.mdl.seek(u64::from(offset))?;
            texture_names.push(self.mdl.read_c_string()?);
        }

        let flares = texture_names
            .into_iter()
            .zip(sizes)
            .zip(positions)
            .zip(color_shifts)
            .map(|(((texture, size), position), color_shift)| Flare {
                texture,
                size,
                position,
                color_shift,
            })
            .collect();

        Ok(Light {
            priority,
            ambient_only,
            dynamic_type,
            affect_dynamic,
            shadow,
            flare,
            fading,
            flare_radius,
            flares,
            ..Light::default()
        })
    }

    fn read_vec3s(&mut self, array: ArrayDef) -> Result<Vec<[f32; 3]>> {
        if array.count == 0 {
            return Ok(Vec::new());
        }
        self.mdl.seek(u64::from(array.offset))?;
        (0..array.count).map(|_| self.mdl.read_vec3()).collect()
    }

    // ==================== Emitter ====================

    fn read_emitter(&mut self) -> Result<Emitter> {
        Ok(Emitter {
            dead_space: self.mdl.read_f32()?,
            blast_radius: self.mdl.read_f32()?,
            blast_length: self.mdl.read_f32()?,
            branch_count: self.mdl.read_u32()?,
            control_point_smoothing: self.mdl.read_f32()?,
            x_grid: self.mdl.read_u32()?,
            y_grid: self.mdl.read_u32()?,
            spawn_type: self.mdl.read_u32()?,
            update: self.mdl.read_c_string_up_to(32)?,
            render: self.mdl.read_c_string_up_to(32)?,
            blend: self.mdl.read_c_string_up_to(32)?,
            texture: self.mdl.read_c_string_up_to(32)?,
            chunk_name: self.mdl.read_c_string_up_to(16)?,
            two_sided_texture: self.mdl.read_u32()? != 0,
            looping: self.mdl.read_u32()? != 0,
            render_order: self.mdl.read_u16()?,
            frame_blending: self.mdl.read_u8()? != 0,
            depth_texture_name: {
                let name = self.mdl.read_c_string_up_to(32)?;
                self.mdl.skip(1)?;
                name
            },
            flags: EmitterFlags::from_bits(self.mdl.read_u32()?),
            controllers: Default::default(),
        })
    }

    fn read_reference(&mut self) -> Result<Reference> {
        Ok(Reference {
            model: self.mdl.read_c_string_up_to(32)?,
            reattachable: self.mdl.read_u32()? != 0,
        })
    }

    // ==================== Mesh ====================

    fn read_mesh_header(&mut self) -> Result<MeshHeader> {
        self.mdl.skip(8)?; // function pointers
        let faces = self.read_array()?;
        self.mdl.skip(24 + 4 + 12)?; // bounds, radius, average point
        let diffuse = self.mdl.read_vec3()?;
        let ambient = self.mdl.read_vec3()?;
        let transparency_hint = self.mdl.read_u32()?;
        let diffuse_texture = self.mdl.read_c_string_up_to(32)?;
        let lightmap_texture = self.mdl.read_c_string_up_to(32)?;
        self.mdl.skip(12 + 12)?;
        let _vertex_index_counts = self.read_array()?;
        let _vertex_index_offsets = self.read_array()?;
        let _inverted_counters = self.read_array()?;
        self.mdl.skip(12 + 8)?;

        let animate_uv = self.mdl.read_u32()? != 0;
        let direction = self.mdl.read_f32_array::<2>()?;
        let jitter = self.mdl.read_f32()?;
        let jitter_speed = self.mdl.read_f32()?;
        let uv_animation = animate_uv.then_some(UvAnimation {
            direction,
            jitter,
            jitter_speed,
        });

        let mdx_stride = self.mdl.read_u32()?;
        let mdx_flags = self.mdl.read_u32()?;
        let mut mdx_offsets = [0; 11];
        for slot in &mut mdx_offsets {
            *slot = self.mdl.read_u32()?;
        }
        let vertex_count = self.mdl.read_u16()?;
        let _texture_count = self.mdl.read_u16()?;
        let has_lightmap = self.mdl.read_u8()? != 0;
        let rotate_texture = self.mdl.read_u8()? != 0;
        let background_geometry = self.mdl.read_u8()? != 0;
        let shadow = self.mdl.read_u8()? != 0;
        let beaming = self.mdl.read_u8()? != 0;
        let render = self.mdl.read_u8()? != 0;

        let (mut dirt_enabled, mut dirt_texture, mut dirt_coord_space, mut hide_in_holograms) =
            (false, 1, 1, false);
        if self.target.is_tsl() {
            dirt_enabled = self.mdl.read_u8()? != 0;
            self.mdl.skip(1)?;
            dirt_texture = self.mdl.read_u16()?;
            dirt_coord_space = self.mdl.read_u16()?;
            hide_in_holograms = self.mdl.read_u8()? != 0;
            self.mdl.skip(1)?;
        }
        self.mdl.skip(2 + 4 + 4)?; // padding, total area, unknown
        let mdx_data_offset = self.mdl.read_u32()?;
        let vertex_array_offset = self.mdl.read_u32()?;

        Ok(MeshHeader {
            faces,
            diffuse,
            ambient,
            transparency_hint,
            diffuse_texture,
            lightmap_texture,
            uv_animation,
            mdx_stride,
            mdx_flags,
            mdx_offsets,
            vertex_count,
            has_lightmap,
            rotate_texture,
            background_geometry,
            shadow,
            beaming,
            render,
            dirt_enabled,
            dirt_texture,
            dirt_coord_space,
            hide_in_holograms,
            mdx_data_offset,
            vertex_array_offset,
        })
    }

    fn read_mesh(&mut self, header: &MeshHeader) -> Result<Mesh> {
        let mut mesh = header.to_mesh();
        mesh.faces = self.read_faces(header.faces)?;

        let count = usize::from(header.vertex_count);
        let uv_slots: Vec<u64> = MDX_UV_FLAGS
            .iter()
            .enumerate()
            .filter_map(|(set, &flag)| header.field(flag, 3 + set))
            .collect();
        mesh.uvs = vec![Vec::with_capacity(count); uv_slots.len()];

        let position = header.field(MDX_VERTEX, 0);
        let normal = header.field(MDX_NORMAL, 1);
        for vertex in 0..count {
            let record = header.record(vertex);
            if let Some(offset) = position {
                self.mdx.seek(record + offset)?;
                mesh.vertices.push(self.mdx.read_vec3()?);
            }
            if let Some(offset) = normal {
                self.mdx.seek(record + offset)?;
                let normal = if self.target.is_xbox() {
                    decompress_xbox_normal(self.mdx.read_u32()?)
                } else {
                    self.mdx.read_vec3()?
                };
                mesh.normals.push(normal);
            }
            for (set, offset) in uv_slots.iter().enumerate() {
                self.mdx.seek(record + offset)?;
                let uv = self.mdx.read_f32_array::<2>()?;
                mesh.uvs[set].push(uv);
            }
        }

        if position.is_none() && count > 0 {
            mesh.vertices = self.read_vec3s(ArrayDef {
                offset: header.vertex_array_offset,
                count: u32::from(header.vertex_count),
            })?;
        }
        Ok(mesh)
    }

    fn read_faces(&mut self, array: ArrayDef) -> Result<Vec<Face>> {
        if array.count == 0 {
            return Ok(Vec::new());
        }
        self.mdl.seek(u64::from(array.offset))?;
        let mut faces = Vec::with_capacity(array.count as usize);
        for _ in 0..array.count {
            let normal = self.mdl.read_vec3()?;
            let distance = self.mdl.read_f32()?;
            let material = self.mdl.read_u32()?;
            self.mdl.skip(6)?; // adjacent faces
            let vertices = [
                u32::from(self.mdl.read_u16()?),
                u32::from(self.mdl.read_u16()?),
                u32::from(self.mdl.read_u16()?),
            ];
            faces.push(Face {
                vertices,
                material,
                normal,
                distance,
            });
        }
        Ok(faces)
    }

    // ==================== Skin ====================

    fn read_skin_header(&mut self) -> Result<SkinHeader> {
        let _unknown = self.read_array()?;
        let weights_offset = self.mdl.read_u32()?;
        let bones_offset = self.mdl.read_u32()?;
        let bonemap_offset = self.mdl.read_u32()?;
        let bonemap_count = self.mdl.read_u32()?;
        let _bind_rotations = self.read_array()?;
        let _bind_translations = self.read_array()?;
        let _unknown = self.read_array()?;
        self.mdl.skip(32 + 4)?; // bone slot table, padding
        Ok(SkinHeader {
            weights_offset,
            bones_offset,
            bonemap_offset,
            bonemap_count,
        })
    }

    /// Resolve per-vertex bone slots to bone names through the bone map.
    fn read_skin(&mut self, mesh: &MeshHeader, header: &SkinHeader) -> Result<Skin> {
        let xbox = self.target.is_xbox();

        self.mdl.seek(u64::from(header.bonemap_offset))?;
        let mut slot_nodes: HashMap<i32, u16> = HashMap::new();
        for node_number in 0..header.bonemap_count {
            let slot = if xbox {
                unsigned_slot(self.mdl.read_u16()?)
            } else {
                self.mdl.read_f32()? as i32
            };
            if slot >= 0 {
                slot_nodes.insert(slot, node_number as u16);
            }
        }

        let mut weights = Vec::with_capacity(usize::from(mesh.vertex_count));
        for vertex in 0..usize::from(mesh.vertex_count) {
            let record = mesh.record(vertex);
            self.mdx.seek(record + u64::from(header.weights_offset))?;
            let values = self.mdx.read_f32_array::<4>()?;
            self.mdx.seek(record + u64::from(header.bones_offset))?;
            let mut slots = [0i32; 4];
            for slot in &mut slots {
                *slot = if xbox {
                    unsigned_slot(self.mdx.read_u16()?)
                } else {
                    self.mdx.read_f32()? as i32
                };
            }

            let mut influences = Vec::new();
            for (weight, slot) in values.into_iter().zip(slots) {
                if slot < 0 {
                    continue;
                }
                let bone = slot_nodes
                    .get(&slot)
                    .and_then(|node_number| self.node_names.get(node_number));
                match bone {
                    Some(bone) => influences.push(BoneWeight {
                        bone: bone.clone(),
                        weight,
                    }),
                    None => warn!("Vertex {} references unmapped bone slot {}", vertex, slot),
                }
            }
            weights.push(influences);
        }
        Ok(Skin { weights })
    }

    // ==================== AABB ====================

    fn read_aabb_tree(&mut self, root: u32) -> Result<Vec<AabbNode>> {
        let mut nodes = Vec::new();
        if root != 0 {
            self.read_aabb_node(root, 0, &mut nodes, &mut HashSet::new())?;
        }
        Ok(nodes)
    }

    /// Append the subtree at `offset` in pre-order; returns its index.
    fn read_aabb_node(
        &mut self,
        offset: u32,
        depth: usize,
        nodes: &mut Vec<AabbNode>,
        seen: &mut HashSet<u32>,
    ) -> Result<u32> {
        guard(self.options.max_depth, offset, depth, seen)?;
        self.mdl.seek(u64::from(offset))?;
        let bbox_min = self.mdl.read_vec3()?;
        let bbox_max = self.mdl.read_vec3()?;
        let left_offset = self.mdl.read_u32()?;
        let right_offset = self.mdl.read_u32()?;
        let face_index = self.mdl.read_i32()?;
        let split_plane = self.mdl.read_u32()?;

        let index = nodes.len();
        nodes.push(AabbNode {
            bbox_min,
            bbox_max,
            face_index,
            split_plane,
            left: 0,
            right: 0,
        });
        if face_index < 0 {
            let left = self.read_aabb_node(left_offset, depth + 1, nodes, seen)?;
            let right = self.read_aabb_node(right_offset, depth + 1, nodes, seen)?;
            nodes[index].left = left;
            nodes[index].right = right;
        }
        Ok(index as u32)
    }

    // ==================== Lightsaber ====================

    fn read_saber(&mut self, header: &MeshHeader, saber: &SaberHeader) -> Result<Mesh> {
        let count = u32::from(header.vertex_count);
        let positions = self.read_vec3s(ArrayDef {
            offset: saber.vertices_offset,
            count,
        })?;
        let normals = self.read_vec3s(ArrayDef {
            offset: saber.normals_offset,
            count,
        })?;
        let mut uvs = Vec::with_capacity(count as usize);
        if count > 0 {
            self.mdl.seek(u64::from(saber.uvs_offset))?;
            for _ in 0..count {
                uvs.push(self.mdl.read_f32_array::<2>()?);
            }
        }

        let kept = kept_vertices(count as usize);
        let pick = |values: &[[f32; 3]]| -> Vec<[f32; 3]> {
            kept.iter().filter_map(|&i| values.get(i).copied()).collect()
        };

        let mut mesh = header.to_mesh();
        mesh.vertices = pick(&positions);
        mesh.normals = pick(&normals);
        if !uvs.is_empty() {
            mesh.uvs = vec![kept.iter().filter_map(|&i| uvs.get(i).copied()).collect()];
        }
        mesh.faces = saber_faces(&mesh.vertices);
        Ok(mesh)
    }
}

/// Xbox bone slots are unsigned with 0xFFFF for "none".
fn unsigned_slot(value: u16) -> i32 {
    if value == u16::MAX { -1 } else { i32::from(value) }
}
