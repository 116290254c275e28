//! Mesh node encoding
//!
//! Writes the mesh header and its variant block, then the face, index and
//! vertex arrays into the body and the interleaved vertex records into the
//! MDX stream. Bounds, area, adjacency and skin bind poses are derived here.

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use super::{Encoder, name_or_null, to_u16, to_u32};
use crate::error::{Error, Result};
use crate::formats::common::{
    Face, bounds, build_aabb_tree, compress_xbox_normal, faces_from_mesh, plane_distance,
};
use crate::formats::mdl::constants::{
    AABB_NODE_SIZE, DANGLY_FN_PTRS, FunctionPointers, MDX_ABSENT, MDX_NORMAL, MDX_TERMINATOR, MDX_UV_FLAGS,
    MDX_VERTEX, MESH_FN_PTRS, SABER_VERTEX_COUNT, SKIN_FN_PTRS,
};
use crate::formats::mdl::types::{Dangly, Mesh, NodeKind, Skin};

const NO_ADJACENT_FACE: u16 = 0xFFFF;

/// Per-vertex record layout in the MDX stream.
struct MdxLayout {
    stride: u32,
    flags: u32,
    offsets: [u32; 11],
    skin_weights: u32,
    skin_bones: u32,
}

impl MdxLayout {
    fn absent() -> Self {
        Self {
            stride: 0,
            flags: 0,
            offsets: [MDX_ABSENT; 11],
            skin_weights: MDX_ABSENT,
            skin_bones: MDX_ABSENT,
        }
    }

    fn new(mesh: &Mesh, skinned: bool, xbox: bool) -> Self {
        let mut layout = Self::absent();
        let mut cursor = 0;

        layout.flags |= MDX_VERTEX;
        layout.offsets[0] = cursor;
        cursor += 12;
        if !mesh.normals.is_empty() {
            layout.flags |= MDX_NORMAL;
            layout.offsets[1] = cursor;
            cursor += if xbox { 4 } else { 12 };
        }
        for (set, flag) in MDX_UV_FLAGS.iter().enumerate().take(mesh.uvs.len()) {
            layout.flags |= flag;
            layout.offsets[3 + set] = cursor;
            cursor += 8;
        }
        if skinned {
            layout.skin_weights = cursor;
            cursor += 16;
            layout.skin_bones = cursor;
            cursor += if xbox { 8 } else { 16 };
        }
        layout.stride = cursor;
        layout
    }
}

/// Reserved offset slots of a mesh header.
struct MeshSlots {
    faces: u64,
    index_counts: u64,
    index_offsets: u64,
    inverted_counter: u64,
    mdx_data: u64,
    vertex_array: u64,
}

/// Bone slots of a skin mesh.
struct SkinBinding {
    /// Bone node number of each slot.
    bones: Vec<u16>,
    /// Per-vertex weights and slots, padded with slot -1.
    vertices: Vec<([f32; 4], [i32; 4])>,
}

/// Engine mesh counter sequence: 98, 97, ... wrapping per hundred.
fn inverted_counter(count: u32) -> u32 {
    let quotient = count / 100;
    let remainder = count % 100;
    let power = 1i64 << quotient.min(32);
    let mut value = power * 100 - i64::from(count);
    if remainder != 0 {
        value += i64::from(quotient) * 100;
    }
    if quotient == 0 {
        value -= 1;
    }
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Neighbouring face across each edge.
fn face_adjacency(faces: &[Face]) -> Vec<[u16; 3]> {
    let edge = |face: &Face, corner: usize| {
        let a = face.vertices[corner];
        let b = face.vertices[(corner + 1) % 3];
        (a.min(b), a.max(b))
    };
    let mut edges: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (index, face) in faces.iter().enumerate() {
        for corner in 0..3 {
            edges.entry(edge(face, corner)).or_default().push(index);
        }
    }
    faces
        .iter()
        .enumerate()
        .map(|(index, face)| {
            std::array::from_fn(|corner| {
                edges
                    .get(&edge(face, corner))
                    .and_then(|shared| shared.iter().find(|&&other| other != index))
                    .map_or(NO_ADJACENT_FACE, |&other| other as u16)
            })
        })
        .collect()
}

fn validate_mesh(mesh: &Mesh, saber: bool) -> Result<()> {
    let count = mesh.vertices.len();
    to_u16(count, "vertex count")?;
    to_u16(mesh.faces.len(), "face count")?;
    if saber && count != SABER_VERTEX_COUNT {
        return Err(Error::InvalidInput(format!(
            "lightsaber blade needs {SABER_VERTEX_COUNT} vertices, found {count}"
        )));
    }
    if !mesh.normals.is_empty() && mesh.normals.len() != count {
        return Err(Error::InvalidInput(format!(
            "{} normals for {count} vertices",
            mesh.normals.len()
        )));
    }
    if mesh.uvs.len() > MDX_UV_FLAGS.len() || mesh.uvs.iter().any(|set| set.len() != count) {
        return Err(Error::InvalidInput(
            "UV sets must number at most four and match the vertex count".to_string(),
        ));
    }
    if let Some(face) = mesh
        .faces
        .iter()
        .find(|face| face.vertices.iter().any(|&v| v as usize >= count))
    {
        return Err(Error::InvalidInput(format!(
            "face {:?} references a missing vertex",
            face.vertices
        )));
    }
    Ok(())
}

impl Encoder<'_> {
    pub(super) fn write_mesh_node(&mut self, kind: &NodeKind, number: u16) -> Result<()> {
        let Some(mesh) = kind.mesh() else {
            return Ok(());
        };
        let saber = matches!(kind, NodeKind::Lightsaber(_));
        validate_mesh(mesh, saber)?;
        self.mesh_count += 1;

        let fn_ptrs: &FunctionPointers = match kind {
            NodeKind::Skin { .. } => &SKIN_FN_PTRS,
            NodeKind::Danglymesh { .. } => &DANGLY_FN_PTRS,
            _ => &MESH_FN_PTRS,
        };
        let binding = match kind {
            NodeKind::Skin { skin, .. } => Some(self.bind_skin(mesh, skin)?),
            _ => None,
        };
        let layout = if saber {
            MdxLayout::absent()
        } else {
            MdxLayout::new(mesh, binding.is_some(), self.target.is_xbox())
        };

        let slots = self.write_mesh_header(mesh, fn_ptrs, &layout, saber)?;
        match kind {
            NodeKind::Skin { .. } => {
                let skin_slots = self.write_skin_header(&layout, binding.as_ref())?;
                self.write_mesh_data(mesh, &slots, &layout, binding.as_ref(), saber)?;
                if let Some(binding) = &binding {
                    self.write_skin_data(skin_slots, binding, number)?;
                }
            }
            NodeKind::Danglymesh { dangly, .. } => {
                let dangly_slots = self.write_dangly_header(mesh, dangly)?;
                self.write_mesh_data(mesh, &slots, &layout, None, saber)?;
                self.write_dangly_data(mesh, dangly, dangly_slots)?;
            }
            NodeKind::Aabb { .. } => {
                let root = self.body.reserve_u32()?;
                self.write_mesh_data(mesh, &slots, &layout, None, saber)?;
                self.write_aabb_tree(mesh, root)?;
            }
            NodeKind::Lightsaber(_) => {
                let saber_slots = [
                    self.body.reserve_u32()?,
                    self.body.reserve_u32()?,
                    self.body.reserve_u32()?,
                ];
                let counter = inverted_counter(self.mesh_count);
                self.body.write_u32(counter)?;
                self.body.write_u32(counter)?;
                self.write_mesh_data(mesh, &slots, &layout, None, saber)?;
                self.write_saber_data(mesh, saber_slots)?;
            }
            _ => self.write_mesh_data(mesh, &slots, &layout, None, saber)?,
        }
        Ok(())
    }

    fn write_mesh_header(
        &mut self,
        mesh: &Mesh,
        fn_ptrs: &FunctionPointers,
        layout: &MdxLayout,
        saber: bool,
    ) -> Result<MeshSlots> {
        let (fn_ptr1, fn_ptr2) = self.target.pick(fn_ptrs);
        self.body.write_u32(fn_ptr1)?;
        self.body.write_u32(fn_ptr2)?;
        let face_count = if saber { 0 } else { mesh.faces.len() };
        let faces = self.reserve_array(face_count)?;

        let (min, max) = bounds(&mesh.vertices);
        let center = (Vec3::from_array(min) + Vec3::from_array(max)) * 0.5;
        let radius = mesh
            .vertices
            .iter()
            .map(|v| Vec3::from_array(*v).distance(center))
            .fold(0.0f32, f32::max);
        let average = if mesh.vertices.is_empty() {
            Vec3::ZERO
        } else {
            mesh.vertices.iter().map(|v| Vec3::from_array(*v)).sum::<Vec3>()
                / mesh.vertices.len() as f32
        };
        self.body.write_f32_slice(&min)?;
        self.body.write_f32_slice(&max)?;
        self.body.write_f32(radius)?;
        self.body.write_f32_slice(&average.to_array())?;

        self.body.write_f32_slice(&mesh.diffuse)?;
        self.body.write_f32_slice(&mesh.ambient)?;
        self.body.write_u32(mesh.transparency_hint)?;
        self.body
            .write_fixed_string(name_or_null(mesh.diffuse_texture.as_deref()), 32)?;
        self.body
            .write_fixed_string(name_or_null(mesh.lightmap_texture.as_deref()), 32)?;
        self.body.write_zeros(12 + 12)?;

        let index_arrays = usize::from(face_count > 0);
        let index_counts = self.reserve_array(index_arrays)?;
        let index_offsets = self.reserve_array(index_arrays)?;
        let inverted_counter = self.reserve_array(1)?;
        self.body.write_i32(-1)?;
        self.body.write_i32(-1)?;
        self.body.write_i32(0)?;
        self.body.write_zeros(8)?;

        match &mesh.uv_animation {
            Some(animation) => {
                self.body.write_u32(1)?;
                self.body.write_f32_slice(&animation.direction)?;
                self.body.write_f32(animation.jitter)?;
                self.body.write_f32(animation.jitter_speed)?;
            }
            None => self.body.write_zeros(20)?,
        }

        self.body.write_u32(layout.stride)?;
        self.body.write_u32(layout.flags)?;
        for offset in layout.offsets {
            self.body.write_u32(offset)?;
        }
        self.body
            .write_u16(to_u16(mesh.vertices.len(), "vertex count")?)?;
        self.body.write_u16(mesh.uvs.len() as u16)?;
        for flag in [
            mesh.has_lightmap,
            mesh.rotate_texture,
            mesh.background_geometry,
            mesh.shadow,
            mesh.beaming,
            mesh.render,
        ] {
            self.body.write_u8(u8::from(flag))?;
        }
        if self.target.is_tsl() {
            self.body.write_u8(u8::from(mesh.dirt_enabled))?;
            self.body.write_u8(0)?;
            self.body.write_u16(mesh.dirt_texture)?;
            self.body.write_u16(mesh.dirt_coord_space)?;
            self.body.write_u8(u8::from(mesh.hide_in_holograms))?;
            self.body.write_u8(0)?;
        }
        self.body.write_u16(0)?;
        let total_area: f32 = mesh.faces.iter().map(|f| f.area(&mesh.vertices)).sum();
        self.body.write_f32(total_area)?;
        self.body.write_u32(0)?;
        let mdx_data = self.body.reserve_u32()?;
        let vertex_array = self.body.reserve_u32()?;

        Ok(MeshSlots {
            faces,
            index_counts,
            index_offsets,
            inverted_counter,
            mdx_data,
            vertex_array,
        })
    }

    fn write_mesh_data(
        &mut self,
        mesh: &Mesh,
        slots: &MeshSlots,
        layout: &MdxLayout,
        binding: Option<&SkinBinding>,
        saber: bool,
    ) -> Result<()> {
        let mut index_slot = None;
        if !saber && !mesh.faces.is_empty() {
            self.patch_here(slots.faces)?;
            let adjacency = face_adjacency(&mesh.faces);
            for (face, adjacent) in mesh.faces.iter().zip(adjacency) {
                let (normal, distance) = if face.normal == [0.0; 3] {
                    let normal = face.compute_normal(&mesh.vertices);
                    let first = mesh.vertices[face.vertices[0] as usize];
                    (normal, plane_distance(normal, first))
                } else {
                    (face.normal, face.distance)
                };
                self.body.write_f32_slice(&normal)?;
                self.body.write_f32(distance)?;
                self.body.write_u32(face.material)?;
                for neighbour in adjacent {
                    self.body.write_u16(neighbour)?;
                }
                for vertex in face.vertices {
                    self.body.write_u16(vertex as u16)?;
                }
            }

            self.patch_here(slots.index_counts)?;
            self.body
                .write_u32(to_u32(mesh.faces.len() * 3, "index count")?)?;
            self.patch_here(slots.index_offsets)?;
            index_slot = Some(self.body.reserve_u32()?);
        }

        self.patch_here(slots.inverted_counter)?;
        self.body.write_u32(inverted_counter(self.mesh_count))?;

        if let Some(slot) = index_slot {
            self.patch_here(slot)?;
            for face in &mesh.faces {
                for vertex in face.vertices {
                    self.body.write_u16(vertex as u16)?;
                }
            }
            self.body.align(4)?;
        }

        if !mesh.vertices.is_empty() {
            self.patch_here(slots.vertex_array)?;
            for vertex in &mesh.vertices {
                self.body.write_f32_slice(vertex)?;
            }
        }

        if !saber && !mesh.vertices.is_empty() {
            let start = to_u32(self.mdx.tell()? as usize, "MDX offset")?;
            self.body.write_u32_at(slots.mdx_data, start)?;
            self.write_mdx_records(mesh, layout, binding)?;
        }
        Ok(())
    }

    /// Interleaved vertex records followed by the terminator row.
    fn write_mdx_records(
        &mut self,
        mesh: &Mesh,
        layout: &MdxLayout,
        binding: Option<&SkinBinding>,
    ) -> Result<()> {
        let xbox = self.target.is_xbox();
        for (index, position) in mesh.vertices.iter().enumerate() {
            self.mdx.write_f32_slice(position)?;
            if let Some(normal) = mesh.normals.get(index) {
                if xbox {
                    self.mdx.write_u32(compress_xbox_normal(*normal))?;
                } else {
                    self.mdx.write_f32_slice(normal)?;
                }
            }
            for set in &mesh.uvs {
                self.mdx.write_f32_slice(&set[index])?;
            }
            if let Some((weights, slots)) = binding.and_then(|b| b.vertices.get(index)) {
                self.mdx.write_f32_slice(weights)?;
                for &slot in slots {
                    if xbox {
                        self.mdx
                            .write_u16(u16::try_from(slot).unwrap_or(u16::MAX))?;
                    } else {
                        self.mdx.write_f32(slot as f32)?;
                    }
                }
            }
        }
        self.mdx.write_f32_slice(&[MDX_TERMINATOR; 3])?;
        self.mdx.write_zeros(layout.stride as usize - 12)
    }

    // ==================== Skin ====================

    fn bind_skin(&self, mesh: &Mesh, skin: &Skin) -> Result<SkinBinding> {
        if skin.weights.len() != mesh.vertices.len() {
            return Err(Error::InvalidInput(format!(
                "{} skin weight lists for {} vertices",
                skin.weights.len(),
                mesh.vertices.len()
            )));
        }
        let mut bones: Vec<u16> = Vec::new();
        let mut slots: HashMap<u16, i32> = HashMap::new();
        let mut vertices = Vec::with_capacity(skin.weights.len());
        for influences in &skin.weights {
            if influences.len() > 4 {
                return Err(Error::InvalidInput(format!(
                    "vertex has {} bone influences, at most 4 are stored",
                    influences.len()
                )));
            }
            let mut weights = [0.0; 4];
            let mut vertex_slots = [-1; 4];
            for (i, influence) in influences.iter().enumerate() {
                let number = self
                    .numbers
                    .get(&influence.bone)
                    .copied()
                    .filter(|&number| usize::from(number) < self.geometry_count)
                    .ok_or_else(|| {
                        Error::InvalidInput(format!("unknown bone {:?}", influence.bone))
                    })?;
                let slot = *slots.entry(number).or_insert_with(|| {
                    bones.push(number);
                    bones.len() as i32 - 1
                });
                weights[i] = influence.weight;
                vertex_slots[i] = slot;
            }
            vertices.push((weights, vertex_slots));
        }
        Ok(SkinBinding { bones, vertices })
    }

    fn write_skin_header(
        &mut self,
        layout: &MdxLayout,
        binding: Option<&SkinBinding>,
    ) -> Result<[u64; 3]> {
        let node_count = self.geometry_count;
        self.write_empty_array()?;
        self.body.write_u32(layout.skin_weights)?;
        self.body.write_u32(layout.skin_bones)?;
        let bonemap = self.body.reserve_u32()?;
        self.body.write_u32(to_u32(node_count, "bone map length")?)?;
        let rotations = self.reserve_array(node_count)?;
        let translations = self.reserve_array(node_count)?;
        self.write_empty_array()?;
        for index in 0..16 {
            let bone = binding
                .and_then(|binding| binding.bones.get(index))
                .copied()
                .unwrap_or(u16::MAX);
            self.body.write_u16(bone)?;
        }
        self.body.write_u32(0)?;
        Ok([bonemap, rotations, translations])
    }

    /// Bone map plus bind-pose rotation and translation of every node
    /// relative to the skin.
    fn write_skin_data(&mut self, slots: [u64; 3], binding: &SkinBinding, skin: u16) -> Result<()> {
        let [bonemap, rotations, translations] = slots;
        let xbox = self.target.is_xbox();

        self.patch_here(bonemap)?;
        for number in 0..self.geometry_count {
            let slot = binding.bones.iter().position(|&bone| usize::from(bone) == number);
            if xbox {
                self.body
                    .write_u16(slot.map_or(u16::MAX, |slot| slot as u16))?;
            } else {
                self.body.write_f32(slot.map_or(-1.0, |slot| slot as f32))?;
            }
        }
        self.body.align(4)?;

        let skin_world = self
            .world
            .get(usize::from(skin))
            .copied()
            .unwrap_or(Mat4::IDENTITY);
        let bind_poses: Vec<_> = self
            .world
            .iter()
            .map(|bone| {
                let (_, rotation, translation) =
                    (bone.inverse() * skin_world).to_scale_rotation_translation();
                (rotation, translation)
            })
            .collect();

        self.patch_here(rotations)?;
        for (rotation, _) in &bind_poses {
            self.body
                .write_f32_slice(&[rotation.w, rotation.x, rotation.y, rotation.z])?;
        }
        self.patch_here(translations)?;
        for (_, translation) in &bind_poses {
            self.body.write_f32_slice(&translation.to_array())?;
        }
        Ok(())
    }

    // ==================== Dangly ====================

    fn write_dangly_header(&mut self, mesh: &Mesh, dangly: &Dangly) -> Result<[u64; 2]> {
        if !dangly.constraints.is_empty() && dangly.constraints.len() != mesh.vertices.len() {
            return Err(Error::InvalidInput(format!(
                "{} constraints for {} vertices",
                dangly.constraints.len(),
                mesh.vertices.len()
            )));
        }
        let constraints = self.reserve_array(dangly.constraints.len())?;
        self.body.write_f32(dangly.displacement)?;
        self.body.write_f32(dangly.tightness)?;
        self.body.write_f32(dangly.period)?;
        let vertex_data = self.body.reserve_u32()?;
        Ok([constraints, vertex_data])
    }

    fn write_dangly_data(&mut self, mesh: &Mesh, dangly: &Dangly, slots: [u64; 2]) -> Result<()> {
        let [constraints, vertex_data] = slots;
        if !dangly.constraints.is_empty() {
            self.patch_here(constraints)?;
            self.body.write_f32_slice(&dangly.constraints)?;
        }
        if !mesh.vertices.is_empty() {
            self.patch_here(vertex_data)?;
            for vertex in &mesh.vertices {
                self.body.write_f32_slice(vertex)?;
            }
        }
        Ok(())
    }

    // ==================== AABB ====================

    /// Rebuild the tree from the mesh faces and write it in pre-order.
    fn write_aabb_tree(&mut self, mesh: &Mesh, root: u64) -> Result<()> {
        if mesh.faces.is_empty() {
            return Ok(());
        }
        let tree = build_aabb_tree(&faces_from_mesh(&mesh.vertices, &mesh.faces)?)?;
        let base = self.here()?;
        self.body.write_u32_at(root, base)?;
        let node_offset = |index: u32| base + index * AABB_NODE_SIZE;
        for node in &tree {
            self.body.write_f32_slice(&node.bbox_min)?;
            self.body.write_f32_slice(&node.bbox_max)?;
            if node.is_leaf() {
                self.body.write_u32(0)?;
                self.body.write_u32(0)?;
            } else {
                self.body.write_u32(node_offset(node.left))?;
                self.body.write_u32(node_offset(node.right))?;
            }
            self.body.write_i32(node.face_index)?;
            self.body.write_u32(node.split_plane)?;
        }
        Ok(())
    }

    // ==================== Lightsaber ====================

    fn write_saber_data(&mut self, mesh: &Mesh, slots: [u64; 3]) -> Result<()> {
        let [vertices, uvs, normals] = slots;
        self.patch_here(vertices)?;
        for vertex in &mesh.vertices {
            self.body.write_f32_slice(vertex)?;
        }
        self.patch_here(uvs)?;
        for index in 0..mesh.vertices.len() {
            let uv = mesh
                .uvs
                .first()
                .and_then(|set| set.get(index))
                .copied()
                .unwrap_or_default();
            self.body.write_f32_slice(&uv)?;
        }
        self.patch_here(normals)?;
        for index in 0..mesh.vertices.len() {
            let normal = mesh.normals.get(index).copied().unwrap_or_default();
            self.body.write_f32_slice(&normal)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_counter_sequence() {
        assert_eq!(inverted_counter(1), 98);
        assert_eq!(inverted_counter(2), 97);
        assert_eq!(inverted_counter(99), 0);
        assert_eq!(inverted_counter(100), 100);
        assert_eq!(inverted_counter(101), 199);
    }

    #[test]
    fn test_face_adjacency() {
        let faces = vec![Face::new([0, 1, 2], 0), Face::new([2, 1, 3], 0)];
        let adjacency = face_adjacency(&faces);
        assert_eq!(adjacency[0], [NO_ADJACENT_FACE, 1, NO_ADJACENT_FACE]);
        assert_eq!(adjacency[1], [0, NO_ADJACENT_FACE, NO_ADJACENT_FACE]);
    }

    #[test]
    fn test_mdx_layout() {
        let mesh = Mesh {
            vertices: vec![[0.0; 3]],
            normals: vec![[0.0, 0.0, 1.0]],
            uvs: vec![vec![[0.0; 2]], vec![[0.0; 2]]],
            ..Mesh::default()
        };
        let pc = MdxLayout::new(&mesh, true, false);
        assert_eq!(pc.offsets[..5], [0, 12, MDX_ABSENT, 24, 32]);
        assert_eq!((pc.skin_weights, pc.skin_bones, pc.stride), (40, 56, 72));
        let xbox = MdxLayout::new(&mesh, true, true);
        assert_eq!(xbox.offsets[3], 16);
        assert_eq!(xbox.stride, 56);
        assert_eq!(pc.flags, MDX_VERTEX | MDX_NORMAL | MDX_UV_FLAGS[0] | MDX_UV_FLAGS[1]);
    }
}
