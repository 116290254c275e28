//! MDL/MDX file writing and serialization
//!
//! The body is written in one forward pass. Offsets that point forward are
//! reserved as zero words and patched once their target has been placed,
//! so every stored offset is relative to the end of the file header.

mod animations;
mod controllers;
mod mesh;
mod nodes;

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use tracing::{debug, info};

use super::constants::{
    GEOMETRY_HEADER_SIZE, MODEL_FN_PTRS, MODEL_HEADER_SIZE, MODEL_TYPE_GEOMETRY, NULL_NAME,
};
use super::controllers::ControllerSet;
use super::options::{MdlWriteOptions, Target};
use super::types::{AnimationNode, Model, ModelNode, NodeKind};
use crate::error::{Error, Result};
use crate::utils::{BinaryWriter, mdx_path_for};

/// Encoded MDL body and MDX companion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MdlBytes {
    pub mdl: Vec<u8>,
    pub mdx: Vec<u8>,
}

/// Write a model to `path` and its vertex data next to it
///
/// The MDX file takes the MDL path with its extension swapped.
pub fn write_mdl<P: AsRef<Path>>(model: &Model, path: P, options: &MdlWriteOptions) -> Result<()> {
    let path = path.as_ref();
    info!("Writing model {} ({:?})", path.display(), options.target());
    let bytes = serialize_mdl(model, options)?;
    std::fs::write(path, &bytes.mdl)?;
    std::fs::write(mdx_path_for(path), &bytes.mdx)?;
    Ok(())
}

/// Serialize a model to MDL and MDX bytes
///
/// # Errors
/// Returns [`Error::InvalidInput`] when the tree cannot be represented: a
/// non-dummy root, duplicate node names, a face referencing a missing
/// vertex, an unknown bone or controller label, or a value that overflows
/// its on-disk field.
pub fn serialize_mdl(model: &Model, options: &MdlWriteOptions) -> Result<MdlBytes> {
    let mut encoder = Encoder::new(model, options)?;
    encoder.write_model(model)?;

    let body = encoder.body.into_inner().into_inner();
    let mdx = encoder.mdx.into_inner().into_inner();
    debug!("Encoded MDL body {} bytes, MDX {} bytes", body.len(), mdx.len());

    let mut mdl = BinaryWriter::new(Cursor::new(Vec::with_capacity(body.len() + 12)));
    mdl.write_u32(0)?;
    mdl.write_u32(to_u32(body.len(), "MDL size")?)?;
    mdl.write_u32(to_u32(mdx.len(), "MDX size")?)?;
    mdl.write_bytes(&body)?;
    Ok(MdlBytes {
        mdl: mdl.into_inner().into_inner(),
        mdx,
    })
}

pub(super) fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::InvalidInput(format!("{what} {value} exceeds u32")))
}

pub(super) fn to_u16(value: usize, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::InvalidInput(format!("{what} {value} exceeds u16")))
}

/// Name slot contents, `NULL` for none.
pub(super) fn name_or_null(name: Option<&str>) -> &str {
    name.filter(|name| !name.is_empty()).unwrap_or(NULL_NAME)
}

/// State of one encode call.
pub(super) struct Encoder<'a> {
    pub body: BinaryWriter<Cursor<Vec<u8>>>,
    pub mdx: BinaryWriter<Cursor<Vec<u8>>>,
    pub target: Target,
    pub options: &'a MdlWriteOptions,
    /// Name table; geometry nodes first in pre-order.
    pub names: Vec<String>,
    /// Node number by name.
    pub numbers: HashMap<String, u16>,
    /// Number of geometry nodes.
    pub geometry_count: usize,
    /// Controller set of each geometry node, by node number.
    pub sets: HashMap<u16, ControllerSet>,
    /// World transform of each geometry node, by node number.
    pub world: Vec<Mat4>,
    /// Body offset of each written geometry node, by name.
    pub node_offsets: HashMap<String, u32>,
    /// Running count of meshes, feeds the inverted counters.
    pub mesh_count: u32,
}

impl<'a> Encoder<'a> {
    fn new(model: &Model, options: &'a MdlWriteOptions) -> Result<Self> {
        if !matches!(model.root.kind, NodeKind::Dummy) {
            return Err(Error::InvalidInput(format!(
                "root node {:?} must be a dummy",
                model.root.name
            )));
        }

        let mut encoder = Self {
            body: BinaryWriter::new(Cursor::new(Vec::new())),
            mdx: BinaryWriter::new(Cursor::new(Vec::new())),
            target: options.target(),
            options,
            names: Vec::new(),
            numbers: HashMap::new(),
            geometry_count: 0,
            sets: HashMap::new(),
            world: Vec::new(),
            node_offsets: HashMap::new(),
            mesh_count: 0,
        };
        encoder.number_nodes(&model.root, Mat4::IDENTITY)?;
        encoder.geometry_count = encoder.names.len();
        for animation in &model.animations {
            encoder.number_animation_nodes(&animation.root)?;
        }
        to_u16(encoder.names.len(), "name count")?;
        Ok(encoder)
    }

    /// Assign pre-order node numbers and world transforms to geometry nodes.
    fn number_nodes(&mut self, node: &ModelNode, parent: Mat4) -> Result<()> {
        if self.numbers.contains_key(&node.name) {
            return Err(Error::InvalidInput(format!(
                "duplicate node name {:?}",
                node.name
            )));
        }
        let number = to_u16(self.names.len(), "node count")?;
        self.numbers.insert(node.name.clone(), number);
        self.names.push(node.name.clone());
        self.sets.insert(number, ControllerSet::of(&node.kind));

        let world = parent * local_transform(node);
        self.world.push(world);
        for child in &node.children {
            self.number_nodes(child, world)?;
        }
        Ok(())
    }

    /// Append animation-only node names to the name table.
    fn number_animation_nodes(&mut self, node: &AnimationNode) -> Result<()> {
        if !self.numbers.contains_key(&node.name) {
            let number = to_u16(self.names.len(), "node count")?;
            self.numbers.insert(node.name.clone(), number);
            self.names.push(node.name.clone());
        }
        for child in &node.children {
            self.number_animation_nodes(child)?;
        }
        Ok(())
    }

    pub(super) fn here(&mut self) -> Result<u32> {
        let position = self.body.tell()?;
        u32::try_from(position)
            .map_err(|_| Error::InvalidInput(format!("MDL body offset {position} exceeds u32")))
    }

    /// Point a reserved offset slot at the current position.
    pub(super) fn patch_here(&mut self, slot: u64) -> Result<()> {
        let here = self.here()?;
        self.body.write_u32_at(slot, here)
    }

    /// Write an `(offset, count, count)` descriptor with the offset left zero.
    pub(super) fn reserve_array(&mut self, count: usize) -> Result<u64> {
        let count = to_u32(count, "array length")?;
        let slot = self.body.reserve_u32()?;
        self.body.write_u32(count)?;
        self.body.write_u32(count)?;
        Ok(slot)
    }

    pub(super) fn write_empty_array(&mut self) -> Result<()> {
        self.body.write_zeros(12)
    }

    /// Write the geometry header shared by models and animations.
    pub(super) fn write_geometry_header(
        &mut self,
        fn_ptrs: (u32, u32),
        name: &str,
        node_count: usize,
        model_type: u8,
    ) -> Result<u64> {
        self.body.write_u32(fn_ptrs.0)?;
        self.body.write_u32(fn_ptrs.1)?;
        self.body.write_fixed_string(name, 32)?;
        let root = self.body.reserve_u32()?;
        self.body.write_u32(to_u32(node_count, "node count")?)?;
        self.body.write_zeros(24)?;
        self.body.write_u32(0)?; // reference count
        self.body.write_u8(model_type)?;
        self.body.write_zeros(3)?;
        Ok(root)
    }

    fn write_model(&mut self, model: &Model) -> Result<()> {
        let root_slot = self.write_geometry_header(
            self.target.pick(&MODEL_FN_PTRS),
            &model.name,
            self.geometry_count,
            MODEL_TYPE_GEOMETRY,
        )?;
        debug_assert_eq!(self.body.tell()?, u64::from(GEOMETRY_HEADER_SIZE));

        // Model header
        self.body.write_u8(model.classification as u8)?;
        self.body.write_u8(model.subclassification)?;
        self.body.write_u8(0)?;
        self.body.write_u8(u8::from(model.affected_by_fog))?;
        self.body.write_u32(0)?; // child model count
        let animations_slot = self.reserve_array(model.animations.len())?;
        self.body.write_u32(0)?; // supermodel reference
        self.body.write_f32_slice(&model.bounding_box)?;
        self.body.write_f32(model.radius)?;
        self.body.write_f32(model.animation_scale)?;
        self.body
            .write_fixed_string(name_or_null(model.supermodel.as_deref()), 32)?;
        let animation_root_slot = self.body.reserve_u32()?;
        self.body.write_u32(0)?;
        let mdx_size_slot = self.body.reserve_u32()?;
        self.body.write_u32(0)?; // MDX offset
        let names_slot = self.reserve_array(self.names.len())?;
        debug_assert_eq!(
            self.body.tell()?,
            u64::from(GEOMETRY_HEADER_SIZE + MODEL_HEADER_SIZE)
        );

        self.write_name_table(names_slot)?;

        let animation_slots = self.body.tell()?;
        self.body.write_zeros(model.animations.len() * 4)?;
        if !model.animations.is_empty() {
            self.body.write_u32_at(animations_slot, animation_slots as u32)?;
        }

        let root = self.write_node(&model.root, 0)?;
        self.body.write_u32_at(root_slot, root)?;

        if let Some(name) = &model.animation_root {
            let offset = self.node_offsets.get(name).copied().ok_or_else(|| {
                Error::InvalidInput(format!("animation root {name:?} is not a node"))
            })?;
            self.body.write_u32_at(animation_root_slot, offset)?;
        }

        for (index, animation) in model.animations.iter().enumerate() {
            let offset = self.write_animation(animation)?;
            self.body
                .write_u32_at(animation_slots + 4 * index as u64, offset)?;
        }

        let mdx_size = self.mdx.tell()?;
        self.body.write_u32_at(mdx_size_slot, mdx_size as u32)?;
        Ok(())
    }

    fn write_name_table(&mut self, slot: u64) -> Result<()> {
        if self.names.is_empty() {
            return Ok(());
        }
        self.patch_here(slot)?;
        let table = self.body.tell()?;
        self.body.write_zeros(self.names.len() * 4)?;
        let names = std::mem::take(&mut self.names);
        for (index, name) in names.iter().enumerate() {
            let offset = self.here()?;
            self.body.write_u32_at(table + 4 * index as u64, offset)?;
            self.body.write_c_string(name)?;
        }
        self.names = names;
        self.body.align(4)
    }
}

/// Local transform of a node from its position and orientation.
fn local_transform(node: &ModelNode) -> Mat4 {
    let rotation = Quat::from_array(node.orientation);
    let rotation = if rotation.length_squared() > 0.0 {
        rotation.normalize()
    } else {
        Quat::IDENTITY
    };
    Mat4::from_rotation_translation(rotation, Vec3::from_array(node.position))
}
