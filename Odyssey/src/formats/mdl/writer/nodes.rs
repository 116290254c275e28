//! Geometry node encoding

use super::Encoder;
use super::controllers::{ControllerLayout, static_tracks};
use crate::error::{Error, Result};
use crate::formats::mdl::types::{Emitter, Light, ModelNode, NodeKind, Reference};

impl Encoder<'_> {
    /// Write `node` and its subtree; returns the node's offset.
    pub(super) fn write_node(&mut self, node: &ModelNode, parent: u32) -> Result<u32> {
        let offset = self.here()?;
        let number = self.number_of(&node.name)?;
        self.node_offsets.insert(node.name.clone(), offset);
        let controllers = ControllerLayout::new(static_tracks(node)?)?;

        self.body.write_u16(node.kind.flags())?;
        self.body.write_u16(node.supernode_number)?;
        self.body.write_u16(number)?;
        self.body.write_u16(0)?;
        self.body.write_u32(0)?; // root: the geometry header
        self.body.write_u32(parent)?;
        self.body.write_f32_slice(&node.position)?;
        self.body.write_f32_slice(&node.orientation)?;
        let children_slot = self.reserve_array(node.children.len())?;
        let keys_slot = self.reserve_array(controllers.key_count())?;
        let data_slot = self.reserve_array(controllers.data_len())?;

        match &node.kind {
            NodeKind::Dummy => {}
            NodeKind::Light(light) => self.write_light(light)?,
            NodeKind::Emitter(emitter) => self.write_emitter(emitter)?,
            NodeKind::Reference(reference) => self.write_reference(reference)?,
            kind => self.write_mesh_node(kind, number)?,
        }
        self.write_controllers(&controllers, keys_slot, data_slot)?;

        if !node.children.is_empty() {
            self.patch_here(children_slot)?;
            let table = self.body.tell()?;
            self.body.write_zeros(node.children.len() * 4)?;
            for (index, child) in node.children.iter().enumerate() {
                let child_offset = self.write_node(child, offset)?;
                self.body.write_u32_at(table + 4 * index as u64, child_offset)?;
            }
        }
        Ok(offset)
    }

    pub(super) fn number_of(&self, name: &str) -> Result<u16> {
        self.numbers
            .get(name)
            .copied()
            .ok_or_else(|| Error::InvalidInput(format!("node {name:?} has no node number")))
    }

    fn write_light(&mut self, light: &Light) -> Result<()> {
        let count = light.flares.len();
        self.body.write_f32(light.flare_radius)?;
        self.write_empty_array()?;
        let sizes = self.reserve_array(count)?;
        let positions = self.reserve_array(count)?;
        let color_shifts = self.reserve_array(count)?;
        let textures = self.reserve_array(count)?;
        self.body.write_u32(light.priority)?;
        self.body.write_u32(u32::from(light.ambient_only))?;
        self.body.write_u32(light.dynamic_type)?;
        self.body.write_u32(u32::from(light.affect_dynamic))?;
        self.body.write_u32(u32::from(light.shadow))?;
        self.body.write_u32(u32::from(light.flare))?;
        self.body.write_u32(u32::from(light.fading))?;

        if count == 0 {
            return Ok(());
        }
        self.patch_here(sizes)?;
        for flare in &light.flares {
            self.body.write_f32(flare.size)?;
        }
        self.patch_here(positions)?;
        for flare in &light.flares {
            self.body.write_f32(flare.position)?;
        }
        self.patch_here(color_shifts)?;
        for flare in &light.flares {
            self.body.write_f32_slice(&flare.color_shift)?;
        }
        self.patch_here(textures)?;
        let table = self.body.tell()?;
        self.body.write_zeros(count * 4)?;
        for (index, flare) in light.flares.iter().enumerate() {
            let offset = self.here()?;
            self.body.write_u32_at(table + 4 * index as u64, offset)?;
            self.body.write_c_string(&flare.texture)?;
        }
        self.body.align(4)
    }

    fn write_emitter(&mut self, emitter: &Emitter) -> Result<()> {
        self.body.write_f32(emitter.dead_space)?;
        self.body.write_f32(emitter.blast_radius)?;
        self.body.write_f32(emitter.blast_length)?;
        self.body.write_u32(emitter.branch_count)?;
        self.body.write_f32(emitter.control_point_smoothing)?;
        self.body.write_u32(emitter.x_grid)?;
        self.body.write_u32(emitter.y_grid)?;
        self.body.write_u32(emitter.spawn_type)?;
        self.body.write_fixed_string(&emitter.update, 32)?;
        self.body.write_fixed_string(&emitter.render, 32)?;
        self.body.write_fixed_string(&emitter.blend, 32)?;
        self.body.write_fixed_string(&emitter.texture, 32)?;
        self.body.write_fixed_string(&emitter.chunk_name, 16)?;
        self.body.write_u32(u32::from(emitter.two_sided_texture))?;
        self.body.write_u32(u32::from(emitter.looping))?;
        self.body.write_u16(emitter.render_order)?;
        self.body.write_u8(u8::from(emitter.frame_blending))?;
        self.body.write_fixed_string(&emitter.depth_texture_name, 32)?;
        self.body.write_u8(0)?;
        self.body.write_u32(emitter.flags.bits())
    }

    fn write_reference(&mut self, reference: &Reference) -> Result<()> {
        self.body.write_fixed_string(&reference.model, 32)?;
        self.body.write_u32(u32::from(reference.reattachable))
    }
}
