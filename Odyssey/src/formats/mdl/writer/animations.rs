//! Animation encoding

use super::Encoder;
use super::controllers::{ControllerLayout, Track, keyframe_track};
use crate::error::{Error, Result};
use crate::formats::mdl::constants::{ANIMATION_FN_PTRS, MODEL_TYPE_ANIMATION, NODE_HEADER};
use crate::formats::mdl::controllers::{ControllerSet, id_for};
use crate::formats::mdl::types::{Animation, AnimationNode};

fn count_nodes(node: &AnimationNode) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

impl Encoder<'_> {
    /// Write one animation; returns its header offset.
    pub(super) fn write_animation(&mut self, animation: &Animation) -> Result<u32> {
        let offset = self.here()?;
        let root_slot = self.write_geometry_header(
            self.target.pick(&ANIMATION_FN_PTRS),
            &animation.name,
            count_nodes(&animation.root),
            MODEL_TYPE_ANIMATION,
        )?;
        self.body.write_f32(animation.length)?;
        self.body.write_f32(animation.transition)?;
        self.body.write_fixed_string(&animation.animation_root, 32)?;
        let events_slot = self.reserve_array(animation.events.len())?;
        self.body.write_u32(0)?;

        if !animation.events.is_empty() {
            self.patch_here(events_slot)?;
            for event in &animation.events {
                self.body.write_f32(event.time)?;
                self.body.write_fixed_string(&event.name, 32)?;
            }
        }

        let root = self.write_animation_node(&animation.root, offset, 0)?;
        self.body.write_u32_at(root_slot, root)?;
        Ok(offset)
    }

    fn write_animation_node(&mut self, node: &AnimationNode, animation: u32, parent: u32) -> Result<u32> {
        let offset = self.here()?;
        let number = self.number_of(&node.name)?;
        let set = self
            .sets
            .get(&number)
            .copied()
            .unwrap_or(ControllerSet::Base);
        let controllers = ControllerLayout::new(self.animation_tracks(node, set)?)?;

        self.body.write_u16(NODE_HEADER)?;
        self.body.write_u16(number)?;
        self.body.write_u16(number)?;
        self.body.write_u16(0)?;
        self.body.write_u32(animation)?;
        self.body.write_u32(parent)?;
        self.body.write_f32_slice(&[0.0; 3])?;
        self.body.write_f32_slice(&[0.0, 0.0, 0.0, 1.0])?;
        let children_slot = self.reserve_array(node.children.len())?;
        let keys_slot = self.reserve_array(controllers.key_count())?;
        let data_slot = self.reserve_array(controllers.data_len())?;
        self.write_controllers(&controllers, keys_slot, data_slot)?;

        if !node.children.is_empty() {
            self.patch_here(children_slot)?;
            let table = self.body.tell()?;
            self.body.write_zeros(node.children.len() * 4)?;
            for (index, child) in node.children.iter().enumerate() {
                let child_offset = self.write_animation_node(child, animation, offset)?;
                self.body.write_u32_at(table + 4 * index as u64, child_offset)?;
            }
        }
        Ok(offset)
    }

    fn animation_tracks(&self, node: &AnimationNode, set: ControllerSet) -> Result<Vec<Track>> {
        node.keyframes
            .iter()
            .map(|(label, rows)| {
                let id = id_for(set, label).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "controller {label:?} does not apply to node {:?}",
                        node.name
                    ))
                })?;
                keyframe_track(id, label, rows, self.options.compress_quaternions)
            })
            .collect()
    }
}
