//! Animation decoding

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::{ArrayDef, Session, guard};
use crate::error::Result;
use crate::formats::mdl::controllers::{ControllerSet, label_for};
use crate::formats::mdl::types::{Animation, AnimationEvent, AnimationNode};

impl Session<'_> {
    pub(super) fn read_animation(&mut self, offset: u32) -> Result<Animation> {
        self.mdl.seek(u64::from(offset))?;
        self.mdl.skip(8)?; // function pointers
        let name = self.mdl.read_c_string_up_to(32)?;
        let root_offset = self.mdl.read_u32()?;
        let node_count = self.mdl.read_u32()?;
        self.mdl.skip(24 + 4 + 4)?;
        let length = self.mdl.read_f32()?;
        let transition = self.mdl.read_f32()?;
        let animation_root = self.mdl.read_c_string_up_to(32)?;
        let events = self.read_array()?;
        let _unknown = self.mdl.read_u32()?;
        debug!("Animation {:?}: {} nodes, length {}", name, node_count, length);

        let events = self.read_events(events)?;
        let root = self.read_animation_node(root_offset, 0)?;
        Ok(Animation {
            name,
            length,
            transition,
            animation_root,
            events,
            root,
        })
    }

    fn read_events(&mut self, array: ArrayDef) -> Result<Vec<AnimationEvent>> {
        if array.count == 0 {
            return Ok(Vec::new());
        }
        self.mdl.seek(u64::from(array.offset))?;
        let mut events = Vec::with_capacity(array.count as usize);
        for _ in 0..array.count {
            events.push(AnimationEvent {
                time: self.mdl.read_f32()?,
                name: self.mdl.read_c_string_up_to(32)?,
            });
        }
        Ok(events)
    }

    fn read_animation_node(&mut self, offset: u32, depth: usize) -> Result<AnimationNode> {
        guard(self.options.max_depth, offset, depth, &mut self.visited)?;
        let header = self.read_node_header(offset)?;
        let name = self.name(header.node_number)?;

        let set = if let Some(set) = self.node_sets.get(&header.node_number) {
            *set
        } else {
            warn!(
                "Animation node {:?} (number {}) has no geometry counterpart",
                name, header.node_number
            );
            ControllerSet::Base
        };

        let mut keyframes = IndexMap::new();
        for track in self.read_controllers(header.controller_keys, header.controller_data)? {
            match label_for(set, track.id) {
                Some(label) => {
                    keyframes.insert(label.to_string(), track.rows);
                }
                None => warn!(
                    "Animation node {:?}: controller {} is unknown for its kind, skipped",
                    name, track.id
                ),
            }
        }

        let mut node = AnimationNode {
            name,
            node_number: header.node_number,
            keyframes,
            children: Vec::new(),
        };
        for child in self.read_u32s(header.children)? {
            let child = self.read_animation_node(child, depth + 1)?;
            node.children.push(child);
        }
        Ok(node)
    }
}
