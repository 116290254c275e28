//! Controller track encoding

use super::{Encoder, to_u16};
use crate::error::{Error, Result};
use crate::formats::common::{compress_quaternion, float_to_int_bits};
use crate::formats::mdl::constants::{CONTROLLER_BEZIER, CONTROLLER_PACKED_QUATERNION};
use crate::formats::mdl::controllers::{
    ControllerSet, LIGHT_COLOR, LIGHT_MULTIPLIER, LIGHT_RADIUS, LIGHT_SHADOW_RADIUS,
    LIGHT_VERTICAL_DISPLACEMENT, MESH_ALPHA, MESH_SELF_ILLUM_COLOR, ORIENTATION, POSITION, SCALE,
    dimension, id_for,
};
use crate::formats::mdl::types::{ModelNode, NodeKind};

pub(super) struct Track {
    id: u32,
    columns: u8,
    times: Vec<u32>,
    values: Vec<u32>,
}

struct Key {
    id: u32,
    rows: u16,
    time_start: u16,
    value_start: u16,
    columns: u8,
}

/// Key records and the shared data block of one node.
pub(super) struct ControllerLayout {
    keys: Vec<Key>,
    data: Vec<u32>,
}

impl ControllerLayout {
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        let mut keys = Vec::with_capacity(tracks.len());
        let mut data = Vec::new();
        for track in tracks {
            let time_start = to_u16(data.len(), "controller data offset")?;
            data.extend(&track.times);
            let value_start = to_u16(data.len(), "controller data offset")?;
            data.extend(&track.values);
            keys.push(Key {
                id: track.id,
                rows: to_u16(track.times.len(), "keyframe count")?,
                time_start,
                value_start,
                columns: track.columns,
            });
        }
        Ok(Self { keys, data })
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }
}

/// A single row at time zero.
fn constant(id: u32, values: &[f32]) -> Result<Track> {
    if values.is_empty() || values.len() > 0x0F {
        return Err(Error::InvalidInput(format!(
            "controller {id} has {} values",
            values.len()
        )));
    }
    Ok(Track {
        id,
        columns: values.len() as u8,
        times: vec![float_to_int_bits(0.0)],
        values: values.iter().copied().map(float_to_int_bits).collect(),
    })
}

/// Static controllers carrying a geometry node's animatable fields.
pub(super) fn static_tracks(node: &ModelNode) -> Result<Vec<Track>> {
    let mut tracks = vec![
        constant(POSITION, &node.position)?,
        constant(ORIENTATION, &node.orientation)?,
    ];
    if node.scale != 1.0 {
        tracks.push(constant(SCALE, &[node.scale])?);
    }

    match &node.kind {
        NodeKind::Light(light) => {
            let sign = if light.negative { -1.0 } else { 1.0 };
            tracks.push(constant(LIGHT_COLOR, &light.color.map(|c| c * sign))?);
            tracks.push(constant(LIGHT_RADIUS, &[light.radius])?);
            tracks.push(constant(LIGHT_MULTIPLIER, &[light.multiplier])?);
            if let Some(radius) = light.shadow_radius {
                tracks.push(constant(LIGHT_SHADOW_RADIUS, &[radius])?);
            }
            if let Some(displacement) = light.vertical_displacement {
                tracks.push(constant(LIGHT_VERTICAL_DISPLACEMENT, &[displacement])?);
            }
        }
        NodeKind::Emitter(emitter) => {
            for (label, values) in &emitter.controllers {
                let id = id_for(ControllerSet::Emitter, label).ok_or_else(|| {
                    Error::InvalidInput(format!("unknown emitter controller {label:?}"))
                })?;
                tracks.push(constant(id, values)?);
            }
        }
        kind => {
            if let Some(mesh) = kind.mesh() {
                tracks.push(constant(MESH_ALPHA, &[mesh.alpha])?);
                tracks.push(constant(MESH_SELF_ILLUM_COLOR, &mesh.self_illum_color)?);
            }
        }
    }
    Ok(tracks)
}

/// Encode a keyframe list.
///
/// Rows carrying tangents are stored Bezier-packed, even when every tangent
/// is zero. With `pack`, plain orientation rows become one compressed
/// quaternion word each.
pub(super) fn keyframe_track(id: u32, label: &str, rows: &[Vec<f32>], pack: bool) -> Result<Track> {
    let dim = dimension(label);
    let plain = 1 + dim;
    let bezier_width = 1 + 3 * dim;
    let bezier = !rows.is_empty() && rows.iter().all(|row| row.len() == bezier_width);
    if !bezier && rows.iter().any(|row| row.len() != plain) {
        return Err(Error::InvalidInput(format!(
            "{label} keyframes must all have {plain} or {bezier_width} columns"
        )));
    }

    let times = rows.iter().map(|row| float_to_int_bits(row[0])).collect();

    if pack && id == ORIENTATION && !bezier {
        let values = rows
            .iter()
            .map(|row| {
                let mut quaternion = [row[1], row[2], row[3], row[4]];
                if quaternion[3] < 0.0 {
                    quaternion = quaternion.map(|c| -c);
                }
                compress_quaternion(quaternion)
            })
            .collect();
        return Ok(Track {
            id,
            columns: CONTROLLER_PACKED_QUATERNION,
            times,
            values,
        });
    }

    let width = if bezier { 3 * dim } else { dim };
    let values = rows
        .iter()
        .flat_map(|row| row[1..=width].iter().copied().map(float_to_int_bits))
        .collect();
    Ok(Track {
        id,
        columns: dim as u8 | if bezier { CONTROLLER_BEZIER } else { 0 },
        times,
        values,
    })
}

impl Encoder<'_> {
    pub(super) fn write_controllers(
        &mut self,
        layout: &ControllerLayout,
        keys_slot: u64,
        data_slot: u64,
    ) -> Result<()> {
        if layout.keys.is_empty() {
            return Ok(());
        }
        self.patch_here(keys_slot)?;
        for key in &layout.keys {
            self.body.write_u32(key.id)?;
            self.body.write_u16(0xFFFF)?;
            self.body.write_u16(key.rows)?;
            self.body.write_u16(key.time_start)?;
            self.body.write_u16(key.value_start)?;
            self.body.write_u8(key.columns)?;
            self.body.write_zeros(3)?;
        }
        self.patch_here(data_slot)?;
        for word in &layout.data {
            self.body.write_u32(*word)?;
        }
        Ok(())
    }
}
