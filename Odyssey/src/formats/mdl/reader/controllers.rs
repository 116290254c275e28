//! Controller track decoding

use tracing::warn;

use super::{ArrayDef, Session};
use crate::error::{Error, Result};
use crate::formats::common::{decompress_quaternion, int_bits_to_float};
use crate::formats::mdl::constants::{CONTROLLER_BEZIER, CONTROLLER_PACKED_QUATERNION};
use crate::formats::mdl::controllers::{ControllerSet, ORIENTATION, label_for};
use crate::formats::mdl::types::{ModelNode, NodeKind};

/// One decoded controller: rows of `[time, values..]`.
pub(super) struct Track {
    pub id: u32,
    pub rows: Vec<Vec<f32>>,
}

struct ControllerKey {
    id: u32,
    rows: u16,
    time_start: u16,
    value_start: u16,
    columns: u8,
}

impl Session<'_> {
    pub(super) fn read_controllers(&mut self, keys: ArrayDef, data: ArrayDef) -> Result<Vec<Track>> {
        if keys.count == 0 {
            return Ok(Vec::new());
        }
        let words = self.read_u32s(data)?;

        self.mdl.seek(u64::from(keys.offset))?;
        let mut records = Vec::with_capacity(keys.count as usize);
        for _ in 0..keys.count {
            let id = self.mdl.read_u32()?;
            let _unknown = self.mdl.read_u16()?;
            let rows = self.mdl.read_u16()?;
            let time_start = self.mdl.read_u16()?;
            let value_start = self.mdl.read_u16()?;
            let columns = self.mdl.read_u8()?;
            self.mdl.skip(3)?;
            records.push(ControllerKey {
                id,
                rows,
                time_start,
                value_start,
                columns,
            });
        }

        records
            .iter()
            .map(|key| decode_track(&words, key, data.offset))
            .collect()
    }

    /// Assign the first row of every geometry-node controller to its field.
    pub(super) fn apply_static_controllers(node: &mut ModelNode, tracks: Vec<Track>) {
        let set = ControllerSet::of(&node.kind);
        for track in tracks {
            let Some(label) = label_for(set, track.id) else {
                warn!(
                    "Node {:?}: controller {} is unknown for its kind, skipped",
                    node.name, track.id
                );
                continue;
            };
            let Some(values) = track.rows.first().and_then(|row| row.get(1..)) else {
                continue;
            };

            match (label, &mut node.kind) {
                ("position", _) => node.position = vec3(values),
                ("orientation", _) => {
                    node.orientation = [at(values, 0), at(values, 1), at(values, 2), at(values, 3)];
                }
                ("scale", _) => node.scale = at(values, 0),
                ("alpha", kind) => {
                    if let Some(mesh) = kind.mesh_mut() {
                        mesh.alpha = at(values, 0);
                    }
                }
                ("selfillumcolor", kind) => {
                    if let Some(mesh) = kind.mesh_mut() {
                        mesh.self_illum_color = vec3(values);
                    }
                }
                ("color", NodeKind::Light(light)) => {
                    let color = vec3(values);
                    light.negative = color[0] < 0.0;
                    light.color = color.map(f32::abs);
                }
                ("radius", NodeKind::Light(light)) => light.radius = at(values, 0),
                ("multiplier", NodeKind::Light(light)) => light.multiplier = at(values, 0),
                ("shadowradius", NodeKind::Light(light)) => light.shadow_radius = Some(at(values, 0)),
                ("verticaldisplacement", NodeKind::Light(light)) => {
                    light.vertical_displacement = Some(at(values, 0));
                }
                (label, NodeKind::Emitter(emitter)) => {
                    emitter.controllers.insert(label.to_string(), values.to_vec());
                }
                _ => {}
            }
        }
    }
}

fn at(values: &[f32], index: usize) -> f32 {
    values.get(index).copied().unwrap_or_default()
}

fn vec3(values: &[f32]) -> [f32; 3] {
    [at(values, 0), at(values, 1), at(values, 2)]
}

fn decode_track(words: &[u32], key: &ControllerKey, data_offset: u32) -> Result<Track> {
    let count = usize::from(key.rows);
    let times = column(words, key.time_start, count, data_offset)?;

    if key.id == ORIENTATION && key.columns == CONTROLLER_PACKED_QUATERNION {
        let packed = column(words, key.value_start, count, data_offset)?;
        let rows = times
            .iter()
            .zip(packed)
            .map(|(&time, &value)| {
                let mut row = vec![int_bits_to_float(time)];
                row.extend(decompress_quaternion(value));
                row
            })
            .collect();
        return Ok(Track { id: key.id, rows });
    }

    let dimension = usize::from(key.columns & 0x0F);
    if dimension == 0 || key.columns & !(0x0F | CONTROLLER_BEZIER) != 0 {
        return Err(Error::UnsupportedControllerColumns {
            controller: key.id,
            columns: key.columns,
        });
    }
    let width = if key.columns & CONTROLLER_BEZIER != 0 {
        dimension * 3
    } else {
        dimension
    };
    let values = column(words, key.value_start, count * width, data_offset)?;
    let rows = times
        .iter()
        .zip(values.chunks(width))
        .map(|(&time, chunk)| {
            std::iter::once(time)
                .chain(chunk.iter().copied())
                .map(int_bits_to_float)
                .collect()
        })
        .collect();
    Ok(Track { id: key.id, rows })
}

fn column(words: &[u32], start: u16, len: usize, data_offset: u32) -> Result<&[u32]> {
    let start = usize::from(start);
    words.get(start..start + len).ok_or_else(|| Error::MalformedTree {
        offset: data_offset,
        message: format!("controller column {start}..{} outside data", start + len),
    })
}
