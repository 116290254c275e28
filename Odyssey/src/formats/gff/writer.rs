//! GFF file writing and serialization

use std::collections::VecDeque;
use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use indexmap::IndexSet;

use super::document::{GffDocument, GffStruct, GffValue};
use super::{FIELD_SIZE, GFF_VERSION, HEADER_SIZE, LABEL_SIZE, STRUCT_SIZE};
use crate::error::{Error, Result};
use crate::formats::common::float_to_int_bits;
use crate::utils::BinaryWriter;

/// Write a GFF document to disk
pub fn write_gff<P: AsRef<Path>>(doc: &GffDocument, path: P) -> Result<()> {
    let bytes = serialize_gff(doc)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Serialize a GFF document to bytes
pub fn serialize_gff(doc: &GffDocument) -> Result<Vec<u8>> {
    serialize_gff_struct(&doc.root, &doc.file_type)
}

/// Serialize a root struct under the given four-character type tag
///
/// # Errors
/// Returns [`Error::InvalidInput`] for labels longer than 16 bytes, a type tag
/// longer than 4 bytes, or strings too long for their length prefix.
pub fn serialize_gff_struct(root: &GffStruct, file_type: &str) -> Result<Vec<u8>> {
    let tables = Tables::flatten(root)?;

    let struct_offset = HEADER_SIZE as u32;
    let field_offset = struct_offset + tables.structs.len() as u32 * STRUCT_SIZE as u32;
    let label_offset = field_offset + tables.fields.len() as u32 * FIELD_SIZE as u32;
    let field_data_offset = label_offset + tables.labels.len() as u32 * LABEL_SIZE as u32;
    let field_indices_offset = field_data_offset + tables.field_data.len() as u32;
    let list_indices_offset = field_indices_offset + tables.field_indices.len() as u32;

    let mut writer = BinaryWriter::new(Cursor::new(Vec::new()));
    writer.write_fixed_string(&format!("{file_type:<4}"), 4)?;
    writer.write_fixed_string(GFF_VERSION, 4)?;
    for (offset, count) in [
        (struct_offset, tables.structs.len()),
        (field_offset, tables.fields.len()),
        (label_offset, tables.labels.len()),
        (field_data_offset, tables.field_data.len()),
        (field_indices_offset, tables.field_indices.len()),
        (list_indices_offset, tables.list_indices.len()),
    ] {
        writer.write_u32(offset)?;
        writer.write_u32(count as u32)?;
    }

    for row in tables.structs.iter().chain(&tables.fields) {
        for value in row {
            writer.write_u32(*value)?;
        }
    }
    for label in &tables.labels {
        writer.write_fixed_string(label, LABEL_SIZE)?;
    }
    writer.write_bytes(&tables.field_data)?;
    writer.write_bytes(&tables.field_indices)?;
    writer.write_bytes(&tables.list_indices)?;

    Ok(writer.into_inner().into_inner())
}

/// The flattened tables of a GFF file.
#[derive(Default)]
struct Tables {
    structs: Vec<[u32; 3]>,
    fields: Vec<[u32; 3]>,
    labels: IndexSet<String>,
    field_data: Vec<u8>,
    field_indices: Vec<u8>,
    list_indices: Vec<u8>,
}

impl Tables {
    /// Breadth-first flatten. Struct ids are handed out when a struct is
    /// queued, so the struct table ends up in id order with the root at 0.
    fn flatten(root: &GffStruct) -> Result<Self> {
        let mut tables = Self::default();
        let mut queue = VecDeque::from([root]);
        let mut next_id = 1u32;

        while let Some(gff_struct) = queue.pop_front() {
            let mut field_ids = Vec::with_capacity(gff_struct.fields.len());

            for field in &gff_struct.fields {
                if field.label.len() > LABEL_SIZE {
                    return Err(Error::InvalidInput(format!(
                        "GFF label {:?} is longer than {LABEL_SIZE} bytes",
                        field.label
                    )));
                }
                let (label_index, _) = tables.labels.insert_full(field.label.clone());

                let data = match &field.value {
                    GffValue::Struct(child) => {
                        queue.push_back(child);
                        next_id += 1;
                        next_id - 1
                    }
                    GffValue::List(items) => {
                        let offset = tables.list_indices.len() as u32;
                        tables.list_indices.write_u32::<LittleEndian>(items.len() as u32)?;
                        for item in items {
                            tables.list_indices.write_u32::<LittleEndian>(next_id)?;
                            queue.push_back(item);
                            next_id += 1;
                        }
                        offset
                    }
                    value => tables.scalar_data(value)?,
                };

                field_ids.push(tables.fields.len() as u32);
                tables.fields.push([
                    field.value.field_type() as u32,
                    label_index as u32,
                    data,
                ]);
            }

            let data = match field_ids.as_slice() {
                [] => u32::MAX,
                [single] => *single,
                many => {
                    let offset = tables.field_indices.len() as u32;
                    for id in many {
                        tables.field_indices.write_u32::<LittleEndian>(*id)?;
                    }
                    offset
                }
            };
            tables
                .structs
                .push([gff_struct.struct_type, data, field_ids.len() as u32]);
        }

        Ok(tables)
    }

    /// Inline slot value, or the field-data offset of an out-of-line value.
    fn scalar_data(&mut self, value: &GffValue) -> Result<u32> {
        let inline = match value {
            GffValue::Byte(v) => Some(u32::from(*v)),
            GffValue::Char(v) => Some(u32::from(*v as u8)),
            GffValue::Word(v) => Some(u32::from(*v)),
            GffValue::Short(v) => Some(u32::from(*v as u16)),
            GffValue::Dword(v) => Some(*v),
            GffValue::Int(v) => Some(*v as u32),
            GffValue::Float(v) => Some(float_to_int_bits(*v)),
            _ => None,
        };
        if let Some(inline) = inline {
            return Ok(inline);
        }

        let offset = self.field_data.len() as u32;
        let data = &mut self.field_data;
        match value {
            GffValue::Dword64(v) => data.write_u64::<LittleEndian>(*v)?,
            GffValue::Int64(v) => data.write_i64::<LittleEndian>(*v)?,
            GffValue::Double(v) => data.write_f64::<LittleEndian>(*v)?,
            GffValue::String(s) => {
                data.write_u32::<LittleEndian>(s.len() as u32)?;
                data.extend_from_slice(s.as_bytes());
            }
            GffValue::ResRef(s) => {
                let length = u8::try_from(s.len()).map_err(|_| {
                    Error::InvalidInput(format!("ResRef {s:?} is longer than 255 bytes"))
                })?;
                data.write_u8(length)?;
                data.extend_from_slice(s.as_bytes());
            }
            GffValue::LocString(loc) => {
                let total: usize = 8 + loc.strings.iter().map(|(_, s)| 8 + s.len()).sum::<usize>();
                data.write_u32::<LittleEndian>(total as u32)?;
                data.write_u32::<LittleEndian>(loc.string_ref)?;
                data.write_u32::<LittleEndian>(loc.strings.len() as u32)?;
                for (id, text) in &loc.strings {
                    data.write_u32::<LittleEndian>(*id)?;
                    data.write_u32::<LittleEndian>(text.len() as u32)?;
                    data.extend_from_slice(text.as_bytes());
                }
            }
            GffValue::Void(bytes) => {
                data.write_u32::<LittleEndian>(bytes.len() as u32)?;
                data.extend_from_slice(bytes);
            }
            GffValue::Orientation(q) => {
                for c in q {
                    data.write_f32::<LittleEndian>(*c)?;
                }
            }
            GffValue::Vector(v) => {
                for c in v {
                    data.write_f32::<LittleEndian>(*c)?;
                }
            }
            _ => {}
        }
        Ok(offset)
    }
}
