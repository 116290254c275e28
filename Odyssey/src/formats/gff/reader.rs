//! GFF file reading and parsing

use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use tracing::debug;

use super::document::{GffDocument, GffField, GffFieldType, GffStruct, GffValue, LocString};
use super::{FIELD_SIZE, GFF_VERSION, LABEL_SIZE, STRUCT_SIZE};
use crate::error::{Error, Result};
use crate::formats::common::int_bits_to_float;
use crate::utils::BinaryReader;

/// Deepest struct nesting accepted from a file.
const MAX_STRUCT_DEPTH: usize = 256;

/// Read a GFF file from disk
///
/// # Errors
/// Returns an error if the file cannot be read or has an invalid format.
pub fn read_gff<P: AsRef<Path>>(path: P) -> Result<GffDocument> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    parse_gff_bytes(&buffer)
}

/// Read a GFF file and check its type tag against `expected` (e.g. `"PTH "`)
///
/// # Errors
/// Returns [`Error::GffTypeMismatch`] when the tag differs.
pub fn read_gff_as<P: AsRef<Path>>(path: P, expected: &str) -> Result<GffStruct> {
    let doc = read_gff(path)?;
    doc.expect_type(expected)?;
    Ok(doc.root)
}

/// Parse GFF data from bytes
///
/// # Errors
/// Returns an error if the data has an invalid GFF format.
pub fn parse_gff_bytes(data: &[u8]) -> Result<GffDocument> {
    let mut reader = BinaryReader::new(Cursor::new(data));
    let header = Header::read(&mut reader)?;
    debug!(
        "GFF {:?}: {} structs, {} fields, {} labels",
        header.file_type, header.struct_count, header.field_count, header.label_count
    );

    let labels = read_labels(&mut reader, &header)?;
    let mut session = Session {
        reader,
        header,
        labels,
        visited: HashSet::new(),
    };
    let root = session.read_struct(0, 0)?;

    Ok(GffDocument {
        file_type: session.header.file_type,
        root,
    })
}

/// Parse GFF bytes and check the type tag
///
/// # Errors
/// Returns [`Error::GffTypeMismatch`] when the tag differs.
pub fn parse_gff_bytes_as(data: &[u8], expected: &str) -> Result<GffStruct> {
    let doc = parse_gff_bytes(data)?;
    doc.expect_type(expected)?;
    Ok(doc.root)
}

struct Header {
    file_type: String,
    struct_offset: u32,
    struct_count: u32,
    field_offset: u32,
    field_count: u32,
    label_offset: u32,
    label_count: u32,
    field_data_offset: u32,
    field_indices_offset: u32,
    list_indices_offset: u32,
}

impl Header {
    fn read(reader: &mut BinaryReader<Cursor<&[u8]>>) -> Result<Self> {
        let file_type = reader.read_fixed_string(4)?;
        let version = reader.read_fixed_string(4)?;
        if version != GFF_VERSION {
            return Err(Error::UnsupportedGffVersion(version));
        }

        let struct_offset = reader.read_u32()?;
        let struct_count = reader.read_u32()?;
        let field_offset = reader.read_u32()?;
        let field_count = reader.read_u32()?;
        let label_offset = reader.read_u32()?;
        let label_count = reader.read_u32()?;
        let field_data_offset = reader.read_u32()?;
        let _field_data_size = reader.read_u32()?;
        let field_indices_offset = reader.read_u32()?;
        let _field_indices_size = reader.read_u32()?;
        let list_indices_offset = reader.read_u32()?;
        let _list_indices_size = reader.read_u32()?;

        Ok(Self {
            file_type,
            struct_offset,
            struct_count,
            field_offset,
            field_count,
            label_offset,
            label_count,
            field_data_offset,
            field_indices_offset,
            list_indices_offset,
        })
    }
}

fn read_labels(reader: &mut BinaryReader<Cursor<&[u8]>>, header: &Header) -> Result<Vec<String>> {
    reader.seek(u64::from(header.label_offset))?;
    (0..header.label_count)
        .map(|_| reader.read_c_string_up_to(LABEL_SIZE))
        .collect()
}

struct Session<'a> {
    reader: BinaryReader<Cursor<&'a [u8]>>,
    header: Header,
    labels: Vec<String>,
    visited: HashSet<u32>,
}

impl Session<'_> {
    fn read_struct(&mut self, index: u32, depth: usize) -> Result<GffStruct> {
        if index >= self.header.struct_count {
            return Err(Error::InvalidGffIndex {
                table: "struct",
                index,
            });
        }
        if depth > MAX_STRUCT_DEPTH || !self.visited.insert(index) {
            return Err(Error::MalformedTree {
                offset: index,
                message: "struct referenced twice or nested too deeply".to_string(),
            });
        }

        self.reader
            .seek(u64::from(self.header.struct_offset) + u64::from(index) * STRUCT_SIZE)?;
        let struct_type = self.reader.read_u32()?;
        let data_or_offset = self.reader.read_u32()?;
        let field_count = self.reader.read_u32()?;

        let field_indices = match field_count {
            0 => Vec::new(),
            1 => vec![data_or_offset],
            _ => {
                self.reader.seek(
                    u64::from(self.header.field_indices_offset) + u64::from(data_or_offset),
                )?;
                (0..field_count)
                    .map(|_| self.reader.read_u32())
                    .collect::<Result<Vec<_>>>()?
            }
        };

        let mut fields = Vec::with_capacity(field_indices.len());
        for field_index in field_indices {
            fields.push(self.read_field(field_index, depth)?);
        }

        Ok(GffStruct {
            struct_type,
            fields,
        })
    }

    fn read_field(&mut self, index: u32, depth: usize) -> Result<GffField> {
        if index >= self.header.field_count {
            return Err(Error::InvalidGffIndex {
                table: "field",
                index,
            });
        }
        self.reader
            .seek(u64::from(self.header.field_offset) + u64::from(index) * FIELD_SIZE)?;
        let type_tag = self.reader.read_u32()?;
        let label_index = self.reader.read_u32()?;
        let data = self.reader.read_u32()?;

        let label = self
            .labels
            .get(label_index as usize)
            .cloned()
            .ok_or(Error::InvalidGffIndex {
                table: "label",
                index: label_index,
            })?;

        let field_type = GffFieldType::from_u32(type_tag)?;
        let value = if field_type.is_inline() {
            inline_value(field_type, data)
        } else {
            self.complex_value(field_type, data, depth)?
        };

        Ok(GffField { label, value })
    }

    fn complex_value(&mut self, field_type: GffFieldType, data: u32, depth: usize) -> Result<GffValue> {
        if field_type == GffFieldType::Struct {
            return Ok(GffValue::Struct(self.read_struct(data, depth + 1)?));
        }
        if field_type == GffFieldType::List {
            self.reader
                .seek(u64::from(self.header.list_indices_offset) + u64::from(data))?;
            let count = self.reader.read_u32()?;
            let indices = (0..count)
                .map(|_| self.reader.read_u32())
                .collect::<Result<Vec<_>>>()?;
            let mut items = Vec::with_capacity(indices.len());
            for struct_index in indices {
                items.push(self.read_struct(struct_index, depth + 1)?);
            }
            return Ok(GffValue::List(items));
        }

        self.reader
            .seek(u64::from(self.header.field_data_offset) + u64::from(data))?;
        let reader = &mut self.reader;
        Ok(match field_type {
            GffFieldType::Dword64 => GffValue::Dword64(reader.read_u64()?),
            GffFieldType::Int64 => GffValue::Int64(reader.read_i64()?),
            GffFieldType::Double => GffValue::Double(reader.read_f64()?),
            GffFieldType::CExoString => {
                let length = reader.read_u32()? as usize;
                GffValue::String(reader.read_string(length)?)
            }
            GffFieldType::ResRef => {
                let length = reader.read_u8()? as usize;
                GffValue::ResRef(reader.read_string(length)?)
            }
            GffFieldType::CExoLocString => {
                let _total_size = reader.read_u32()?;
                let string_ref = reader.read_u32()?;
                let count = reader.read_u32()?;
                let mut strings = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let id = reader.read_u32()?;
                    let length = reader.read_u32()? as usize;
                    strings.push((id, reader.read_string(length)?));
                }
                GffValue::LocString(LocString {
                    string_ref,
                    strings,
                })
            }
            GffFieldType::Void => {
                let length = reader.read_u32()? as usize;
                GffValue::Void(reader.read_bytes(length)?)
            }
            GffFieldType::Orientation => GffValue::Orientation(reader.read_f32_array::<4>()?),
            GffFieldType::Vector => GffValue::Vector(reader.read_vec3()?),
            other => return Err(Error::UnsupportedGffFieldType(other as u32)),
        })
    }
}

fn inline_value(field_type: GffFieldType, data: u32) -> GffValue {
    match field_type {
        GffFieldType::Byte => GffValue::Byte(data as u8),
        GffFieldType::Char => GffValue::Char(data as u8 as i8),
        GffFieldType::Word => GffValue::Word(data as u16),
        GffFieldType::Short => GffValue::Short(data as u16 as i16),
        GffFieldType::Int => GffValue::Int(data as i32),
        GffFieldType::Float => GffValue::Float(int_bits_to_float(data)),
        _ => GffValue::Dword(data),
    }
}
