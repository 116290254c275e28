//! GFF (Generic File Format) binary format module
//!
//! A typed tree of structs, fields and lists flattened into offset-indexed
//! tables. Used for path files and most other auxiliary game data.

mod document;
mod reader;
mod writer;

pub use document::{
    GffDocument, GffField, GffFieldType, GffStruct, GffValue, LocString, ROOT_STRUCT_TYPE,
};
pub use reader::{parse_gff_bytes, parse_gff_bytes_as, read_gff, read_gff_as};
pub use writer::{serialize_gff, serialize_gff_struct, write_gff};

/// Only supported version tag.
pub const GFF_VERSION: &str = "V3.2";

pub(crate) const HEADER_SIZE: u64 = 56;
pub(crate) const STRUCT_SIZE: u64 = 12;
pub(crate) const FIELD_SIZE: u64 = 12;
pub(crate) const LABEL_SIZE: usize = 16;
