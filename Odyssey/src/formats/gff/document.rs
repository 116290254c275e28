//! GFF tree structure definitions

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Type id of the root struct of every GFF file.
pub const ROOT_STRUCT_TYPE: u32 = 0xFFFF_FFFF;

/// Field type tags as stored in the field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum GffFieldType {
    Byte = 0,
    Char = 1,
    Word = 2,
    Short = 3,
    Dword = 4,
    Int = 5,
    Dword64 = 6,
    Int64 = 7,
    Float = 8,
    Double = 9,
    CExoString = 10,
    ResRef = 11,
    CExoLocString = 12,
    Void = 13,
    Struct = 14,
    List = 15,
    Orientation = 16,
    Vector = 17,
}

impl GffFieldType {
    pub fn from_u32(value: u32) -> Result<Self> {
        Ok(match value {
            0 => Self::Byte,
            1 => Self::Char,
            2 => Self::Word,
            3 => Self::Short,
            4 => Self::Dword,
            5 => Self::Int,
            6 => Self::Dword64,
            7 => Self::Int64,
            8 => Self::Float,
            9 => Self::Double,
            10 => Self::CExoString,
            11 => Self::ResRef,
            12 => Self::CExoLocString,
            13 => Self::Void,
            14 => Self::Struct,
            15 => Self::List,
            16 => Self::Orientation,
            17 => Self::Vector,
            other => return Err(Error::UnsupportedGffFieldType(other)),
        })
    }

    /// Whether the value lives in the 32-bit slot of the field record.
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::Char
                | Self::Word
                | Self::Short
                | Self::Dword
                | Self::Int
                | Self::Float
        )
    }
}

/// Localized string: a talk-table reference plus per-language overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocString {
    pub string_ref: u32,
    /// `(language id * 2 + gender, text)` pairs.
    pub strings: Vec<(u32, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum GffValue {
    Byte(u8),
    Char(i8),
    Word(u16),
    Short(i16),
    Dword(u32),
    Int(i32),
    Dword64(u64),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    ResRef(String),
    LocString(LocString),
    Void(Vec<u8>),
    Struct(GffStruct),
    List(Vec<GffStruct>),
    Orientation([f32; 4]),
    Vector([f32; 3]),
}

impl GffValue {
    pub fn field_type(&self) -> GffFieldType {
        match self {
            Self::Byte(_) => GffFieldType::Byte,
            Self::Char(_) => GffFieldType::Char,
            Self::Word(_) => GffFieldType::Word,
            Self::Short(_) => GffFieldType::Short,
            Self::Dword(_) => GffFieldType::Dword,
            Self::Int(_) => GffFieldType::Int,
            Self::Dword64(_) => GffFieldType::Dword64,
            Self::Int64(_) => GffFieldType::Int64,
            Self::Float(_) => GffFieldType::Float,
            Self::Double(_) => GffFieldType::Double,
            Self::String(_) => GffFieldType::CExoString,
            Self::ResRef(_) => GffFieldType::ResRef,
            Self::LocString(_) => GffFieldType::CExoLocString,
            Self::Void(_) => GffFieldType::Void,
            Self::Struct(_) => GffFieldType::Struct,
            Self::List(_) => GffFieldType::List,
            Self::Orientation(_) => GffFieldType::Orientation,
            Self::Vector(_) => GffFieldType::Vector,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GffField {
    pub label: String,
    pub value: GffValue,
}

/// A struct: a type id and an ordered field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GffStruct {
    pub struct_type: u32,
    pub fields: Vec<GffField>,
}

impl GffStruct {
    pub fn new(struct_type: u32) -> Self {
        Self {
            struct_type,
            fields: Vec::new(),
        }
    }

    /// An empty root struct.
    pub fn root() -> Self {
        Self::new(ROOT_STRUCT_TYPE)
    }

    /// Append a field, builder style.
    #[must_use]
    pub fn with(mut self, label: impl Into<String>, value: GffValue) -> Self {
        self.push(label, value);
        self
    }

    pub fn push(&mut self, label: impl Into<String>, value: GffValue) {
        self.fields.push(GffField {
            label: label.into(),
            value,
        });
    }

    /// First field named `label`.
    pub fn get(&self, label: &str) -> Option<&GffValue> {
        self.fields
            .iter()
            .find(|field| field.label == label)
            .map(|field| &field.value)
    }

    /// Any unsigned or non-negative integer field widened to `u32`.
    pub fn get_u32(&self, label: &str) -> Option<u32> {
        match self.get(label)? {
            GffValue::Byte(v) => Some(u32::from(*v)),
            GffValue::Word(v) => Some(u32::from(*v)),
            GffValue::Dword(v) => Some(*v),
            GffValue::Char(v) => u32::try_from(*v).ok(),
            GffValue::Short(v) => u32::try_from(*v).ok(),
            GffValue::Int(v) => u32::try_from(*v).ok(),
            GffValue::Dword64(v) => u32::try_from(*v).ok(),
            GffValue::Int64(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn get_f32(&self, label: &str) -> Option<f32> {
        match self.get(label)? {
            GffValue::Float(v) => Some(*v),
            GffValue::Double(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn get_string(&self, label: &str) -> Option<&str> {
        match self.get(label)? {
            GffValue::String(s) | GffValue::ResRef(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_struct(&self, label: &str) -> Option<&GffStruct> {
        match self.get(label)? {
            GffValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_list(&self, label: &str) -> Option<&[GffStruct]> {
        match self.get(label)? {
            GffValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl Default for GffStruct {
    fn default() -> Self {
        Self::root()
    }
}

/// A decoded GFF file: the four-character type tag and the root struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GffDocument {
    pub file_type: String,
    pub root: GffStruct,
}

impl GffDocument {
    pub fn new(file_type: impl Into<String>, root: GffStruct) -> Self {
        Self {
            file_type: file_type.into(),
            root,
        }
    }

    /// Fail unless the file type tag equals `expected` (trailing spaces ignored).
    pub fn expect_type(&self, expected: &str) -> Result<()> {
        if self.file_type.trim_end() == expected.trim_end() {
            Ok(())
        } else {
            Err(Error::GffTypeMismatch {
                expected: expected.to_string(),
                found: self.file_type.clone(),
            })
        }
    }
}
