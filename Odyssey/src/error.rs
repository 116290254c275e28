//! Error types for `Odyssey`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `Odyssey` codec operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations, including short reads and writes.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The MDX companion of an MDL file does not exist on disk.
    #[error("MDX companion file not found: {path}")]
    MdxNotFound {
        /// The expected path to the MDX file.
        path: PathBuf,
    },

    // ==================== MDL Format Errors ====================
    /// The first word of an MDL file must be zero.
    #[error("invalid MDL signature: expected 0, found {0:#010x}")]
    InvalidMdlSignature(u32),

    /// The MDX companion file size disagrees with the size declared in the MDL header.
    #[error("MDX size mismatch: header declares {declared} bytes, file has {actual}")]
    MdxSizeMismatch {
        /// Size declared in the MDL file header.
        declared: u32,
        /// Actual size of the MDX data.
        actual: u64,
    },

    /// The geometry header function pointers match no known game build.
    #[error("unknown model version: function pointers {fn_ptr1}/{fn_ptr2}")]
    UnknownModelVersion {
        /// First function pointer.
        fn_ptr1: u32,
        /// Second function pointer.
        fn_ptr2: u32,
    },

    /// The classification byte has no mapping.
    #[error("unknown model classification: {0:#04x}")]
    UnknownClassification(u8),

    /// A controller uses a column count that cannot be decoded.
    #[error("unsupported column count {columns} for controller {controller}")]
    UnsupportedControllerColumns {
        /// Controller type id.
        controller: u32,
        /// Raw column count byte.
        columns: u8,
    },

    /// The node type bitmask combines flags in an unsupported way.
    #[error("unsupported node type flags: {0:#06x}")]
    UnsupportedNodeType(u16),

    /// An `(offset, count, count)` array descriptor has mismatching counts.
    #[error("array count mismatch: {count} != {repeated}")]
    ArrayCountMismatch {
        /// First count.
        count: u32,
        /// Repeated count.
        repeated: u32,
    },

    /// A name table index is out of range.
    #[error("invalid name index: {0}")]
    InvalidNameIndex(usize),

    /// A node or struct offset was visited twice, or recursion went too deep.
    #[error("malformed tree at offset {offset}: {message}")]
    MalformedTree {
        /// Offset of the offending record.
        offset: u32,
        /// Description of what is wrong.
        message: String,
    },

    // ==================== BWM Format Errors ====================
    /// The file is not a valid BWM walkmesh (missing `BWM ` magic).
    #[error("invalid BWM magic: expected \"BWM \", found {0:?}")]
    InvalidBwmMagic([u8; 4]),

    /// The BWM version is not supported.
    #[error("unsupported BWM version: {0:?}")]
    UnsupportedBwmVersion([u8; 4]),

    /// The walkmesh kind is neither placeable/door nor room.
    #[error("unknown walkmesh kind: {0}")]
    UnknownWalkmeshKind(u32),

    // ==================== GFF Format Errors ====================
    /// The GFF type tag differs from the expected one.
    #[error("GFF type mismatch: expected {expected:?}, found {found:?}")]
    GffTypeMismatch {
        /// The caller-supplied type tag.
        expected: String,
        /// The type tag found in the file.
        found: String,
    },

    /// The GFF version is not supported.
    #[error("unsupported GFF version: {0:?}")]
    UnsupportedGffVersion(String),

    /// A GFF field carries an unknown type tag.
    #[error("unsupported GFF field type: {0}")]
    UnsupportedGffFieldType(u32),

    /// A GFF struct, field, or label index is out of range.
    #[error("invalid GFF {table} index: {index}")]
    InvalidGffIndex {
        /// Name of the table being indexed.
        table: &'static str,
        /// The offending index.
        index: u32,
    },

    /// A path file's GFF tree lacks a field or points outside its connection list.
    #[error("invalid path graph: {0}")]
    InvalidPathGraph(String),

    // ==================== TPC Texture Errors ====================
    /// The TPC pixel encoding byte is unknown.
    #[error("unsupported TPC encoding: {0}")]
    UnsupportedTpcEncoding(u8),

    /// Failed to encode a PNG image.
    #[error("failed to encode PNG: {message}")]
    PngEncodeFailed {
        /// The encoding error message.
        message: String,
    },

    // ==================== Invalid Input ====================
    /// The AABB tree builder received no faces.
    #[error("cannot build AABB tree from an empty face list")]
    EmptyFaceList,

    /// The AABB tree builder exceeded its recursion cap.
    #[error("AABB tree recursion exceeded depth {depth}")]
    AabbDepthExceeded {
        /// The depth that was reached.
        depth: usize,
    },

    /// The in-memory tree cannot be encoded.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ==================== Serialization Errors ====================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Coarse error category, independent of the format that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Short read/write, missing file.
    Io,
    /// Bad magic, version, count, or an undecodable record.
    Format,
    /// Declared and actual companion sizes disagree.
    SizeMismatch,
    /// The caller handed the encoder something it cannot represent.
    InvalidInput,
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::MdxNotFound { .. } => ErrorKind::Io,
            Error::MdxSizeMismatch { .. } => ErrorKind::SizeMismatch,
            Error::EmptyFaceList
            | Error::AabbDepthExceeded { .. }
            | Error::InvalidInput(_)
            | Error::PngEncodeFailed { .. }
            | Error::JsonError(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Format,
        }
    }
}

/// A specialized Result type for `Odyssey` operations.
pub type Result<T> = std::result::Result<T, Error>;
