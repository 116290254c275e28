//! MDL/MDX file reading and parsing
//!
//! Decoding is a recursive descent over offsets relative to the end of the
//! 12-byte file header. One [`Session`] carries the name table, the node
//! number lookup and the cycle guard for the duration of one decode.

mod animations;
mod controllers;
mod nodes;

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use tracing::{debug, info};

use super::constants::{FILE_HEADER_SIZE, NULL_NAME};
use super::controllers::ControllerSet;
use super::options::{MdlReadOptions, Target};
use super::types::{Classification, Model};
use crate::error::{Error, Result};
use crate::utils::{BinaryReader, mdx_path_for};

/// Read an MDL file and its MDX companion from disk
///
/// The MDX path is the MDL path with its extension swapped.
///
/// # Errors
/// Returns [`Error::MdxNotFound`] when the companion is missing, or any
/// decode error.
pub fn read_mdl<P: AsRef<Path>>(path: P) -> Result<Model> {
    read_mdl_with_options(path, &MdlReadOptions::default())
}

/// Read an MDL/MDX pair with explicit decode options
pub fn read_mdl_with_options<P: AsRef<Path>>(path: P, options: &MdlReadOptions) -> Result<Model> {
    let path = path.as_ref();
    let mdx_path = mdx_path_for(path);
    if !mdx_path.exists() {
        return Err(Error::MdxNotFound { path: mdx_path });
    }
    info!("Reading model {}", path.display());

    let mdl = read_file(path)?;
    let mdx = read_file(&mdx_path)?;
    parse_mdl_bytes_with_options(&mdl, &mdx, options)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Parse MDL and MDX data from bytes
///
/// # Errors
/// Returns an error if the data has an invalid MDL format or the MDX size
/// disagrees with the MDL header.
pub fn parse_mdl_bytes(mdl: &[u8], mdx: &[u8]) -> Result<Model> {
    parse_mdl_bytes_with_options(mdl, mdx, &MdlReadOptions::default())
}

/// Parse MDL and MDX data with explicit decode options
pub fn parse_mdl_bytes_with_options(mdl: &[u8], mdx: &[u8], options: &MdlReadOptions) -> Result<Model> {
    let mut header = BinaryReader::new(Cursor::new(mdl));
    let signature = header.read_u32()?;
    if signature != 0 {
        return Err(Error::InvalidMdlSignature(signature));
    }
    let mdl_size = header.read_u32()?;
    let mdx_size = header.read_u32()?;
    if u64::from(mdx_size) != mdx.len() as u64 {
        return Err(Error::MdxSizeMismatch {
            declared: mdx_size,
            actual: mdx.len() as u64,
        });
    }
    debug!("MDL body {} bytes, MDX {} bytes", mdl_size, mdx_size);

    let body = &mdl[FILE_HEADER_SIZE as usize..];
    let mut session = Session {
        mdl: BinaryReader::new(Cursor::new(body)),
        mdx: BinaryReader::new(Cursor::new(mdx)),
        target: Target::default(),
        options: options.clone(),
        names: Vec::new(),
        node_names: HashMap::new(),
        node_sets: HashMap::new(),
        offset_names: HashMap::new(),
        visited: HashSet::new(),
    };
    session.read_model()
}

/// `(offset, count)` of an on-disk array whose count is stored twice.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct ArrayDef {
    pub offset: u32,
    pub count: u32,
}

/// State of one decode call.
pub(super) struct Session<'a> {
    pub mdl: BinaryReader<Cursor<&'a [u8]>>,
    pub mdx: BinaryReader<Cursor<&'a [u8]>>,
    pub target: Target,
    pub options: MdlReadOptions,
    /// Name table, indexed by node number.
    pub names: Vec<String>,
    /// Node number to name, from the peek pass.
    pub node_names: HashMap<u16, String>,
    /// Controller set of every decoded geometry node, by node number.
    pub node_sets: HashMap<u16, ControllerSet>,
    /// Geometry node names by node offset.
    pub offset_names: HashMap<u32, String>,
    pub visited: HashSet<u32>,
}

impl Session<'_> {
    fn read_model(&mut self) -> Result<Model> {
        // Geometry header
        let fn_ptr1 = self.mdl.read_u32()?;
        let fn_ptr2 = self.mdl.read_u32()?;
        self.target = Target::detect(fn_ptr1, fn_ptr2)?;
        let name = self.mdl.read_c_string_up_to(32)?;
        let root_offset = self.mdl.read_u32()?;
        let node_count = self.mdl.read_u32()?;
        self.mdl.skip(24 + 4 + 4)?;

        // Model header
        let classification = Classification::from_u8(self.mdl.read_u8()?)?;
        let subclassification = self.mdl.read_u8()?;
        let _unknown = self.mdl.read_u8()?;
        let affected_by_fog = self.mdl.read_u8()? != 0;
        let _child_model_count = self.mdl.read_u32()?;
        let animations = self.read_array()?;
        let _supermodel_ref = self.mdl.read_u32()?;
        let bounding_box = self.mdl.read_f32_array::<6>()?;
        let radius = self.mdl.read_f32()?;
        let animation_scale = self.mdl.read_f32()?;
        let supermodel = optional_name(self.mdl.read_c_string_up_to(32)?);
        let animation_root_offset = self.mdl.read_u32()?;
        let _unknown = self.mdl.read_u32()?;
        let _mdx_size = self.mdl.read_u32()?;
        let _mdx_offset = self.mdl.read_u32()?;
        let name_array = self.read_array()?;

        debug!(
            "Model {:?} ({:?}): {} nodes, {} animations, target {:?}",
            name, classification, node_count, animations.count, self.target
        );

        self.read_names(name_array)?;
        self.peek_names(root_offset, 0, &mut HashSet::new())?;
        let root = self.read_node(root_offset, 0)?;

        let animation_root = if animation_root_offset == 0 {
            None
        } else {
            self.offset_names.get(&animation_root_offset).cloned()
        };

        let animation_offsets = self.read_u32s(animations)?;
        let mut decoded = Vec::with_capacity(animation_offsets.len());
        for offset in animation_offsets {
            decoded.push(self.read_animation(offset)?);
        }

        Ok(Model {
            name,
            supermodel,
            classification,
            subclassification,
            affected_by_fog,
            animation_root,
            bounding_box,
            radius,
            animation_scale,
            root,
            animations: decoded,
        })
    }

    /// Read an `(offset, count, count)` descriptor.
    pub(super) fn read_array(&mut self) -> Result<ArrayDef> {
        let offset = self.mdl.read_u32()?;
        let count = self.mdl.read_u32()?;
        let repeated = self.mdl.read_u32()?;
        if count != repeated {
            return Err(Error::ArrayCountMismatch { count, repeated });
        }
        Ok(ArrayDef { offset, count })
    }

    pub(super) fn read_u32s(&mut self, array: ArrayDef) -> Result<Vec<u32>> {
        if array.count == 0 {
            return Ok(Vec::new());
        }
        self.mdl.seek(u64::from(array.offset))?;
        (0..array.count).map(|_| self.mdl.read_u32()).collect()
    }

    pub(super) fn read_f32s(&mut self, array: ArrayDef) -> Result<Vec<f32>> {
        if array.count == 0 {
            return Ok(Vec::new());
        }
        self.mdl.seek(u64::from(array.offset))?;
        (0..array.count).map(|_| self.mdl.read_f32()).collect()
    }

    fn read_names(&mut self, array: ArrayDef) -> Result<()> {
        let offsets = self.read_u32s(array)?;
        self.names = Vec::with_capacity(offsets.len());
        for offset in offsets {
            self.mdl.seek(u64::from(offset))?;
            let name = self.mdl.read_c_string()?;
            self.names.push(name);
        }
        Ok(())
    }

    pub(super) fn name(&self, node_number: u16) -> Result<String> {
        self.names
            .get(usize::from(node_number))
            .cloned()
            .ok_or(Error::InvalidNameIndex(usize::from(node_number)))
    }

    /// Collect node numbers and names in traversal order without decoding nodes.
    fn peek_names(&mut self, offset: u32, depth: usize, seen: &mut HashSet<u32>) -> Result<()> {
        guard(self.options.max_depth, offset, depth, seen)?;
        self.mdl.seek(u64::from(offset) + 4)?;
        let node_number = self.mdl.read_u16()?;
        let name = self.name(node_number)?;
        self.node_names.insert(node_number, name);

        self.mdl.seek(u64::from(offset) + 44)?;
        let children = self.read_array()?;
        for child in self.read_u32s(children)? {
            self.peek_names(child, depth + 1, seen)?;
        }
        Ok(())
    }
}

/// Reject revisited offsets and trees deeper than `max_depth`.
pub(super) fn guard(max_depth: usize, offset: u32, depth: usize, seen: &mut HashSet<u32>) -> Result<()> {
    if depth > max_depth {
        return Err(Error::MalformedTree {
            offset,
            message: format!("nesting deeper than {max_depth}"),
        });
    }
    if !seen.insert(offset) {
        return Err(Error::MalformedTree {
            offset,
            message: "offset visited twice".to_string(),
        });
    }
    Ok(())
}

/// `None` for empty or `NULL` name slots.
pub(super) fn optional_name(name: String) -> Option<String> {
    if name.is_empty() || name.eq_ignore_ascii_case(NULL_NAME) {
        None
    } else {
        Some(name)
    }
}
