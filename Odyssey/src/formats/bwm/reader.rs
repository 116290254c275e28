//! BWM file reading and parsing

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use tracing::debug;

use super::types::{OuterEdge, Walkmesh, WalkmeshKind};
use super::{BWM_MAGIC, BWM_VERSION, NO_INDEX};
use crate::error::{Error, Result};
use crate::formats::common::{AabbNode, Face};
use crate::utils::BinaryReader;

/// Read a BWM walkmesh (WOK/PWK/DWK) from disk
///
/// # Errors
/// Returns an error if the file cannot be read or has an invalid format.
pub fn read_bwm<P: AsRef<Path>>(path: P) -> Result<Walkmesh> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    parse_bwm_bytes(&buffer)
}

/// Parse BWM data from bytes
///
/// # Errors
/// Returns an error if the magic, version or kind is wrong, or a section is truncated.
pub fn parse_bwm_bytes(data: &[u8]) -> Result<Walkmesh> {
    let mut reader = BinaryReader::new(Cursor::new(data));

    let magic = reader.read_magic()?;
    if &magic != BWM_MAGIC {
        return Err(Error::InvalidBwmMagic(magic));
    }
    let version = reader.read_magic()?;
    if &version != BWM_VERSION {
        return Err(Error::UnsupportedBwmVersion(version));
    }

    let kind = WalkmeshKind::from_u32(reader.read_u32()?)?;
    let relative_use = [reader.read_vec3()?, reader.read_vec3()?];
    let absolute_use = [reader.read_vec3()?, reader.read_vec3()?];
    let position = reader.read_vec3()?;

    let vertex_count = reader.read_u32()?;
    let vertex_offset = reader.read_u32()?;
    let face_count = reader.read_u32()?;
    let indices_offset = reader.read_u32()?;
    let materials_offset = reader.read_u32()?;
    let normals_offset = reader.read_u32()?;
    let distances_offset = reader.read_u32()?;
    let aabb_count = reader.read_u32()?;
    let aabb_offset = reader.read_u32()?;
    let _unknown = reader.read_u32()?;
    let adjacent_count = reader.read_u32()?;
    let adjacent_offset = reader.read_u32()?;
    let outer_count = reader.read_u32()?;
    let outer_offset = reader.read_u32()?;
    let perimeter_count = reader.read_u32()?;
    let perimeter_offset = reader.read_u32()?;

    debug!(
        "BWM {:?}: {} vertices, {} faces, {} aabb nodes",
        kind, vertex_count, face_count, aabb_count
    );

    let vertices = read_section(&mut reader, vertex_offset, vertex_count, |r| r.read_vec3())?;
    let indices = read_section(&mut reader, indices_offset, face_count, |r| {
        Ok([r.read_u32()?, r.read_u32()?, r.read_u32()?])
    })?;
    let materials = read_section(&mut reader, materials_offset, face_count, |r| r.read_u32())?;
    let normals = read_section(&mut reader, normals_offset, face_count, |r| r.read_vec3())?;
    let distances = read_section(&mut reader, distances_offset, face_count, |r| r.read_f32())?;

    let faces = indices
        .into_iter()
        .zip(materials)
        .zip(normals.into_iter().zip(distances))
        .map(|((vertices, material), (normal, distance))| Face {
            vertices,
            material,
            normal,
            distance,
        })
        .collect();

    let aabb_tree = read_section(&mut reader, aabb_offset, aabb_count, read_aabb_node)?;
    let adjacent_edges = read_section(&mut reader, adjacent_offset, adjacent_count, |r| {
        Ok([r.read_i32()?, r.read_i32()?, r.read_i32()?])
    })?;
    let outer_edges = read_section(&mut reader, outer_offset, outer_count, |r| {
        let edge = r.read_u32()?;
        let transition = r.read_i32()?;
        Ok(OuterEdge {
            edge,
            transition: u32::try_from(transition).ok(),
        })
    })?;
    let perimeters = read_section(&mut reader, perimeter_offset, perimeter_count, |r| r.read_u32())?;

    Ok(Walkmesh {
        kind,
        relative_use,
        absolute_use,
        position,
        vertices,
        faces,
        adjacent_edges,
        outer_edges,
        perimeters,
        aabb_tree,
    })
}

fn read_section<R, T, F>(reader: &mut BinaryReader<R>, offset: u32, count: u32, mut read: F) -> Result<Vec<T>>
where
    R: Read + Seek,
    F: FnMut(&mut BinaryReader<R>) -> Result<T>,
{
    if count == 0 {
        return Ok(Vec::new());
    }
    reader.seek(u64::from(offset))?;
    (0..count).map(|_| read(reader)).collect()
}

fn read_aabb_node<R: Read + Seek>(reader: &mut BinaryReader<R>) -> Result<AabbNode> {
    let bbox_min = reader.read_vec3()?;
    let bbox_max = reader.read_vec3()?;
    let face_index = reader.read_i32()?;
    let _unknown = reader.read_u32()?;
    let split_plane = reader.read_u32()?;
    let child = |value: u32| if value == NO_INDEX { 0 } else { value };
    let left = child(reader.read_u32()?);
    let right = child(reader.read_u32()?);
    Ok(AabbNode {
        bbox_min,
        bbox_max,
        face_index,
        split_plane,
        left,
        right,
    })
}
