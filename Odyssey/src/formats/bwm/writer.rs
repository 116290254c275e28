//! BWM file writing and serialization

use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use super::topology::normalize_walkmesh;
use super::types::Walkmesh;
use super::{AABB_NODE_SIZE, BWM_HEADER_SIZE, BWM_MAGIC, BWM_VERSION, NO_INDEX};
use crate::error::Result;
use crate::utils::BinaryWriter;

/// Write a walkmesh to disk
pub fn write_bwm<P: AsRef<Path>>(walkmesh: &Walkmesh, path: P) -> Result<()> {
    let bytes = serialize_bwm(walkmesh)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Serialize a walkmesh to bytes
///
/// Faces are reordered walkable-first and every derived table is rebuilt
/// (see [`normalize_walkmesh`]) before layout.
///
/// # Errors
/// Returns an error if a face references a missing vertex.
pub fn serialize_bwm(walkmesh: &Walkmesh) -> Result<Vec<u8>> {
    let mesh = normalize_walkmesh(walkmesh)?;
    let face_count = mesh.faces.len() as u32;

    // Section offsets as a running cursor, in file order.
    let mut cursor = BWM_HEADER_SIZE;
    let mut section = |bytes: u32| {
        let offset = cursor;
        cursor += bytes;
        offset
    };
    let vertex_offset = section(mesh.vertices.len() as u32 * 12);
    let indices_offset = section(face_count * 12);
    let materials_offset = section(face_count * 4);
    let normals_offset = section(face_count * 12);
    let distances_offset = section(face_count * 4);
    let aabb_offset = section(mesh.aabb_tree.len() as u32 * AABB_NODE_SIZE);
    let adjacent_offset = section(mesh.adjacent_edges.len() as u32 * 12);
    let outer_offset = section(mesh.outer_edges.len() as u32 * 8);
    let perimeter_offset = section(mesh.perimeters.len() as u32 * 4);
    debug!(
        "BWM layout: {} faces, {} aabb nodes, {} bytes",
        face_count,
        mesh.aabb_tree.len(),
        cursor
    );

    let mut writer = BinaryWriter::new(Cursor::new(Vec::with_capacity(cursor as usize)));
    writer.write_bytes(BWM_MAGIC)?;
    writer.write_bytes(BWM_VERSION)?;
    writer.write_u32(mesh.kind as u32)?;
    for vector in mesh.relative_use.iter().chain(&mesh.absolute_use) {
        writer.write_f32_slice(vector)?;
    }
    writer.write_f32_slice(&mesh.position)?;

    for value in [
        mesh.vertices.len() as u32,
        vertex_offset,
        face_count,
        indices_offset,
        materials_offset,
        normals_offset,
        distances_offset,
        mesh.aabb_tree.len() as u32,
        aabb_offset,
        0,
        mesh.adjacent_edges.len() as u32,
        adjacent_offset,
        mesh.outer_edges.len() as u32,
        outer_offset,
        mesh.perimeters.len() as u32,
        perimeter_offset,
    ] {
        writer.write_u32(value)?;
    }

    for vertex in &mesh.vertices {
        writer.write_f32_slice(vertex)?;
    }
    for face in &mesh.faces {
        for index in face.vertices {
            writer.write_u32(index)?;
        }
    }
    for face in &mesh.faces {
        writer.write_u32(face.material)?;
    }
    for face in &mesh.faces {
        writer.write_f32_slice(&face.normal)?;
    }
    for face in &mesh.faces {
        writer.write_f32(face.distance)?;
    }

    for node in &mesh.aabb_tree {
        writer.write_f32_slice(&node.bbox_min)?;
        writer.write_f32_slice(&node.bbox_max)?;
        writer.write_i32(node.face_index)?;
        writer.write_u32(4)?;
        writer.write_u32(node.split_plane)?;
        let child = |index: u32| if node.is_leaf() { NO_INDEX } else { index };
        writer.write_u32(child(node.left))?;
        writer.write_u32(child(node.right))?;
    }

    for adjacent in &mesh.adjacent_edges {
        for edge in adjacent {
            writer.write_i32(*edge)?;
        }
    }
    for outer in &mesh.outer_edges {
        writer.write_u32(outer.edge)?;
        writer.write_i32(outer.transition.map_or(-1, |t| t as i32))?;
    }
    for perimeter in &mesh.perimeters {
        writer.write_u32(*perimeter)?;
    }

    Ok(writer.into_inner().into_inner())
}
