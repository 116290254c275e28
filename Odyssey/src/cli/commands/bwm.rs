//! CLI commands for BWM walkmeshes

use std::path::Path;

use crate::converter;
use crate::formats::bwm::{read_bwm, write_bwm};

/// Print walkmesh counts and its use points
pub fn inspect(path: &Path) -> anyhow::Result<()> {
    let walkmesh = read_bwm(path)?;

    println!("Walkmesh: {}", path.display());
    println!();
    println!("Kind: {:?}", walkmesh.kind);
    println!("Position: {:?}", walkmesh.position);
    println!("Vertices: {}", walkmesh.vertices.len());
    println!(
        "Faces: {} ({} walkable)",
        walkmesh.faces.len(),
        walkmesh.walkable_face_count()
    );
    println!("Outer edges: {}", walkmesh.outer_edges.len());
    println!(
        "Transitions: {}",
        walkmesh
            .outer_edges
            .iter()
            .filter(|edge| edge.transition.is_some())
            .count()
    );
    println!("Perimeters: {}", walkmesh.perimeters.len());
    println!("AABB nodes: {}", walkmesh.aabb_tree.len());
    println!("Use points (relative): {:?}", walkmesh.relative_use);
    println!("Use points (absolute): {:?}", walkmesh.absolute_use);
    Ok(())
}

/// Decode a walkmesh to JSON
pub fn to_json(source: &Path, destination: Option<&Path>) -> anyhow::Result<()> {
    let walkmesh = read_bwm(source)?;
    super::emit(&converter::to_json(&walkmesh)?, destination)
}

/// Decode a walkmesh and encode it again
pub fn rewrite(source: &Path, destination: &Path) -> anyhow::Result<()> {
    let walkmesh = read_bwm(source)?;
    write_bwm(&walkmesh, destination)?;
    println!("Wrote {}", destination.display());
    Ok(())
}
