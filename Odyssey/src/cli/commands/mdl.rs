//! CLI commands for MDL models

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{DISK, LOOKING_GLASS, print_done, print_step};
use crate::converter;
use crate::formats::mdl::{MdlWriteOptions, ModelNode, NodeKind, read_mdl, write_mdl};

/// Print the model header, node tree and animations
pub fn inspect(path: &Path) -> anyhow::Result<()> {
    let model = read_mdl(path)?;

    println!("Model: {}", model.name);
    println!();
    println!("Classification: {:?}", model.classification);
    println!(
        "Supermodel: {}",
        model.supermodel.as_deref().unwrap_or("(none)")
    );
    println!(
        "Animation root: {}",
        model.animation_root.as_deref().unwrap_or("(none)")
    );
    println!("Radius: {:.3}", model.radius);
    println!("Nodes: {}", model.nodes().len());
    println!();

    println!("Node tree:");
    print_node(&model.root, 1);

    if !model.animations.is_empty() {
        println!();
        println!("Animations:");
        for animation in &model.animations {
            println!(
                "  {:24} length {:>6.2}s  transition {:.2}  events {}",
                animation.name,
                animation.length,
                animation.transition,
                animation.events.len()
            );
        }
    }
    Ok(())
}

fn print_node(node: &ModelNode, depth: usize) {
    println!("{}{} [{}]{}", "  ".repeat(depth), node.name, kind_name(&node.kind), mesh_summary(&node.kind));
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn kind_name(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Dummy => "dummy",
        NodeKind::Reference(_) => "reference",
        NodeKind::Trimesh(_) => "trimesh",
        NodeKind::Danglymesh { .. } => "danglymesh",
        NodeKind::Skin { .. } => "skin",
        NodeKind::Emitter(_) => "emitter",
        NodeKind::Light(_) => "light",
        NodeKind::Aabb { .. } => "aabb",
        NodeKind::Lightsaber(_) => "lightsaber",
    }
}

fn mesh_summary(kind: &NodeKind) -> String {
    kind.mesh()
        .map(|mesh| {
            format!(
                " {} verts, {} faces, texture {}",
                mesh.vertices.len(),
                mesh.faces.len(),
                mesh.diffuse_texture.as_deref().unwrap_or("NULL")
            )
        })
        .unwrap_or_default()
}

/// Decode a model to JSON
pub fn to_json(source: &Path, destination: Option<&Path>) -> anyhow::Result<()> {
    let model = read_mdl(source)?;
    super::emit(&converter::to_json(&model)?, destination)
}

/// Decode a model and encode it for the requested build
pub fn rewrite(source: &Path, destination: &Path, options: &MdlWriteOptions) -> anyhow::Result<()> {
    let started = Instant::now();

    print_step(1, 2, LOOKING_GLASS, &format!("Reading {}...", source.display()));
    let model = read_mdl(source)?;

    print_step(
        2,
        2,
        DISK,
        &format!("Writing {} ({:?})...", destination.display(), options.target()),
    );
    write_mdl(&model, destination, options)?;

    print_done(started.elapsed());
    Ok(())
}
