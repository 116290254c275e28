//! CLI commands for PTH path files

use std::path::Path;

use crate::formats::pth::read_pth;

/// List path points and their connections
pub fn inspect(path: &Path) -> anyhow::Result<()> {
    let graph = read_pth(path)?;

    println!("Path: {}", path.display());
    println!();
    println!("Points: {}", graph.points.len());
    println!(
        "Connections: {}",
        graph.points.iter().map(|p| p.connections.len()).sum::<usize>()
    );
    println!();
    for (index, point) in graph.points.iter().enumerate() {
        println!(
            "  {:>4}  ({:>9.3}, {:>9.3})  -> {:?}",
            index, point.x, point.y, point.connections
        );
    }
    Ok(())
}
