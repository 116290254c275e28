//! CLI commands for TPC textures

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{LOOKING_GLASS, PICTURE, print_done, print_step, simple_bar};
use crate::converter::{batch_tpc_to_png, find_tpc_files, tpc_to_png};
use crate::formats::tpc::read_tpc;

/// Show texture header info and TXI lines
pub fn info(path: &Path) -> anyhow::Result<()> {
    let info = read_tpc(path)?.info();

    println!("TPC Information: {}", path.display());
    println!();
    println!("Dimensions: {}x{}", info.width, info.height);
    println!("Encoding: {:?}", info.encoding);
    println!("Mip levels: {}", info.mip_count);
    println!("Cubemap: {}", info.cubemap);
    println!("Alpha test: {}", info.alpha_test);
    if !info.txi.is_empty() {
        println!();
        println!("TXI:");
        for line in &info.txi {
            println!("  {line}");
        }
    }
    Ok(())
}

/// Convert a TPC texture to PNG
pub fn to_png(source: &Path, destination: &Path) -> anyhow::Result<()> {
    tpc_to_png(source, destination)?;
    println!("Wrote {}", destination.display());
    Ok(())
}

/// Convert every TPC below `source` to PNG
pub fn batch(source: &Path, destination: &Path, quiet: bool) -> anyhow::Result<()> {
    let started = Instant::now();

    if !quiet {
        print_step(1, 2, LOOKING_GLASS, &format!("Scanning {}...", source.display()));
    }
    let files = find_tpc_files(source);
    if files.is_empty() {
        println!("No TPC files found in {}", source.display());
        return Ok(());
    }

    if !quiet {
        print_step(2, 2, PICTURE, &format!("Converting {} textures...", files.len()));
    }
    let bar = (!quiet).then(|| simple_bar(files.len() as u64, "Converting"));
    let result = batch_tpc_to_png(&files, source, destination, |_, _, _| {
        if let Some(bar) = &bar {
            bar.inc(1);
        }
    });
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    for (path, error) in &result.failures {
        eprintln!("Failed: {} ({error})", path.display());
    }
    println!(
        "Converted {} of {} textures",
        result.success_count,
        files.len()
    );
    if !quiet {
        print_done(started.elapsed());
    }
    if result.fail_count > 0 {
        anyhow::bail!("{} textures failed to convert", result.fail_count);
    }
    Ok(())
}
