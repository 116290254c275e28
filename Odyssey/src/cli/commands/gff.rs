//! CLI commands for GFF documents

use std::path::Path;

use crate::converter;
use crate::formats::gff::read_gff;

/// Decode any GFF file to JSON
pub fn to_json(source: &Path, destination: Option<&Path>) -> anyhow::Result<()> {
    let document = read_gff(source)?;
    super::emit(&converter::to_json(&document)?, destination)
}
