//! Subcommand enum definitions for CLI

use clap::Subcommand;
use std::path::PathBuf;

use super::WriteOptionArgs;

/// MDL model commands
#[derive(Subcommand)]
pub enum MdlCommands {
    /// Print the model header, node tree and animations
    Inspect {
        /// MDL file (the MDX is found next to it)
        path: PathBuf,
    },

    /// Decode a model to JSON
    #[command(name = "to-json")]
    ToJson {
        /// MDL file
        source: PathBuf,

        /// Output JSON file (prints to stdout if omitted)
        destination: Option<PathBuf>,
    },

    /// Decode a model and encode it again, optionally for another build
    Rewrite {
        /// Source MDL file
        source: PathBuf,

        /// Destination MDL file (the MDX is written next to it)
        destination: PathBuf,

        #[command(flatten)]
        options: WriteOptionArgs,
    },
}

/// BWM walkmesh commands
#[derive(Subcommand)]
pub enum BwmCommands {
    /// Print walkmesh counts and its use points
    Inspect {
        /// WOK, PWK or DWK file
        path: PathBuf,
    },

    /// Decode a walkmesh to JSON
    #[command(name = "to-json")]
    ToJson {
        /// Walkmesh file
        source: PathBuf,

        /// Output JSON file (prints to stdout if omitted)
        destination: Option<PathBuf>,
    },

    /// Decode a walkmesh and encode it again (rebuilds topology and AABB tree)
    Rewrite {
        /// Source walkmesh file
        source: PathBuf,

        /// Destination walkmesh file
        destination: PathBuf,
    },
}

/// GFF document commands
#[derive(Subcommand)]
pub enum GffCommands {
    /// Decode any GFF file to JSON
    #[command(name = "to-json")]
    ToJson {
        /// GFF file (PTH, UTC, ARE, ...)
        source: PathBuf,

        /// Output JSON file (prints to stdout if omitted)
        destination: Option<PathBuf>,
    },
}

/// PTH path commands
#[derive(Subcommand)]
pub enum PthCommands {
    /// List path points and their connections
    Inspect {
        /// PTH file
        path: PathBuf,
    },
}

/// TPC texture commands
#[derive(Subcommand)]
pub enum TpcCommands {
    /// Show texture header info and TXI lines
    Info {
        /// TPC file
        path: PathBuf,
    },

    /// Convert a TPC texture to PNG
    #[command(name = "to-png")]
    ToPng {
        /// Source TPC file
        source: PathBuf,

        /// Destination PNG file
        destination: PathBuf,
    },

    /// Convert every TPC below a directory to PNG
    Batch {
        /// Source directory
        source: PathBuf,

        /// Output directory (mirrors the source layout)
        destination: PathBuf,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },
}
