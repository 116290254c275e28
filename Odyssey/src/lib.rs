//! # Odyssey
//!
//! A pure-Rust library for the binary asset formats of BioWare's Odyssey
//! engine (Knights of the Old Republic and The Sith Lords).
//!
//! ## Supported Formats
//!
//! - **MDL/MDX** - Models: node trees, meshes, skins, lights, emitters, animations
//! - **BWM** - Walkmeshes (WOK, PWK, DWK) with AABB trees and topology
//! - **GFF** - Generic file format trees, plus typed PTH path files
//! - **TPC** - Textures (DXT1/DXT5 and uncompressed), with PNG export
//!
//! ## Quick Start
//!
//! ```no_run
//! use odyssey::formats::mdl::{MdlWriteOptions, Platform, read_mdl, write_mdl};
//!
//! // Reads c_bantha.mdl together with c_bantha.mdx
//! let model = read_mdl("c_bantha.mdl")?;
//! println!("{} nodes", model.nodes().len());
//!
//! // Re-encode for the Xbox build
//! let options = MdlWriteOptions { platform: Platform::Xbox, ..Default::default() };
//! write_mdl(&model, "out/c_bantha.mdl", &options)?;
//! # Ok::<(), odyssey::Error>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use odyssey::prelude::*;
//!
//! let model = Model::new("root");
//! let bytes = serialize_mdl(&model, &MdlWriteOptions::default())?;
//! let decoded = parse_mdl_bytes(&bytes.mdl, &bytes.mdx)?;
//! assert_eq!(decoded.root.name, "root");
//! # Ok::<(), odyssey::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `odyssey` command-line binary

pub mod converter;
pub mod error;
pub mod formats;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, ErrorKind, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::formats::common::{AabbNode, Face, build_aabb_tree, faces_from_mesh};

    pub use crate::formats::bwm::{
        OuterEdge, Walkmesh, WalkmeshKind, parse_bwm_bytes, read_bwm, serialize_bwm, write_bwm,
    };
    pub use crate::formats::gff::{
        GffDocument, GffStruct, GffValue, parse_gff_bytes, read_gff, serialize_gff, write_gff,
    };
    pub use crate::formats::mdl::{
        Animation, AnimationNode, Classification, Edition, Light, MdlBytes, MdlReadOptions,
        MdlWriteOptions, Mesh, Model, ModelNode, NodeKind, Platform, Target, parse_mdl_bytes,
        read_mdl, serialize_mdl, write_mdl,
    };
    pub use crate::formats::pth::{PathGraph, PathPoint, read_pth, write_pth};
    pub use crate::formats::tpc::{TpcImage, TpcInfo, parse_tpc_bytes, read_tpc};

    pub use crate::converter;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
