//! File format handlers for Odyssey engine assets

pub mod bwm;
pub mod common;
pub mod gff;
pub mod mdl;
pub mod pth;
pub mod tpc;

// Re-export the shared geometry types
pub use common::{AabbNode, Face, build_aabb_tree};

// Re-export main document types
pub use bwm::{Walkmesh, WalkmeshKind, read_bwm, write_bwm};
pub use gff::{GffDocument, GffStruct, GffValue, read_gff, write_gff};
pub use mdl::{Model, ModelNode, NodeKind, read_mdl, write_mdl};
pub use pth::{PathGraph, PathPoint, read_pth, write_pth};
pub use tpc::{TpcImage, TpcInfo, read_tpc};
