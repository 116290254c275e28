//! BWM binary walkmesh format module
//!
//! Collision surfaces for rooms (WOK), placeables (PWK) and doors (DWK).

mod reader;
mod topology;
mod types;
mod writer;

pub use reader::{parse_bwm_bytes, read_bwm};
pub use topology::normalize_walkmesh;
pub use types::{NON_WALKABLE_MATERIALS, OuterEdge, Walkmesh, WalkmeshKind, is_walkable};
pub use writer::{serialize_bwm, write_bwm};

pub const BWM_MAGIC: &[u8; 4] = b"BWM ";
pub const BWM_VERSION: &[u8; 4] = b"V1.0";

pub(crate) const BWM_HEADER_SIZE: u32 = 136;
pub(crate) const AABB_NODE_SIZE: u32 = 44;
pub(crate) const NO_INDEX: u32 = 0xFFFF_FFFF;
