//! Types and algorithms shared across the Odyssey formats

pub mod aabb;
pub mod quantize;
pub mod types;

pub use aabb::{AabbFace, AabbNode, MAX_TREE_DEPTH, build_aabb_tree, faces_from_mesh};
pub use quantize::{
    compress_quaternion, compress_xbox_normal, decompress_quaternion, decompress_xbox_normal,
    float_to_int_bits, int_bits_to_float,
};
pub use types::{Face, bounds, plane_distance};
