//! Utility functions

pub mod binary_reader;
pub mod binary_writer;
pub mod path;

pub use binary_reader::BinaryReader;
pub use binary_writer::BinaryWriter;
pub use path::{extension_lower, mdx_path_for};
