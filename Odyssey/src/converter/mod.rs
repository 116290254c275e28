//! Format conversion utilities
//!
//! - TPC → PNG texture export, single file or a whole directory in parallel
//! - Any decoded asset → pretty-printed JSON

mod batch;
mod json;
mod tpc_png;

pub use batch::{BatchConvertResult, batch_tpc_to_png, find_tpc_files};
pub use json::{to_json, write_json};
pub use tpc_png::{tpc_bytes_to_png_bytes, tpc_image_to_png_bytes, tpc_to_png};
