//! TPC texture format module
//!
//! Headerless-magic texture container: a 128-byte header, a mip pyramid
//! (six of them for cubemaps) and optional trailing TXI text.

mod dxt;
mod reader;

use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::BinaryReader;

pub use dxt::{decompress_dxt1, decompress_dxt5};
pub use reader::{parse_tpc_bytes, read_tpc, read_tpc_header};

pub const TPC_HEADER_SIZE: usize = 128;

/// Pixel encoding byte of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TpcEncoding {
    Grayscale = 1,
    /// DXT1 when compressed.
    Rgb = 2,
    /// DXT5 when compressed.
    Rgba = 4,
}

impl TpcEncoding {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Grayscale),
            2 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            other => Err(Error::UnsupportedTpcEncoding(other)),
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Grayscale => 1,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Bytes per 4x4 block when compressed.
    pub fn block_bytes(self) -> usize {
        match self {
            Self::Rgba => 16,
            Self::Grayscale | Self::Rgb => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpcHeader {
    /// Size of the compressed top mip level; 0 for uncompressed data.
    pub data_size: u32,
    pub alpha_test: f32,
    pub width: u16,
    pub height: u16,
    pub encoding: TpcEncoding,
    pub mip_count: u8,
}

impl TpcHeader {
    pub fn read<R: Read + Seek>(reader: &mut BinaryReader<R>) -> Result<Self> {
        let data_size = reader.read_u32()?;
        let alpha_test = reader.read_f32()?;
        let width = reader.read_u16()?;
        let height = reader.read_u16()?;
        let encoding = TpcEncoding::from_u8(reader.read_u8()?)?;
        let mip_count = reader.read_u8()?;
        reader.skip(114)?;
        Ok(Self {
            data_size,
            alpha_test,
            width,
            height,
            encoding,
            mip_count,
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.data_size != 0
    }

    pub fn is_cubemap(&self) -> bool {
        self.width != 0 && self.height / self.width == 6
    }

    /// Byte size of one mip level of one face.
    pub fn mip_size(&self, level: u32, width: usize, height: usize) -> usize {
        if !self.is_compressed() {
            return width * height * self.encoding.bytes_per_pixel();
        }
        if level == 0 {
            return self.data_size as usize;
        }
        let block = self.encoding.block_bytes();
        (block * width.div_ceil(4) * height.div_ceil(4)).max(block)
    }
}

/// A decoded texture: top mip level as RGBA floats in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpcImage {
    pub width: u16,
    /// Full height; six stacked faces for cubemaps.
    pub height: u16,
    pub encoding: TpcEncoding,
    pub alpha_test: f32,
    pub mip_count: u8,
    pub cubemap: bool,
    /// Row-major, four floats per pixel.
    pub pixels: Vec<f32>,
    /// Trailing texture-info lines.
    pub txi: Vec<String>,
}

impl TpcImage {
    /// Pixels quantized back to RGBA8.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }

    pub fn info(&self) -> TpcInfo {
        TpcInfo {
            width: self.width,
            height: self.height,
            encoding: self.encoding,
            alpha_test: self.alpha_test,
            mip_count: self.mip_count,
            cubemap: self.cubemap,
            txi: self.txi.clone(),
        }
    }
}

/// Texture metadata without the pixel buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpcInfo {
    pub width: u16,
    pub height: u16,
    pub encoding: TpcEncoding,
    pub alpha_test: f32,
    pub mip_count: u8,
    pub cubemap: bool,
    pub txi: Vec<String>,
}
