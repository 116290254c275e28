//! TPC file reading and decompression

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use tracing::debug;

use super::dxt::{decompress_dxt1, decompress_dxt5};
use super::{TPC_HEADER_SIZE, TpcEncoding, TpcHeader, TpcImage};
use crate::error::{Error, Result};
use crate::utils::BinaryReader;

/// Read a TPC texture from disk
///
/// # Errors
/// Returns an error if the file cannot be read or has an invalid format.
pub fn read_tpc<P: AsRef<Path>>(path: P) -> Result<TpcImage> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    parse_tpc_bytes(&buffer)
}

/// Read only the 128-byte header of a TPC texture
///
/// # Errors
/// Returns an error on a short read or unknown encoding.
pub fn read_tpc_header<P: AsRef<Path>>(path: P) -> Result<TpcHeader> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; TPC_HEADER_SIZE];
    file.read_exact(&mut buffer)?;
    TpcHeader::read(&mut BinaryReader::new(Cursor::new(buffer.as_slice())))
}

/// Decode TPC data from bytes
///
/// Only the top mip level is decompressed; deeper levels are skipped.
///
/// # Errors
/// Returns an error if the data is truncated or the encoding is unknown.
pub fn parse_tpc_bytes(data: &[u8]) -> Result<TpcImage> {
    let mut reader = BinaryReader::new(Cursor::new(data));
    let header = TpcHeader::read(&mut reader)?;

    let width = usize::from(header.width);
    let (faces, face_height) = if header.is_cubemap() {
        (6, width)
    } else {
        (1, usize::from(header.height))
    };
    debug!(
        "TPC {}x{} {:?}, {} mips, {} face(s), compressed: {}",
        header.width,
        header.height,
        header.encoding,
        header.mip_count,
        faces,
        header.is_compressed()
    );

    let mut top_level = Vec::new();
    for _ in 0..faces {
        for level in 0..header.mip_count.max(1) {
            let level_width = (width >> level).max(1);
            let level_height = (face_height >> level).max(1);
            let size = header.mip_size(u32::from(level), level_width, level_height);
            let bytes = reader.read_bytes(size)?;
            if level == 0 {
                top_level.push(bytes);
            }
        }
    }

    let mut rgba = Vec::with_capacity(width * face_height * faces * 4);
    for face in &top_level {
        rgba.extend(decode_top_level(&header, face, width, face_height)?);
    }

    let mut trailing = Vec::new();
    reader.into_inner().read_to_end(&mut trailing)?;
    let txi = String::from_utf8_lossy(&trailing)
        .lines()
        .map(|line| line.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    Ok(TpcImage {
        width: header.width,
        height: (face_height * faces) as u16,
        encoding: header.encoding,
        alpha_test: header.alpha_test,
        mip_count: header.mip_count,
        cubemap: header.is_cubemap(),
        pixels: rgba.iter().map(|&byte| f32::from(byte) / 255.0).collect(),
        txi,
    })
}

/// Expand one face's top mip level to RGBA8, alpha forced opaque when the
/// encoding carries none.
fn decode_top_level(header: &TpcHeader, data: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let pixels = width * height;
    let rgba = match (header.encoding, header.is_compressed()) {
        (TpcEncoding::Rgb, true) => {
            let mut rgba = decompress_dxt1(data, width, height, false);
            for texel in rgba.chunks_exact_mut(4) {
                texel[3] = 255;
            }
            rgba
        }
        (TpcEncoding::Rgba, true) => decompress_dxt5(data, width, height),
        (TpcEncoding::Grayscale, true) => {
            return Err(Error::UnsupportedTpcEncoding(TpcEncoding::Grayscale as u8));
        }
        (TpcEncoding::Grayscale, false) => data
            .iter()
            .take(pixels)
            .flat_map(|&v| [v, v, v, 255])
            .collect(),
        (TpcEncoding::Rgb, false) => data
            .chunks_exact(3)
            .take(pixels)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        (TpcEncoding::Rgba, false) => data.iter().take(pixels * 4).copied().collect(),
    };
    Ok(rgba)
}
