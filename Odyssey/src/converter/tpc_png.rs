//! TPC → PNG texture conversion

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use image::{ImageBuffer, RgbaImage};
use tracing::info;

use crate::error::{Error, Result};
use crate::formats::tpc::{TpcImage, parse_tpc_bytes};

/// Convert a TPC file to PNG
///
/// Cubemaps are written as one tall image with the six faces stacked.
///
/// # Errors
/// Returns an error if the file cannot be read, decoded or encoded.
pub fn tpc_to_png<P: AsRef<Path>, Q: AsRef<Path>>(tpc_path: P, png_path: Q) -> Result<()> {
    info!(
        "Converting {} -> {}",
        tpc_path.as_ref().display(),
        png_path.as_ref().display()
    );
    let file = File::open(tpc_path.as_ref())?;
    let mut reader = BufReader::new(file);
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let png_data = tpc_bytes_to_png_bytes(&data)?;

    let mut output = BufWriter::new(File::create(png_path.as_ref())?);
    output.write_all(&png_data)?;
    output.flush()?;
    Ok(())
}

/// Convert TPC bytes to PNG bytes
///
/// # Errors
/// Returns an error if the TPC data cannot be decoded or the PNG encoder fails.
pub fn tpc_bytes_to_png_bytes(tpc_data: &[u8]) -> Result<Vec<u8>> {
    let image = parse_tpc_bytes(tpc_data)?;
    tpc_image_to_png_bytes(&image)
}

/// Encode a decoded texture as an 8-bit RGBA PNG
pub fn tpc_image_to_png_bytes(image: &TpcImage) -> Result<Vec<u8>> {
    let img: RgbaImage = ImageBuffer::from_raw(
        u32::from(image.width),
        u32::from(image.height),
        image.to_rgba8(),
    )
    .ok_or_else(|| Error::PngEncodeFailed {
        message: "pixel buffer does not match the texture size".to_string(),
    })?;

    let mut png_data = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_data);
    img.write_with_encoder(encoder)
        .map_err(|e| Error::PngEncodeFailed {
            message: e.to_string(),
        })?;
    Ok(png_data)
}
