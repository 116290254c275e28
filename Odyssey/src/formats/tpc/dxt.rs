//! DXT1 / DXT5 block decompression
//!
//! Both decoders emit tightly packed RGBA8 rows, `width * height * 4` bytes.
//! Blocks that run past the image edge are clipped.

const BLOCK_DIM: usize = 4;

/// Decompress DXT1 (BC1) data.
///
/// With `has_alpha` set every block uses the four-colour palette; otherwise
/// blocks with `color0 <= color1` use three colours plus transparent black.
pub fn decompress_dxt1(data: &[u8], width: usize, height: usize, has_alpha: bool) -> Vec<u8> {
    decompress_blocks(data, width, height, 8, |block| {
        decode_color_block(block, has_alpha)
    })
}

/// Decompress DXT5 (BC3) data: an interpolated alpha block followed by a
/// four-colour colour block.
pub fn decompress_dxt5(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    decompress_blocks(data, width, height, 16, |block| {
        let alpha = decode_alpha_block(&block[..8]);
        let mut texels = decode_color_block(&block[8..], true);
        for (texel, a) in texels.iter_mut().zip(alpha) {
            texel[3] = a;
        }
        texels
    })
}

fn decompress_blocks<F>(data: &[u8], width: usize, height: usize, block_bytes: usize, decode: F) -> Vec<u8>
where
    F: Fn(&[u8]) -> [[u8; 4]; 16],
{
    let mut output = vec![0u8; width * height * 4];
    let blocks_wide = width.div_ceil(BLOCK_DIM);
    let blocks_high = height.div_ceil(BLOCK_DIM);

    for (index, block) in data
        .chunks_exact(block_bytes)
        .take(blocks_wide * blocks_high)
        .enumerate()
    {
        let bx = (index % blocks_wide) * BLOCK_DIM;
        let by = (index / blocks_wide) * BLOCK_DIM;
        let texels = decode(block);

        for (i, texel) in texels.iter().enumerate() {
            let x = bx + i % BLOCK_DIM;
            let y = by + i / BLOCK_DIM;
            if x < width && y < height {
                let at = (y * width + x) * 4;
                output[at..at + 4].copy_from_slice(texel);
            }
        }
    }
    output
}

fn decode_color_block(block: &[u8], four_color: bool) -> [[u8; 4]; 16] {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);

    let p0 = expand_565(c0);
    let p1 = expand_565(c1);
    let palette = if c0 > c1 || four_color {
        [
            p0,
            p1,
            blend(p0, p1, 2, 1, 3),
            blend(p0, p1, 1, 2, 3),
        ]
    } else {
        [p0, p1, blend(p0, p1, 1, 1, 2), [0, 0, 0, 0]]
    };

    std::array::from_fn(|i| palette[((indices >> (2 * i)) & 0b11) as usize])
}

fn decode_alpha_block(block: &[u8]) -> [u8; 16] {
    let a0 = u32::from(block[0]);
    let a1 = u32::from(block[1]);

    let mut ramp = [0u32; 8];
    ramp[0] = a0;
    ramp[1] = a1;
    if a0 > a1 {
        for i in 1..7 {
            ramp[i + 1] = ((7 - i as u32) * a0 + i as u32 * a1) / 7;
        }
    } else {
        for i in 1..5 {
            ramp[i + 1] = ((5 - i as u32) * a0 + i as u32 * a1) / 5;
        }
        ramp[6] = 0;
        ramp[7] = 255;
    }

    let bits = block[2..8]
        .iter()
        .rev()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
    std::array::from_fn(|i| ramp[((bits >> (3 * i)) & 0b111) as usize] as u8)
}

fn expand_565(color: u16) -> [u8; 4] {
    let r = ((color >> 11) & 0x1F) as u8;
    let g = ((color >> 5) & 0x3F) as u8;
    let b = (color & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2), 255]
}

fn blend(a: [u8; 4], b: [u8; 4], wa: u16, wb: u16, div: u16) -> [u8; 4] {
    let mix = |x: u8, y: u8| ((u16::from(x) * wa + u16::from(y) * wb) / div) as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_red_block() {
        let block = [0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0];
        let pixels = decompress_dxt1(&block, 4, 4, false);
        assert_eq!(pixels.len(), 64);
        for texel in pixels.chunks_exact(4) {
            assert_eq!(texel, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn test_three_color_mode_transparent_black() {
        // color0 < color1 selects three colours; index 3 is transparent black
        let block = [0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let pixels = decompress_dxt1(&block, 4, 4, false);
        assert_eq!(&pixels[..4], [0, 0, 0, 0]);

        let forced = decompress_dxt1(&block, 4, 4, true);
        assert_eq!(&forced[..4], [170, 170, 170, 255]);
    }

    #[test]
    fn test_four_color_interpolation() {
        // white and black, indices 2 and 3 on the first two texels
        let block = [0xFF, 0xFF, 0x00, 0x00, 0b0000_1110, 0, 0, 0];
        let pixels = decompress_dxt1(&block, 4, 4, false);
        assert_eq!(&pixels[..4], [170, 170, 170, 255]);
        assert_eq!(&pixels[4..8], [85, 85, 85, 255]);
    }

    #[test]
    fn test_dxt5_alpha_ramps() {
        let mut block = [0u8; 16];
        block[0] = 255;
        block[1] = 0;
        // texel 0 -> code 1, texel 1 -> code 2
        block[2] = 0b0001_0001;
        block[8..12].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        let pixels = decompress_dxt5(&block, 4, 4);
        assert_eq!(pixels[3], 0);
        assert_eq!(pixels[7], 218);
        assert_eq!(pixels[11], 255);

        // five-step ramp: codes 6 and 7 are literal 0 and 255
        block[0] = 10;
        block[1] = 200;
        block[2] = 0b0011_1110;
        let pixels = decompress_dxt5(&block, 4, 4);
        assert_eq!(pixels[3], 0);
        assert_eq!(pixels[7], 255);
    }

    #[test]
    fn test_partial_block_is_clipped() {
        let block = [0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0];
        let pixels = decompress_dxt1(&block, 2, 2, false);
        assert_eq!(pixels, [255u8, 0, 0, 255].repeat(4));
    }
}
