//! Numeric codecs: packed quaternions, Xbox packed normals, float bit casts
//!
//! Both packed forms split a 32-bit word into 11/11/10-bit fields (x in the low
//! bits, z in the top ten).

const MASK_11: u32 = 0x7FF;
const MASK_10: u32 = 0x3FF;

/// Unpack a quantized quaternion into `[x, y, z, w]`.
///
/// `w` is rebuilt from the unit-length constraint and is therefore never negative.
pub fn decompress_quaternion(packed: u32) -> [f32; 4] {
    let x = (packed & MASK_11) as f32 / 1023.0 - 1.0;
    let y = ((packed >> 11) & MASK_11) as f32 / 1023.0 - 1.0;
    let z = (packed >> 22) as f32 / 511.0 - 1.0;
    let w = (1.0 - x * x - y * y - z * z).max(0.0).sqrt();
    [x, y, z, w]
}

/// Pack `[x, y, z, w]` into the 11/11/10 quaternion form. `w` is discarded.
///
/// Callers must negate quaternions with `w < 0` first; the packed form cannot
/// represent them.
pub fn compress_quaternion(quaternion: [f32; 4]) -> u32 {
    let [x, y, z, _] = quaternion;
    let x = quantize_unsigned(x, 1023.0, MASK_11);
    let y = quantize_unsigned(y, 1023.0, MASK_11);
    let z = quantize_unsigned(z, 511.0, MASK_10);
    x | (y << 11) | (z << 22)
}

fn quantize_unsigned(value: f32, divisor: f32, mask: u32) -> u32 {
    let scaled = ((value.clamp(-1.0, 1.0) + 1.0) * divisor).round();
    (scaled as u32).min(mask)
}

/// Unpack an Xbox packed normal into `[x, y, z]`.
pub fn decompress_xbox_normal(packed: u32) -> [f32; 3] {
    [
        decode_signed_field(packed & MASK_11, 11, 1023.0),
        decode_signed_field((packed >> 11) & MASK_11, 11, 1023.0),
        decode_signed_field(packed >> 22, 10, 511.0),
    ]
}

/// Pack a normal into the Xbox 11/11/10 signed form.
pub fn compress_xbox_normal(normal: [f32; 3]) -> u32 {
    let x = encode_signed_field(normal[0], 11, 1023.0);
    let y = encode_signed_field(normal[1], 11, 1023.0);
    let z = encode_signed_field(normal[2], 10, 511.0);
    x | (y << 11) | (z << 22)
}

// Values at or above half range wrap around from the all-ones code.
fn decode_signed_field(field: u32, bits: u32, divisor: f32) -> f32 {
    let half = 1u32 << (bits - 1);
    if field < half {
        field as f32 / divisor
    } else {
        (field as f32 - ((1u32 << bits) - 1) as f32) / divisor
    }
}

fn encode_signed_field(value: f32, bits: u32, divisor: f32) -> u32 {
    let scaled = (value.clamp(-1.0, 1.0) * divisor).round() as i32;
    if scaled >= 0 {
        scaled as u32
    } else {
        (((1i32 << bits) - 1) + scaled) as u32
    }
}

/// Reinterpret the bits of a 32-bit slot as an IEEE-754 float.
pub fn int_bits_to_float(bits: u32) -> f32 {
    f32::from_bits(bits)
}

/// Reinterpret a float as its raw 32-bit pattern.
pub fn float_to_int_bits(value: f32) -> u32 {
    value.to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(q: [f32; 4]) -> [f32; 4] {
        let len = q.iter().map(|c| c * c).sum::<f32>().sqrt();
        q.map(|c| c / len)
    }

    #[test]
    fn test_identity_quaternion() {
        let q = decompress_quaternion(compress_quaternion([0.0, 0.0, 0.0, 1.0]));
        for (a, b) in q.iter().zip([0.0, 0.0, 0.0, 1.0]) {
            assert!((a - b).abs() <= 1.0 / 1023.0, "{q:?}");
        }
    }

    #[test]
    fn test_quaternion_error_bound() {
        let samples = [
            [0.3, -0.2, 0.1, 0.9],
            [0.2, 0.3, -0.1, 0.92],
            [0.1, 0.7, 0.0, 0.7],
            [0.0, 0.0, 0.38268, 0.92388],
        ];
        for sample in samples {
            let q = normalized(sample);
            let back = decompress_quaternion(compress_quaternion(q));
            for i in 0..4 {
                assert!((q[i] - back[i]).abs() <= 1.0 / 1023.0, "{q:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn test_quaternion_known_bits() {
        // All fields at their zero points: x=y=z=-1 clamps out, w rebuilt as 0.
        assert_eq!(decompress_quaternion(0), [-1.0, -1.0, -1.0, 0.0]);
        let packed = 1023 | (1023 << 11) | (511 << 22);
        assert_eq!(decompress_quaternion(packed), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_xbox_normal_signs() {
        assert_eq!(decompress_xbox_normal(1023), [1.0, 0.0, 0.0]);
        assert_eq!(decompress_xbox_normal(1024 << 11), [0.0, -1.0, 0.0]);
        assert_eq!(decompress_xbox_normal(512 << 22), [0.0, 0.0, -1.0]);
        assert_eq!(decompress_xbox_normal(2047), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_xbox_normal_round_trip() {
        let normal = [0.267, -0.534, 0.801];
        let back = decompress_xbox_normal(compress_xbox_normal(normal));
        for i in 0..3 {
            assert!((normal[i] - back[i]).abs() <= 1.0 / 511.0);
        }
    }

    #[test]
    fn test_float_bits() {
        assert_eq!(float_to_int_bits(1.5), 0x3FC0_0000);
        assert_eq!(int_bits_to_float(0x3FC0_0000), 1.5);
    }
}
