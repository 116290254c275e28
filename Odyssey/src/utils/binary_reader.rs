//! Typed primitive reads over a seekable byte source

use std::io::{self, Read, Seek, SeekFrom};
use std::marker::PhantomData;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::error::Result;

/// Reader over a byte buffer or file with a fixed byte order.
///
/// Every Odyssey format is little-endian, so `E` defaults to [`LittleEndian`].
pub struct BinaryReader<R, E = LittleEndian> {
    inner: R,
    _order: PhantomData<E>,
}

impl<R: Read + Seek> BinaryReader<R, LittleEndian> {
    pub fn new(inner: R) -> Self {
        Self::with_byte_order(inner)
    }
}

impl<R: Read + Seek, E: ByteOrder> BinaryReader<R, E> {
    pub fn with_byte_order(inner: R) -> Self {
        Self {
            inner,
            _order: PhantomData,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.inner.read_i8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.inner.read_u16::<E>()?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.inner.read_i16::<E>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.inner.read_u32::<E>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.inner.read_i32::<E>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(self.inner.read_u64::<E>()?)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.inner.read_i64::<E>()?)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(self.inner.read_f32::<E>()?)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(self.inner.read_f64::<E>()?)
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut values = [0.0f32; N];
        for value in &mut values {
            *value = self.read_f32()?;
        }
        Ok(values)
    }

    pub fn read_vec3(&mut self) -> Result<[f32; 3]> {
        self.read_f32_array::<3>()
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; count];
        self.inner.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    pub fn read_magic(&mut self) -> Result<[u8; 4]> {
        let mut magic = [0u8; 4];
        self.inner.read_exact(&mut magic)?;
        Ok(magic)
    }

    /// Read exactly `count` bytes as UTF-8, keeping every byte.
    pub fn read_string(&mut self, count: usize) -> Result<String> {
        let bytes = self.read_bytes(count)?;
        decode_utf8(bytes)
    }

    /// Read exactly `count` bytes as UTF-8, dropping trailing NUL padding.
    pub fn read_fixed_string(&mut self, count: usize) -> Result<String> {
        let bytes = self.read_bytes(count)?;
        let text = decode_utf8(bytes)?;
        Ok(text.trim_end_matches('\0').to_string())
    }

    /// Read a NUL-terminated string, consuming the terminator.
    pub fn read_c_string(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        decode_utf8(bytes)
    }

    /// Read a NUL-terminated string stored in a fixed `count`-byte slot.
    ///
    /// Always consumes the whole slot; bytes after the terminator are skipped.
    pub fn read_c_string_up_to(&mut self, count: usize) -> Result<String> {
        let mut bytes = self.read_bytes(count)?;
        if let Some(end) = bytes.iter().position(|&b| b == 0) {
            bytes.truncate(end);
        }
        decode_utf8(bytes)
    }

    pub fn skip(&mut self, count: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(count as i64))?;
        Ok(())
    }

    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Total length of the underlying stream. Restores the current position.
    pub fn len(&mut self) -> Result<u64> {
        let position = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(end)
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn decode_utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    #[test]
    fn test_primitive_reads() {
        let mut data = Vec::new();
        data.extend_from_slice(&0xBEEFu16.to_le_bytes());
        data.extend_from_slice(&(-2i32).to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());
        let mut reader = BinaryReader::new(Cursor::new(data));
        assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
        assert_eq!(reader.read_i32().unwrap(), -2);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.tell().unwrap(), 10);
    }

    #[test]
    fn test_string_keeps_trailing_nuls() {
        let mut reader = BinaryReader::new(Cursor::new(b"ab\0\0ab\0\0".to_vec()));
        assert_eq!(reader.read_string(4).unwrap(), "ab\0\0");
        assert_eq!(reader.read_fixed_string(4).unwrap(), "ab");
    }

    #[test]
    fn test_c_string_up_to_consumes_slot() {
        let mut data = b"root\0garbage!".to_vec();
        data.push(7);
        let mut reader = BinaryReader::new(Cursor::new(data));
        assert_eq!(reader.read_c_string_up_to(13).unwrap(), "root");
        assert_eq!(reader.read_u8().unwrap(), 7);
    }

    #[test]
    fn test_c_string() {
        let mut reader = BinaryReader::new(Cursor::new(b"abc\0def\0".to_vec()));
        assert_eq!(reader.read_c_string().unwrap(), "abc");
        assert_eq!(reader.read_c_string().unwrap(), "def");
    }

    #[test]
    fn test_short_read_is_io_error() {
        let mut reader = BinaryReader::new(Cursor::new(vec![1u8, 2]));
        let err = reader.read_u32().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_invalid_utf8_is_io_error() {
        let mut reader = BinaryReader::new(Cursor::new(vec![0xFFu8, 0xFE, 0]));
        let err = reader.read_c_string().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
