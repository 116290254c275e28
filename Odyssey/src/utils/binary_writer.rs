//! Typed primitive writes over a seekable byte sink

use std::io::{Seek, SeekFrom, Write};
use std::marker::PhantomData;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};

/// Writer mirroring [`BinaryReader`](super::BinaryReader).
///
/// Seeking past the end of a `Cursor<Vec<u8>>` and writing zero-fills the gap,
/// which the two-pass encoders rely on when a section is written out of order.
pub struct BinaryWriter<W, E = LittleEndian> {
    inner: W,
    _order: PhantomData<E>,
}

impl<W: Write + Seek> BinaryWriter<W, LittleEndian> {
    pub fn new(inner: W) -> Self {
        Self::with_byte_order(inner)
    }
}

impl<W: Write + Seek, E: ByteOrder> BinaryWriter<W, E> {
    pub fn with_byte_order(inner: W) -> Self {
        Self {
            inner,
            _order: PhantomData,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        Ok(self.inner.write_u8(value)?)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        Ok(self.inner.write_i8(value)?)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        Ok(self.inner.write_u16::<E>(value)?)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        Ok(self.inner.write_i16::<E>(value)?)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        Ok(self.inner.write_u32::<E>(value)?)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        Ok(self.inner.write_i32::<E>(value)?)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        Ok(self.inner.write_u64::<E>(value)?)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        Ok(self.inner.write_i64::<E>(value)?)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        Ok(self.inner.write_f32::<E>(value)?)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        Ok(self.inner.write_f64::<E>(value)?)
    }

    pub fn write_f32_slice(&mut self, values: &[f32]) -> Result<()> {
        for &value in values {
            self.write_f32(value)?;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        Ok(self.inner.write_all(bytes)?)
    }

    pub fn write_zeros(&mut self, count: usize) -> Result<()> {
        self.write_bytes(&vec![0u8; count])
    }

    /// Write `text` into a fixed `count`-byte slot, padded with NULs.
    pub fn write_fixed_string(&mut self, text: &str, count: usize) -> Result<()> {
        let bytes = text.as_bytes();
        if bytes.len() > count {
            return Err(Error::InvalidInput(format!(
                "string {text:?} does not fit in {count} bytes"
            )));
        }
        self.write_bytes(bytes)?;
        self.write_zeros(count - bytes.len())
    }

    pub fn write_c_string(&mut self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes())?;
        self.write_u8(0)
    }

    /// Pad with zeros up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: u64) -> Result<()> {
        let position = self.tell()?;
        let padding = (alignment - position % alignment) % alignment;
        self.write_zeros(padding as usize)
    }

    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Overwrite a previously reserved `u32` slot, keeping the current position.
    pub fn write_u32_at(&mut self, position: u64, value: u32) -> Result<()> {
        let current = self.tell()?;
        self.seek(position)?;
        self.write_u32(value)?;
        self.seek(current)
    }

    /// Reserve a `u32` slot and return its position for [`Self::write_u32_at`].
    pub fn reserve_u32(&mut self) -> Result<u64> {
        let position = self.tell()?;
        self.write_u32(0)?;
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    #[test]
    fn test_fixed_string_padding() {
        let mut writer = BinaryWriter::new(Cursor::new(Vec::new()));
        writer.write_fixed_string("NULL", 8).unwrap();
        assert_eq!(writer.into_inner().into_inner(), b"NULL\0\0\0\0");
    }

    #[test]
    fn test_fixed_string_overflow() {
        let mut writer = BinaryWriter::new(Cursor::new(Vec::new()));
        let err = writer.write_fixed_string("much_too_long", 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_seek_past_end_zero_fills() {
        let mut writer = BinaryWriter::new(Cursor::new(Vec::new()));
        writer.seek(4).unwrap();
        writer.write_u16(0x0102).unwrap();
        assert_eq!(writer.into_inner().into_inner(), vec![0, 0, 0, 0, 2, 1]);
    }

    #[test]
    fn test_reserve_and_patch() {
        let mut writer = BinaryWriter::new(Cursor::new(Vec::new()));
        writer.write_u8(9).unwrap();
        let slot = writer.reserve_u32().unwrap();
        writer.write_u8(7).unwrap();
        writer.write_u32_at(slot, 0x0403_0201).unwrap();
        writer.write_u8(5).unwrap();
        assert_eq!(writer.into_inner().into_inner(), vec![9, 1, 2, 3, 4, 7, 5]);
    }
}
