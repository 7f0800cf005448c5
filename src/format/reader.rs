//! Cursor-based binary reader over an in-memory buffer.
//!
//! All multi-byte values are little endian. Every read is bounds-checked and
//! fails with [`Error::UnexpectedEof`] instead of panicking.

use std::mem::size_of;

use byteorder::{ByteOrder, LittleEndian};

use crate::util::{Error, Quat, Result, Vec2, Vec3};

/// Strip trailing NUL padding and decode as UTF-8.
fn bytes_to_string(bytes: &[u8]) -> Result<String> {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    Ok(String::from_utf8(bytes[..end].to_vec())?)
}

/// Binary reader with a monotonically advancing cursor.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    /// Current cursor position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.cursor
    }

    /// Total buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the underlying buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.cursor)
    }

    /// True once the cursor has reached the end of the buffer.
    #[inline]
    pub fn eof(&self) -> bool {
        self.cursor >= self.bytes.len()
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::UnexpectedEof {
                offset: self.cursor,
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = self.bytes;
        let slice = &bytes[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    /// Borrow everything after the cursor.
    pub fn read_to_end(&mut self) -> &'a [u8] {
        let bytes = self.bytes;
        let slice = &bytes[self.cursor.min(bytes.len())..];
        self.cursor = bytes.len();
        slice
    }

    /// Advance the cursor by `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    #[inline]
    fn read_array_n<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array_n::<1>()?[0])
    }

    /// Single-byte boolean; any non-zero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(&self.read_array_n::<2>()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(&self.read_array_n::<2>()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(&self.read_array_n::<4>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(&self.read_array_n::<4>()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(&self.read_array_n::<4>()?))
    }

    /// Read an i32 length and reject negative values.
    pub fn read_len(&mut self) -> Result<usize> {
        let offset = self.cursor;
        let len = self.read_i32()?;
        usize::try_from(len)
            .map_err(|_| Error::invalid(format!("negative length {len} at offset {offset}")))
    }

    /// Read `len` bytes as text with trailing NUL padding removed.
    pub fn read_fixed_string(&mut self, len: usize) -> Result<String> {
        bytes_to_string(self.read_bytes(len)?)
    }

    /// Read an i32 length followed by that many bytes of text.
    pub fn read_fstring(&mut self) -> Result<String> {
        let len = self.read_len()?;
        self.read_fixed_string(len)
    }

    /// Read `K` consecutive f32 values.
    pub fn read_f32s<const K: usize>(&mut self) -> Result<[f32; K]> {
        let mut out = [0f32; K];
        for v in &mut out {
            *v = self.read_f32()?;
        }
        Ok(out)
    }

    /// Read `K` consecutive u32 values.
    pub fn read_u32s<const K: usize>(&mut self) -> Result<[u32; K]> {
        let mut out = [0u32; K];
        for v in &mut out {
            *v = self.read_u32()?;
        }
        Ok(out)
    }

    /// Read `K` consecutive bytes.
    pub fn read_u8s<const K: usize>(&mut self) -> Result<[u8; K]> {
        self.read_array_n::<K>()
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::from_array(self.read_f32s::<2>()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::from_array(self.read_f32s::<3>()?))
    }

    /// Read a quaternion stored as `x, y, z, w`.
    pub fn read_quat(&mut self) -> Result<Quat> {
        Ok(Quat::from_array(self.read_f32s::<4>()?))
    }

    /// Decode `count` elements with `decode`.
    pub fn read_array<T, F>(&mut self, count: usize, mut decode: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        // Preallocation never exceeds the bytes left in the buffer.
        let mut out = Vec::with_capacity(count.min(self.remaining() / size_of::<T>().max(1)));
        for _ in 0..count {
            out.push(decode(self)?);
        }
        Ok(out)
    }

    /// Read an i32 element count, then that many elements.
    pub fn read_bulk_array<T, F>(&mut self, decode: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let count = self.read_len()?;
        self.read_array(count, decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_little_endian() {
        let bytes = [
            0x01, // bool
            0xFE, 0xFF, // i16 -2
            0x04, 0x03, 0x02, 0x01, // u32
            0x00, 0x00, 0x80, 0x3F, // f32 1.0
        ];
        let mut r = ByteReader::new(&bytes);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_i16().unwrap(), -2);
        assert_eq!(r.read_u32().unwrap(), 0x01020304);
        assert_eq!(r.read_f32().unwrap(), 1.0);
        assert!(r.eof());
    }

    #[test]
    fn test_eof_reports_offset() {
        let mut r = ByteReader::new(&[1, 2, 3]);
        r.skip(1).unwrap();
        let err = r.read_u32().unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { offset: 1, needed: 4, available: 2 }));
        // A failed read does not move the cursor.
        assert_eq!(r.pos(), 1);
    }

    #[test]
    fn test_fixed_string_strips_padding() {
        let mut r = ByteReader::new(b"ROOT\0\0\0\0rest");
        assert_eq!(r.read_fixed_string(8).unwrap(), "ROOT");
        assert_eq!(r.remaining(), 4);
    }

    #[test]
    fn test_fstring() {
        let mut bytes = 6i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"pelvis");
        bytes.extend_from_slice(&0i32.to_le_bytes());
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_fstring().unwrap(), "pelvis");
        assert_eq!(r.read_fstring().unwrap(), "");
        assert!(r.eof());
    }

    #[test]
    fn test_negative_length_rejected() {
        let bytes = (-1i32).to_le_bytes();
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(r.read_fstring(), Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_bulk_array() {
        let mut bytes = 3i32.to_le_bytes().to_vec();
        for v in [10u32, 20, 30] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut r = ByteReader::new(&bytes);
        let values = r.read_bulk_array(|r| r.read_u32()).unwrap();
        assert_eq!(values, vec![10, 20, 30]);
    }

    #[test]
    fn test_bulk_array_truncated() {
        // Claims a billion elements but carries one.
        let mut bytes = 1_000_000_000i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        let mut r = ByteReader::new(&bytes);
        let err = r.read_bulk_array(|r| r.read_u32()).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }));
    }

    #[test]
    fn test_large_elements_with_corrupt_count() {
        // 1 MiB of data claiming 2^20 records of 4 KiB each.
        let bytes = vec![0u8; 1 << 20];
        let mut r = ByteReader::new(&bytes);
        let err = r.read_array(1 << 20, |r| r.read_u8s::<4096>()).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { offset, .. } if offset == 1 << 20));
    }

    #[test]
    fn test_vectors() {
        let mut bytes = Vec::new();
        for v in [1.0f32, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&[255, 128, 0, 64]);
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_vec3().unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(r.read_quat().unwrap(), Quat::IDENTITY);
        assert_eq!(r.read_u8s::<4>().unwrap(), [255, 128, 0, 64]);
    }
}
