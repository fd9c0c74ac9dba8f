//! Read cursor over an immutable byte buffer.
//!
//! The cursor never interprets byte order. Callers fetch fixed-size arrays
//! and decode them with the [`Endian`] their format declared, so the same
//! walk code serves little- and big-endian files.

use crate::error::{Error, Result};

/// Byte order declared by a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl Endian {
    /// Decodes a `u16`
    pub fn u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        }
    }

    /// Decodes a `u32`
    pub fn u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        }
    }

    /// Decodes a `u64`
    pub fn u64(self, bytes: [u8; 8]) -> u64 {
        match self {
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => u64::from_be_bytes(bytes),
        }
    }

    /// Decodes an `i32`
    pub fn i32(self, bytes: [u8; 4]) -> i32 {
        self.u32(bytes) as i32
    }

    /// Decodes a `u16` from the first two bytes of a slice
    ///
    /// Callers guarantee the slice is long enough.
    pub(crate) fn u16_at(self, bytes: &[u8], at: usize) -> u16 {
        self.u16([bytes[at], bytes[at + 1]])
    }

    /// Decodes a `u32` from four bytes of a slice starting at `at`
    pub(crate) fn u32_at(self, bytes: &[u8], at: usize) -> u32 {
        self.u32([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    /// Human-readable name
    pub fn as_str(self) -> &'static str {
        match self {
            Endian::Little => "Little-endian",
            Endian::Big => "Big-endian",
        }
    }
}

/// A file offset taken from the data itself (a pointer, table offset or link)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Offset(pub usize);

impl Offset {
    /// Builds an offset from a 64-bit on-disk value, saturating on 32-bit hosts
    pub fn from_u64(value: u64) -> Self {
        Self(usize::try_from(value).unwrap_or(usize::MAX))
    }

    /// Returns the offset as `usize`
    pub fn get(self) -> usize {
        self.0
    }
}

impl From<u32> for Offset {
    fn from(value: u32) -> Self {
        Self(value as usize)
    }
}

/// Movable read position over a borrowed buffer
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at offset 0
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// The whole buffer
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Current read offset
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total buffer length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true for an empty buffer
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the current position
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Returns true if `n` bytes can be read at the current position
    pub fn has(&self, n: usize) -> bool {
        self.position
            .checked_add(n)
            .is_some_and(|end| end <= self.data.len())
    }

    /// Returns `n` bytes at the current position without advancing
    pub fn read(&self, n: usize) -> Result<&'a [u8]> {
        self.read_at(Offset(self.position), n)
    }

    /// Returns `N` bytes at the current position without advancing
    pub fn read_array<const N: usize>(&self) -> Result<[u8; N]> {
        let bytes = self.read(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Returns `n` bytes at an arbitrary offset
    pub fn read_at(&self, offset: Offset, n: usize) -> Result<&'a [u8]> {
        let start = offset.get();
        start
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .map(|end| &self.data[start..end])
            .ok_or_else(|| Error::underrun(start, n, self.data.len()))
    }

    /// Moves the position forward
    pub fn advance(&mut self, n: usize) {
        self.position = self.position.saturating_add(n);
    }

    /// Moves the position to `position`, which may lie past the end
    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

/// Returns the NUL-terminated string starting at `offset`, lossily decoded
pub(crate) fn c_string_at(data: &[u8], offset: usize) -> Option<String> {
    let tail = data.get(offset..)?;
    let end = tail.iter().position(|&b| b == 0)?;
    Some(String::from_utf8_lossy(&tail[..end]).into_owned())
}

/// Decodes ISO-8859-1 text; every byte maps to the code point of the same value
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endian_decoding() {
        assert_eq!(Endian::Little.u16([0x34, 0x12]), 0x1234);
        assert_eq!(Endian::Big.u16([0x12, 0x34]), 0x1234);
        assert_eq!(Endian::Little.u32([0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
        assert_eq!(Endian::Big.u32([0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
        assert_eq!(Endian::Big.u64([0, 0, 0, 0, 0, 0, 1, 0]), 256);
        assert_eq!(Endian::Big.i32([0xFF, 0xFF, 0xFF, 0xFE]), -2);
    }

    #[test]
    fn test_read_does_not_advance() {
        let cursor = Cursor::new(&[1, 2, 3]);
        assert_eq!(cursor.read(2).unwrap(), &[1, 2]);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_underrun() {
        let mut cursor = Cursor::new(&[1, 2, 3]);
        cursor.advance(2);
        assert!(cursor.has(1));
        assert!(!cursor.has(2));
        assert_eq!(cursor.read(2), Err(Error::underrun(2, 2, 3)));
        assert_eq!(cursor.read_array::<1>().unwrap(), [3]);
    }

    #[test]
    fn test_read_at_overflow() {
        let cursor = Cursor::new(&[0; 4]);
        assert!(cursor.read_at(Offset(usize::MAX), 2).is_err());
        assert!(cursor.read_at(Offset(4), 0).is_ok());
    }

    #[test]
    fn test_position_past_end() {
        let mut cursor = Cursor::new(&[0; 4]);
        cursor.set_position(10);
        assert_eq!(cursor.remaining(), 0);
        assert!(!cursor.has(1));
    }

    #[test]
    fn test_c_string_at() {
        let data = b"\0.text\0.data\0";
        assert_eq!(c_string_at(data, 1).as_deref(), Some(".text"));
        assert_eq!(c_string_at(data, 0).as_deref(), Some(""));
        assert_eq!(c_string_at(data, 40), None);
        assert_eq!(c_string_at(b"abc", 0), None);
    }

    #[test]
    fn test_latin1() {
        assert_eq!(latin1(&[b'a', 0xE9]), "a\u{e9}");
    }
}
