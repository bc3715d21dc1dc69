//! Little-endian fixed-width read/write helpers.
//!
//! Reads work on byte slices (`ReadExt`), writes work on any `Write + Seek`
//! target so the same code patches a memory-mapped file, a `File` or an
//! in-memory `Cursor`.

use crate::core::address::Offset;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Size in bytes of a dword field.
pub const DWORD_SIZE: usize = 4;

/// Extension trait for reading primitive types from byte slices
pub trait ReadExt {
    fn read_u32_le_at(&self, offset: usize) -> Option<u32>;
    fn read_i32_le_at(&self, offset: usize) -> Option<i32>;
    /// Bytes from `offset` up to (not including) the next NUL.
    fn read_cstring_bytes_at(&self, offset: usize) -> Option<&[u8]>;
}

impl ReadExt for [u8] {
    #[inline(always)]
    fn read_u32_le_at(&self, offset: usize) -> Option<u32> {
        self.get(offset..offset.checked_add(4)?)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
    }

    #[inline(always)]
    fn read_i32_le_at(&self, offset: usize) -> Option<i32> {
        self.get(offset..offset.checked_add(4)?)
            .and_then(|b| b.try_into().ok())
            .map(i32::from_le_bytes)
    }

    fn read_cstring_bytes_at(&self, offset: usize) -> Option<&[u8]> {
        let tail = self.get(offset..)?;
        let len = memchr::memchr(0, tail)?;
        Some(&tail[..len])
    }
}

/// Read `count` bytes at `offset`.
pub fn read_bytes<R: Read + Seek>(reader: &mut R, offset: Offset, count: usize) -> io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset.value()))?;
    let mut buf = vec![0u8; count];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Write one dword at the current position.
pub fn write_dword<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Write consecutive dwords starting at `offset`.
pub fn write_dwords<W, I>(writer: &mut W, offset: Offset, values: I) -> io::Result<usize>
where
    W: Write + Seek,
    I: IntoIterator<Item = u32>,
{
    writer.seek(SeekFrom::Start(offset.value()))?;
    let mut written = 0;
    for value in values {
        write_dword(writer, value)?;
        written += 1;
    }
    Ok(written)
}

/// Write `bytes` at `offset`, right-padded with NUL up to `new_len`.
///
/// `new_len` smaller than `bytes.len()` is rejected rather than truncating.
pub fn write_string<W: Write + Seek>(
    writer: &mut W,
    offset: Offset,
    bytes: &[u8],
    new_len: usize,
) -> io::Result<()> {
    if bytes.len() > new_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} bytes do not fit in {} byte field", bytes.len(), new_len),
        ));
    }
    let mut padded = Vec::with_capacity(new_len);
    padded.extend_from_slice(bytes);
    padded.resize(new_len, 0);
    writer.seek(SeekFrom::Start(offset.value()))?;
    writer.write_all(&padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn dword_and_string_roundtrip_through_cursor() {
        let mut cur = Cursor::new(Vec::new());
        write_dword(&mut cur, 0xDEAD_BEEF).unwrap();
        write_string(&mut cur, Offset(4), b"1234", 5).unwrap();
        assert_eq!(
            read_bytes(&mut cur, Offset(0), 9).unwrap(),
            b"\xef\xbe\xad\xde1234\x00"
        );
    }

    #[test]
    fn write_string_pads_and_refuses_overflow() {
        let mut cur = Cursor::new(vec![0xAAu8; 8]);
        write_string(&mut cur, Offset(1), b"ab", 4).unwrap();
        assert_eq!(cur.get_ref().as_slice(), b"\xaaab\0\0\xaa\xaa\xaa");
        assert!(write_string(&mut cur, Offset(0), b"abcdef", 3).is_err());
    }

    #[test]
    fn write_dwords_at_offset() {
        let mut cur = Cursor::new(vec![0u8; 12]);
        let n = write_dwords(&mut cur, Offset(4), [0x410, 0x411]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(&cur.get_ref()[4..12], b"\x10\x04\0\0\x11\x04\0\0");
    }

    #[test]
    fn read_ext_bounds() {
        let data = [0xFCu8, 0xFF, 0xFF, 0xFF, b'h', b'i', 0];
        assert_eq!(data.read_i32_le_at(0), Some(-4));
        assert_eq!(data.read_u32_le_at(4), None);
        assert_eq!(data.read_cstring_bytes_at(4), Some(&b"hi"[..]));
        assert_eq!(data.read_cstring_bytes_at(7), None);
        assert_eq!(data.read_i32_le_at(usize::MAX), None);
    }
}
