//! Low-level RIFF chunk/list writing primitives.
//!
//! RIFF files are made of tagged, length-prefixed records:
//! - chunk: 4-byte FourCC + 4-byte little-endian size + payload (+ pad byte)
//! - list:  "LIST" + 4-byte size + 4-byte list type + nested records
//!
//! Sizes count the bytes *following* the size field. A chunk whose payload has
//! odd length is followed by one zero pad byte that is not part of its size.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Seek, SeekFrom, Write};

use crate::avi::error::{AviError, AviResult};

/// A four character code.
pub type FourCc = [u8; 4];

pub const RIFF: FourCc = *b"RIFF";
pub const LIST: FourCc = *b"LIST";

/// Size in bytes of a chunk header (FourCC + size).
pub const CHUNK_HEADER_LEN: u64 = 8;

/// Convert a stream offset or size to a 32-bit RIFF field.
pub fn to_u32(field: &'static str, value: u64) -> AviResult<u32> {
    u32::try_from(value).map_err(|_| AviError::SizeOverflow { field, value })
}

/// Write a u32 placeholder and return its stream position.
pub fn size_placeholder<W: Write + Seek>(writer: &mut W) -> AviResult<u64> {
    let pos = writer.stream_position()?;
    writer.write_u32::<LittleEndian>(0)?;
    Ok(pos)
}

/// Overwrite the u32 at `pos`, then return to `resume_at`.
pub fn patch_u32<W: Write + Seek>(
    writer: &mut W,
    pos: u64,
    value: u32,
    resume_at: u64,
) -> AviResult<()> {
    writer.seek(SeekFrom::Start(pos))?;
    writer.write_u32::<LittleEndian>(value)?;
    writer.seek(SeekFrom::Start(resume_at))?;
    Ok(())
}

/// Patch the size field at `size_pos` with the number of bytes between the
/// end of that field and the current position.
fn fill_size<W: Write + Seek>(
    writer: &mut W,
    size_pos: u64,
    field: &'static str,
) -> AviResult<u32> {
    let end = writer.stream_position()?;
    let size = to_u32(field, end - size_pos - 4)?;
    patch_u32(writer, size_pos, size, end)?;
    Ok(size)
}

/// Write a chunk whose payload is produced by `body`; the size is patched
/// after the body runs and an odd payload is padded to even.
pub fn write_chunk<W, F>(writer: &mut W, fourcc: FourCc, body: F) -> AviResult<()>
where
    W: Write + Seek,
    F: FnOnce(&mut W) -> AviResult<()>,
{
    writer.write_all(&fourcc)?;
    let size_pos = size_placeholder(writer)?;
    body(writer)?;
    let size = fill_size(writer, size_pos, "chunk size")?;
    if size % 2 != 0 {
        writer.write_u8(0)?;
    }
    Ok(())
}

/// Write a LIST of `list_type` whose children are produced by `body`.
pub fn write_list<W, F>(writer: &mut W, list_type: FourCc, body: F) -> AviResult<()>
where
    W: Write + Seek,
    F: FnOnce(&mut W) -> AviResult<()>,
{
    writer.write_all(&LIST)?;
    let size_pos = size_placeholder(writer)?;
    writer.write_all(&list_type)?;
    body(writer)?;
    fill_size(writer, size_pos, "list size")?;
    Ok(())
}

/// Record the position of the next field, then write its placeholder value.
pub fn deferred_u32<W: Write + Seek>(writer: &mut W, initial: u32) -> AviResult<u64> {
    let pos = writer.stream_position()?;
    writer.write_u32::<LittleEndian>(initial)?;
    Ok(pos)
}

/// Bytes a chunk with `payload_len` bytes occupies on disk.
pub fn padded_chunk_len(payload_len: u64) -> u64 {
    CHUNK_HEADER_LEN + payload_len + payload_len % 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ByteOrder;
    use std::io::Cursor;

    #[test]
    fn chunk_size_excludes_header_and_pad() {
        let mut cursor = Cursor::new(Vec::new());
        write_chunk(&mut cursor, *b"test", |w| {
            w.write_all(&[1, 2, 3])?;
            Ok(())
        })
        .unwrap();

        let bytes = cursor.into_inner();
        assert_eq!(&bytes[0..4], b"test");
        assert_eq!(LittleEndian::read_u32(&bytes[4..8]), 3);
        assert_eq!(&bytes[8..11], &[1, 2, 3]);
        assert_eq!(bytes[11], 0);
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn even_chunk_has_no_pad() {
        let mut cursor = Cursor::new(Vec::new());
        write_chunk(&mut cursor, *b"even", |w| {
            w.write_all(&[9; 4])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(cursor.into_inner().len(), 12);
    }

    #[test]
    fn list_size_covers_type_and_children() {
        let mut cursor = Cursor::new(Vec::new());
        write_list(&mut cursor, *b"hdrl", |w| {
            write_chunk(w, *b"abcd", |w| {
                w.write_u32::<LittleEndian>(7)?;
                Ok(())
            })
        })
        .unwrap();

        let bytes = cursor.into_inner();
        assert_eq!(&bytes[0..4], b"LIST");
        // "hdrl" + 8-byte chunk header + 4-byte payload
        assert_eq!(LittleEndian::read_u32(&bytes[4..8]), 16);
        assert_eq!(&bytes[8..12], b"hdrl");
        assert_eq!(bytes.len(), 20);
    }

    #[test]
    fn patch_restores_position() {
        let mut cursor = Cursor::new(Vec::new());
        let pos = deferred_u32(&mut cursor, 0).unwrap();
        cursor.write_all(&[0xAA; 4]).unwrap();
        let end = cursor.stream_position().unwrap();

        patch_u32(&mut cursor, pos, 0xDEAD_BEEF, end).unwrap();
        assert_eq!(cursor.stream_position().unwrap(), end);
        assert_eq!(LittleEndian::read_u32(&cursor.get_ref()[0..4]), 0xDEAD_BEEF);
    }

    #[test]
    fn to_u32_rejects_large_values() {
        assert_eq!(to_u32("riff size", 42).unwrap(), 42);
        assert!(matches!(
            to_u32("riff size", u32::MAX as u64 + 1),
            Err(AviError::SizeOverflow { .. })
        ));
    }

    #[test]
    fn padded_chunk_len_rounds_to_even() {
        assert_eq!(padded_chunk_len(24), 32);
        assert_eq!(padded_chunk_len(5), 14);
    }
}
