//! The wire codec shared by the tree reader/writer and the pull reader/push
//! writer: endianness-aware primitive reads and writes, length-prefixed
//! strings, and a chunked bulk-byte writer. Standalone functions
//! parameterized over [`Endian`] so the pull reader and push writer can
//! share them without depending on the tree types.

use std::io::{Read, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{digest_io, NbtError, NbtResult};

/// Maximum length of a single `write_bytes` syscall-backed chunk, bounded
/// by an internal maximum to keep any one write bounded (~4 MiB).
pub const MAX_WRITE_CHUNK: usize = 4 * 1024 * 1024;

/// Wire byte order. Big-endian is the NBT default; little-endian is
/// selectable at reader/writer construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Default for Endian {
    fn default() -> Self {
        Endian::Big
    }
}

pub fn read_u8<R: Read>(reader: &mut R) -> NbtResult<u8> {
    digest_io(reader.read_u8())
}

pub fn read_i8<R: Read>(reader: &mut R) -> NbtResult<i8> {
    digest_io(reader.read_i8())
}

pub fn read_i16<R: Read>(reader: &mut R, endian: Endian) -> NbtResult<i16> {
    match endian {
        Endian::Big => digest_io(reader.read_i16::<BigEndian>()),
        Endian::Little => digest_io(reader.read_i16::<LittleEndian>()),
    }
}

pub fn read_i32<R: Read>(reader: &mut R, endian: Endian) -> NbtResult<i32> {
    match endian {
        Endian::Big => digest_io(reader.read_i32::<BigEndian>()),
        Endian::Little => digest_io(reader.read_i32::<LittleEndian>()),
    }
}

pub fn read_i64<R: Read>(reader: &mut R, endian: Endian) -> NbtResult<i64> {
    match endian {
        Endian::Big => digest_io(reader.read_i64::<BigEndian>()),
        Endian::Little => digest_io(reader.read_i64::<LittleEndian>()),
    }
}

pub fn read_f32<R: Read>(reader: &mut R, endian: Endian) -> NbtResult<f32> {
    match endian {
        Endian::Big => digest_io(reader.read_f32::<BigEndian>()),
        Endian::Little => digest_io(reader.read_f32::<LittleEndian>()),
    }
}

pub fn read_f64<R: Read>(reader: &mut R, endian: Endian) -> NbtResult<f64> {
    match endian {
        Endian::Big => digest_io(reader.read_f64::<BigEndian>()),
        Endian::Little => digest_io(reader.read_f64::<LittleEndian>()),
    }
}

/// Reads a `u16` length-prefixed UTF-8 string.
///
/// The length is read as an unsigned 16-bit integer; negative lengths
/// cannot occur at that width, but invalid UTF-8 in the payload raises
/// [`NbtError::Malformed`]. Rust strings are always valid UTF-8, so no
/// stateful streaming decoder is needed — `String::from_utf8` either
/// succeeds outright or the bytes were never a valid string to begin
/// with.
pub fn read_string<R: Read>(reader: &mut R, endian: Endian) -> NbtResult<String> {
    let length = match endian {
        Endian::Big => digest_io(reader.read_u16::<BigEndian>())?,
        Endian::Little => digest_io(reader.read_u16::<LittleEndian>())?,
    } as usize;

    let mut buffer = vec![0u8; length];
    reader
        .read_exact(&mut buffer)
        .map_err(|_| NbtError::Truncated { while_reading: "string".to_string() })?;

    String::from_utf8(buffer).map_err(|_| NbtError::Malformed {
        reason: "string payload was not valid UTF-8".to_string(),
    })
}

/// Consumes and discards `n` bytes without materializing them, used by the
/// pull reader to skip filtered-out payloads on non-seekable transports.
pub fn skip<R: Read>(reader: &mut R, n: u64) -> NbtResult<()> {
    let mut remaining = n;
    let mut buffer = [0u8; 4096];
    while remaining > 0 {
        let chunk = remaining.min(buffer.len() as u64) as usize;
        reader
            .read_exact(&mut buffer[..chunk])
            .map_err(|_| NbtError::Truncated { while_reading: "skipped payload".to_string() })?;
        remaining -= chunk as u64;
    }
    Ok(())
}

pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> NbtResult<()> {
    digest_io(writer.write_u8(value))
}

pub fn write_i8<W: Write>(writer: &mut W, value: i8) -> NbtResult<()> {
    digest_io(writer.write_i8(value))
}

pub fn write_i16<W: Write>(writer: &mut W, value: i16, endian: Endian) -> NbtResult<()> {
    match endian {
        Endian::Big => digest_io(writer.write_i16::<BigEndian>(value)),
        Endian::Little => digest_io(writer.write_i16::<LittleEndian>(value)),
    }
}

pub fn write_i32<W: Write>(writer: &mut W, value: i32, endian: Endian) -> NbtResult<()> {
    match endian {
        Endian::Big => digest_io(writer.write_i32::<BigEndian>(value)),
        Endian::Little => digest_io(writer.write_i32::<LittleEndian>(value)),
    }
}

pub fn write_i64<W: Write>(writer: &mut W, value: i64, endian: Endian) -> NbtResult<()> {
    match endian {
        Endian::Big => digest_io(writer.write_i64::<BigEndian>(value)),
        Endian::Little => digest_io(writer.write_i64::<LittleEndian>(value)),
    }
}

pub fn write_f32<W: Write>(writer: &mut W, value: f32, endian: Endian) -> NbtResult<()> {
    match endian {
        Endian::Big => digest_io(writer.write_f32::<BigEndian>(value)),
        Endian::Little => digest_io(writer.write_f32::<LittleEndian>(value)),
    }
}

pub fn write_f64<W: Write>(writer: &mut W, value: f64, endian: Endian) -> NbtResult<()> {
    match endian {
        Endian::Big => digest_io(writer.write_f64::<BigEndian>(value)),
        Endian::Little => digest_io(writer.write_f64::<LittleEndian>(value)),
    }
}

/// Writes a `u16` length-prefixed UTF-8 string. Fails if the UTF-8 byte
/// length exceeds 32767.
pub fn write_string<W: Write>(writer: &mut W, value: &str, endian: Endian) -> NbtResult<()> {
    let bytes = value.as_bytes();
    if bytes.len() > i16::MAX as usize {
        return Err(NbtError::InvalidArgument {
            message: format!(
                "string is {} UTF-8 bytes, exceeding the 32767-byte NBT limit",
                bytes.len()
            ),
        });
    }
    match endian {
        Endian::Big => digest_io(writer.write_u16::<BigEndian>(bytes.len() as u16))?,
        Endian::Little => digest_io(writer.write_u16::<LittleEndian>(bytes.len() as u16))?,
    }
    write_bytes(writer, bytes)
}

/// Writes `buffer` in chunks bounded by [`MAX_WRITE_CHUNK`], keeping
/// per-call memory predictable and playing nicely with buffered streams.
pub fn write_bytes<W: Write>(writer: &mut W, buffer: &[u8]) -> NbtResult<()> {
    for chunk in buffer.chunks(MAX_WRITE_CHUNK) {
        digest_io(writer.write_all(chunk))?;
    }
    Ok(())
}

/// Converts an array of big-endian-on-the-wire `i32`s to native values; used
/// by readers operating on an already-buffered slice (e.g. list-as-array
/// fast paths).
pub fn decode_i32_be(bytes: &[u8]) -> i32 {
    BigEndian::read_i32(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn primitive_round_trip_is_identity() {
        for endian in [Endian::Big, Endian::Little] {
            let mut buf = Vec::new();
            write_i16(&mut buf, -1234, endian).unwrap();
            write_i32(&mut buf, 123_456_789, endian).unwrap();
            write_i64(&mut buf, -9_000_000_000_000, endian).unwrap();
            write_f32(&mut buf, 3.5, endian).unwrap();
            write_f64(&mut buf, -2.25, endian).unwrap();

            let mut cursor = Cursor::new(buf);
            assert_eq!(read_i16(&mut cursor, endian).unwrap(), -1234);
            assert_eq!(read_i32(&mut cursor, endian).unwrap(), 123_456_789);
            assert_eq!(read_i64(&mut cursor, endian).unwrap(), -9_000_000_000_000);
            assert_eq!(read_f32(&mut cursor, endian).unwrap(), 3.5);
            assert_eq!(read_f64(&mut cursor, endian).unwrap(), -2.25);
        }
    }

    #[test]
    fn string_round_trip() {
        let mut buf = Vec::new();
        write_string(&mut buf, "hello world", Endian::Big).unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_string(&mut cursor, Endian::Big).unwrap(), "hello world");
    }

    #[test]
    fn string_too_long_is_rejected() {
        let long = "x".repeat(32768);
        let mut buf = Vec::new();
        let err = write_string(&mut buf, &long, Endian::Big).unwrap_err();
        assert!(matches!(err, NbtError::InvalidArgument { .. }));
    }

    #[test]
    fn truncated_string_payload_errors() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&10u16.to_be_bytes());
        buf.extend_from_slice(b"short");
        let mut cursor = Cursor::new(buf);
        let err = read_string(&mut cursor, Endian::Big).unwrap_err();
        assert!(matches!(err, NbtError::Truncated { .. }));
    }

    #[test]
    fn skip_consumes_exact_byte_count() {
        let mut cursor = Cursor::new(vec![0u8; 100]);
        skip(&mut cursor, 60).unwrap();
        assert_eq!(cursor.position(), 60);
        assert_eq!(read_u8(&mut cursor).unwrap(), 0);
    }
}
