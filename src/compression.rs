//! GZip/ZLib framing around the wire codec: applying and detecting a
//! compression codec, leaving the codec implementation itself to
//! `flate2`.
//!
//! A small enum naming the framing, and thin wrappers that hand a
//! decompressed/to-be-compressed stream to the caller.

use std::io::{self, Read, Write};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

/// Which compression framing wraps a stream of NBT bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// No framing; raw NBT bytes.
    None,
    /// RFC 1952 GZip framing.
    GZip,
    /// RFC 1950 ZLib framing (DEFLATE with an Adler-32 footer).
    ZLib,
}

/// Peeks at the first two bytes of `reader` to detect GZip (`1f 8b`) or
/// ZLib (`78 ..`) magic, without consuming them — the returned reader
/// replays the peeked bytes ahead of the rest of the stream.
pub fn detect<R: Read>(mut reader: R) -> io::Result<(Codec, impl Read)> {
    let mut magic = [0u8; 2];
    let n = read_fill(&mut reader, &mut magic)?;
    let codec = if n == 2 && magic[0] == 0x1f && magic[1] == 0x8b {
        Codec::GZip
    } else if n >= 1 && magic[0] == 0x78 {
        Codec::ZLib
    } else {
        Codec::None
    };
    Ok((codec, io::Cursor::new(magic[..n].to_vec()).chain(reader)))
}

fn read_fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Wraps `reader` to transparently decompress according to `codec`.
pub fn decoding_reader<'r, R: Read + 'r>(
    reader: R,
    codec: Codec,
) -> Box<dyn Read + 'r> {
    match codec {
        Codec::None => Box::new(reader),
        Codec::GZip => Box::new(GzDecoder::new(reader)),
        Codec::ZLib => Box::new(ZlibDecoder::new(reader)),
    }
}

/// Wraps `writer` to transparently compress according to `codec`, at the
/// default compression level. The returned writer must be finished (its
/// `Write` impl flushed and dropped, or `finish()` called through
/// `flate2`'s own API) for trailing footer bytes to be emitted.
pub fn encoding_writer<'w, W: Write + 'w>(
    writer: W,
    codec: Codec,
) -> Box<dyn Write + 'w> {
    match codec {
        Codec::None => Box::new(writer),
        Codec::GZip => Box::new(GzEncoder::new(writer, Compression::default())),
        Codec::ZLib => Box::new(ZlibEncoder::new(writer, Compression::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn gzip_round_trips_through_detect() {
        let mut compressed = Vec::new();
        {
            let mut encoder = encoding_writer(&mut compressed, Codec::GZip);
            encoder.write_all(b"hello nbt").unwrap();
        }
        let (codec, mut reader) = detect(Cursor::new(compressed)).unwrap();
        assert_eq!(codec, Codec::GZip);
        let mut decompressed = Vec::new();
        let mut decoder = decoding_reader(&mut reader, codec);
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, b"hello nbt");
    }

    #[test]
    fn zlib_round_trips_through_detect() {
        let mut compressed = Vec::new();
        {
            let mut encoder = encoding_writer(&mut compressed, Codec::ZLib);
            encoder.write_all(b"hello nbt").unwrap();
        }
        let (codec, mut reader) = detect(Cursor::new(compressed)).unwrap();
        assert_eq!(codec, Codec::ZLib);
        let mut decompressed = Vec::new();
        let mut decoder = decoding_reader(&mut reader, codec);
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, b"hello nbt");
    }

    #[test]
    fn uncompressed_data_is_detected_as_none() {
        let (codec, _reader) = detect(Cursor::new(vec![0x0a, 0x00, 0x00, 0x00])).unwrap();
        assert_eq!(codec, Codec::None);
    }
}
