//! File-and-stream façade tying the tree reader/writer to compression
//! auto-detection.
//!
//! A load/save pair per codec, plus path-based convenience wrappers for
//! the common case of "just read/write this file".

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::compression::{self, Codec};
use crate::config::{ReaderOptions, WriterOptions};
use crate::error::NbtResult;
use crate::reader::{self, Selector};
use crate::tag::Tag;
use crate::writer;

/// Reads a full document from `reader`, auto-detecting GZip/ZLib framing
/// by magic byte before handing the (possibly decompressed) stream to the
/// tree reader.
pub fn load<R: Read>(reader: R, options: &ReaderOptions) -> NbtResult<(String, Tag)> {
    load_filtered(reader, options, None)
}

/// Like [`load`], but prunes subtrees `selector` rejects, applied during
/// tree load.
pub fn load_filtered<R: Read>(
    reader: R,
    options: &ReaderOptions,
    selector: Option<&Selector>,
) -> NbtResult<(String, Tag)> {
    let (codec, peeked) = compression::detect(reader)?;
    log::debug!("nbtwire: loading document, detected codec {:?}", codec);
    let mut decoded = compression::decoding_reader(peeked, codec);
    reader::read_root_filtered(&mut decoded, options, selector)
}

/// Writes a full document to `writer`, wrapping it in `codec`'s framing
/// first. `Codec::None` writes raw NBT bytes.
pub fn save<W: Write>(
    writer: W,
    name: &str,
    root: &Tag,
    codec: Codec,
    options: &WriterOptions,
) -> NbtResult<()> {
    log::debug!("nbtwire: saving document with codec {:?}", codec);
    let mut encoded = compression::encoding_writer(writer, codec);
    writer::write_root(&mut encoded, name, root, options)?;
    encoded.flush().map_err(Into::into)
}

/// Loads a document from a path, auto-detecting compression, buffered
/// through [`ReaderOptions::buffer_size`].
pub fn load_file<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> NbtResult<(String, Tag)> {
    let path = path.as_ref();
    log::info!("nbtwire: loading {}", path.display());
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(options.buffer_size, file);
    load(reader, options)
}

/// Like [`load_file`], but prunes subtrees `selector` rejects.
pub fn load_file_filtered<P: AsRef<Path>>(
    path: P,
    options: &ReaderOptions,
    selector: Option<&Selector>,
) -> NbtResult<(String, Tag)> {
    let path = path.as_ref();
    log::info!("nbtwire: loading {}", path.display());
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(options.buffer_size, file);
    load_filtered(reader, options, selector)
}

/// Saves a document to a path with the given compression, buffered through
/// [`WriterOptions::buffer_size`]. The file is created or truncated.
pub fn save_file<P: AsRef<Path>>(
    path: P,
    name: &str,
    root: &Tag,
    codec: Codec,
    options: &WriterOptions,
) -> NbtResult<()> {
    let path = path.as_ref();
    log::info!("nbtwire: saving {}", path.display());
    let file = File::create(path)?;
    let writer = BufWriter::with_capacity(options.buffer_size, file);
    save(writer, name, root, codec, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_through_gzip() {
        let root = Tag::compound();
        root.compound_add("name", Tag::string("Steve")).unwrap();

        let mut buf = Vec::new();
        save(&mut buf, "player", &root, Codec::GZip, &WriterOptions::new()).unwrap();

        let (name, read_back) = load(Cursor::new(buf), &ReaderOptions::new()).unwrap();
        assert_eq!(name, "player");
        assert_eq!(read_back.compound_get("name").unwrap().as_string().unwrap(), "Steve");
    }

    #[test]
    fn round_trips_uncompressed() {
        let root = Tag::compound();
        root.compound_add("age", Tag::byte(9)).unwrap();

        let mut buf = Vec::new();
        save(&mut buf, "", &root, Codec::None, &WriterOptions::new()).unwrap();

        let (name, read_back) = load(Cursor::new(buf), &ReaderOptions::new()).unwrap();
        assert_eq!(name, "");
        assert_eq!(read_back.compound_get("age").unwrap().as_byte().unwrap(), 9);
    }

    #[test]
    fn filtered_load_prunes_a_named_field() {
        let root = Tag::compound();
        root.compound_add("name", Tag::string("Steve")).unwrap();
        root.compound_add("secret", Tag::int(1)).unwrap();

        let mut buf = Vec::new();
        save(&mut buf, "player", &root, Codec::None, &WriterOptions::new()).unwrap();

        let selector: &crate::reader::Selector = &|_ty, name, _parent| name != Some("secret");
        let (_, read_back) =
            load_filtered(Cursor::new(buf), &ReaderOptions::new(), Some(selector)).unwrap();
        assert!(!read_back.compound_contains("secret"));
        assert_eq!(read_back.compound_get("name").unwrap().as_string().unwrap(), "Steve");
    }

    #[test]
    fn round_trips_through_a_real_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("nbtwire-test-{}.dat", std::process::id()));

        let root = Tag::compound();
        root.compound_add("greeting", Tag::string("hi")).unwrap();
        save_file(&path, "doc", &root, Codec::ZLib, &WriterOptions::new()).unwrap();

        let (name, read_back) = load_file(&path, &ReaderOptions::new()).unwrap();
        assert_eq!(name, "doc");
        assert_eq!(read_back.compound_get("greeting").unwrap().as_string().unwrap(), "hi");

        std::fs::remove_file(&path).ok();
    }
}
