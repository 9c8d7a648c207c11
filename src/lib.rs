//! # nbtwire
//!
//! A library for reading, writing, and manipulating Named Binary Tag (NBT)
//! data: the structured binary format best known from Minecraft's world
//! saves, player data, and network protocol.
//!
//! ## Key features
//! - A parent-aware [`Tag`] tree with identity-based removal and a
//!   deep-clone constructor separate from its (cheap, handle-aliasing)
//!   [`Clone`] impl.
//! - A [`pull::PullReader`] for walking a document as a stream of tokens,
//!   filtering and skipping subtrees without materializing them.
//! - A [`push::PushWriter`] for emitting well-formed NBT one call at a
//!   time, with structural rules enforced at the call site instead of at
//!   the end.
//! - Big-endian (the NBT default) or little-endian wire framing via
//!   [`config::ReaderOptions`]/[`config::WriterOptions`].
//! - GZip/ZLib compression framing with auto-detection, plus path-based
//!   file load/save convenience in [`file`].
//! - Optional `serde` support for serializing/deserializing arbitrary
//!   Rust types through the tag tree.
//!
//! ### Cargo features
//! - `serde` (default) — Serde (de)serialization support.
//! - `serde_boolean` (default) — serializes `bool` as `TAG_Byte` (0/1)
//!   rather than rejecting it.
//! - `serde_unsigned` — serializes unsigned integers as their signed
//!   wire counterpart rather than rejecting values that don't fit.
//!
//! ## Quick start
//!
//! ### Building a tag tree
//! ```
//! use nbtwire::Tag;
//!
//! let root = Tag::compound();
//! root.compound_add("age", Tag::byte(18)).unwrap();
//! root.compound_add("name", Tag::string("Steve")).unwrap();
//!
//! let scores = Tag::empty_list();
//! scores.list_add(Tag::int(10)).unwrap();
//! scores.list_add(Tag::int(20)).unwrap();
//! root.compound_add("scores", scores).unwrap();
//!
//! assert_eq!(root.compound_get("name").unwrap().as_string().unwrap(), "Steve");
//! ```
//!
//! ### Writing and reading a document
//! ```
//! use nbtwire::{Tag, WriterOptions, ReaderOptions};
//! use nbtwire::writer::write_root;
//! use nbtwire::reader::read_root;
//!
//! let root = Tag::compound();
//! root.compound_add("name", Tag::string("Bananrama")).unwrap();
//!
//! let mut bytes = Vec::new();
//! write_root(&mut bytes, "hello world", &root, &WriterOptions::new()).unwrap();
//!
//! let mut cursor = std::io::Cursor::new(bytes);
//! let (name, read_back) = read_root(&mut cursor, &ReaderOptions::new()).unwrap();
//! assert_eq!(name, "hello world");
//! assert_eq!(read_back.compound_get("name").unwrap().as_string().unwrap(), "Bananrama");
//! ```
//!
//! ### Walking a document with the pull reader
//! ```
//! use nbtwire::pull::PullReader;
//! use nbtwire::{Tag, WriterOptions, ReaderOptions};
//! use nbtwire::writer::write_root;
//!
//! let root = Tag::compound();
//! root.compound_add("name", Tag::string("Steve")).unwrap();
//! let mut bytes = Vec::new();
//! write_root(&mut bytes, "", &root, &WriterOptions::new()).unwrap();
//!
//! use nbtwire::pull::Value;
//!
//! let mut reader = PullReader::new(std::io::Cursor::new(bytes), ReaderOptions::new()).unwrap();
//! while reader.read_to_following().unwrap() {
//!     if reader.tag_name() == Some("name") {
//!         assert_eq!(reader.read_value().unwrap(), Value::String("Steve".to_string()));
//!     }
//! }
//! ```

pub(crate) mod codec;
pub(crate) mod compound;
pub(crate) mod config;
pub(crate) mod counting;
pub(crate) mod error;
pub(crate) mod list;
pub(crate) mod tag;
pub(crate) mod tag_type;

pub mod compression;
pub mod file;
pub mod pull;
pub mod push;
pub mod reader;
pub mod writer;

pub use codec::Endian;
pub use config::{ReaderOptions, WriterOptions};
pub use error::{NbtError, NbtResult};
pub use tag::Tag;
pub use tag_type::TagType;

pub use compression::Codec;
pub use file::{load, load_file, load_file_filtered, load_filtered, save, save_file};
pub use pull::PullReader;
pub use push::PushWriter;
pub use reader::Selector;

#[cfg(feature = "serde")]
pub mod de;
#[cfg(feature = "serde")]
pub mod ser;

#[cfg(feature = "serde")]
pub use de::{decode, decode_named, decode_tag};
#[cfg(feature = "serde")]
pub use ser::{encode, encode_named, encode_tag};

#[cfg(test)]
mod integration_smoke {
    use crate::config::{ReaderOptions, WriterOptions};
    use crate::reader::read_root;
    use crate::tag::Tag;
    use crate::writer::write_root;
    use std::io::Cursor;

    #[test]
    fn public_surface_round_trips_a_document() {
        let root = Tag::compound();
        root.compound_add("id", Tag::int(42)).unwrap();
        let mut bytes = Vec::new();
        write_root(&mut bytes, "doc", &root, &WriterOptions::new()).unwrap();
        let (name, read_back) = read_root(&mut Cursor::new(bytes), &ReaderOptions::new()).unwrap();
        assert_eq!(name, "doc");
        assert_eq!(read_back.compound_get("id").unwrap().as_int().unwrap(), 42);
    }
}
