//! The recursive tree writer: walks a [`Tag`] tree straight onto a byte
//! stream in one call, the whole-tree analogue of the push writer in
//! `push.rs`.
//!
//! Supports big/little endian via [`Endian`]. A list already carries its
//! committed `element_type`, so writing only has to validate that it
//! isn't still `Unknown` rather than re-deriving the type by scanning
//! every element.

use std::io::Write;

use crate::codec::{self, Endian};
use crate::config::WriterOptions;
use crate::error::{NbtError, NbtResult};
use crate::tag::Tag;
use crate::tag_type::TagType;

/// Writes a full document: `TAG_Compound` id, root name, then the compound
/// body and a closing `TAG_End`.
pub fn write_root<W: Write>(
    writer: &mut W,
    name: &str,
    root: &Tag,
    options: &WriterOptions,
) -> NbtResult<()> {
    if root.tag_type() != TagType::Compound {
        return Err(NbtError::Format {
            message: format!("root tag must be a compound, found {}", root.tag_type()),
        });
    }
    codec::write_u8(writer, TagType::Compound.to_wire_byte())?;
    codec::write_string(writer, name, options.endian)?;
    write_tag_body(writer, root, options)
}

fn write_tag_body<W: Write>(writer: &mut W, tag: &Tag, options: &WriterOptions) -> NbtResult<()> {
    let endian = options.endian;
    match tag.tag_type() {
        TagType::End => Err(NbtError::Format { message: "cannot write TAG_End as a value".to_string() }),
        TagType::Byte => codec::write_u8(writer, tag.as_byte()?),
        TagType::Short => codec::write_i16(writer, tag.as_short()?, endian),
        TagType::Int => codec::write_i32(writer, tag.as_int()?, endian),
        TagType::Long => codec::write_i64(writer, tag.as_long()?, endian),
        TagType::Float => codec::write_f32(writer, tag.as_float()?, endian),
        TagType::Double => codec::write_f64(writer, tag.as_double()?, endian),
        TagType::String => codec::write_string(writer, &tag.as_string()?, endian),
        TagType::ByteArray => {
            let bytes = tag.as_byte_array()?;
            write_length(writer, bytes.len(), endian)?;
            codec::write_bytes(writer, &bytes)
        }
        TagType::IntArray => {
            let values = tag.as_int_array()?;
            write_length(writer, values.len(), endian)?;
            for v in values {
                codec::write_i32(writer, v, endian)?;
            }
            Ok(())
        }
        TagType::LongArray => {
            let values = tag.as_long_array()?;
            write_length(writer, values.len(), endian)?;
            for v in values {
                codec::write_i64(writer, v, endian)?;
            }
            Ok(())
        }
        TagType::List => {
            let element_type = tag.list_element_type()?;
            let wire_type = if element_type == TagType::Unknown {
                // an empty, never-populated list is written as TAG_End per
                // the original NBT convention for a zero-length list.
                TagType::End
            } else {
                element_type
            };
            codec::write_u8(writer, wire_type.to_wire_byte())?;
            let items = tag.list_items()?;
            write_length(writer, items.len(), endian)?;
            for item in &items {
                write_tag_body(writer, item, options)?;
            }
            Ok(())
        }
        TagType::Compound => {
            let mut children: Vec<Tag> = tag.compound_tags();
            children.sort_by_key(|c| c.name().unwrap_or_default());
            for child in &children {
                codec::write_u8(writer, child.tag_type().to_wire_byte())?;
                codec::write_string(writer, &child.name().unwrap_or_default(), endian)?;
                write_tag_body(writer, child, options)?;
            }
            codec::write_u8(writer, TagType::End.to_wire_byte())
        }
        TagType::Unknown => Err(NbtError::Format {
            message: "list has no committed element type".to_string(),
        }),
    }
}

fn write_length<W: Write>(writer: &mut W, len: usize, endian: Endian) -> NbtResult<()> {
    if len > i32::MAX as usize {
        return Err(NbtError::Format { message: format!("length {} exceeds i32::MAX", len) });
    }
    codec::write_i32(writer, len as i32, endian)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderOptions;
    use crate::reader::read_root;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_small_document() {
        let root = Tag::compound();
        root.compound_add("age", Tag::byte(18)).unwrap();
        root.compound_add("name", Tag::string("Steve")).unwrap();
        let list = Tag::empty_list();
        list.list_add(Tag::int(1)).unwrap();
        list.list_add(Tag::int(2)).unwrap();
        root.compound_add("scores", list).unwrap();

        let mut buf = Vec::new();
        write_root(&mut buf, "player", &root, &WriterOptions::new()).unwrap();

        let mut cursor = Cursor::new(buf);
        let (name, read_back) = read_root(&mut cursor, &ReaderOptions::new()).unwrap();
        assert_eq!(name, "player");
        assert_eq!(read_back.compound_get("age").unwrap().as_byte().unwrap(), 18);
        assert_eq!(read_back.compound_get("name").unwrap().as_string().unwrap(), "Steve");
        let scores = read_back.compound_get("scores").unwrap();
        assert_eq!(scores.list_get(0).unwrap().as_int().unwrap(), 1);
        assert_eq!(scores.list_get(1).unwrap().as_int().unwrap(), 2);
    }

    #[test]
    fn never_populated_list_writes_as_tag_end() {
        let root = Tag::compound();
        root.compound_add("empty", Tag::empty_list()).unwrap();
        let mut buf = Vec::new();
        write_root(&mut buf, "", &root, &WriterOptions::new()).unwrap();
        let mut cursor = Cursor::new(buf);
        let (_, read_back) = read_root(&mut cursor, &ReaderOptions::new()).unwrap();
        assert_eq!(read_back.compound_get("empty").unwrap().list_len().unwrap(), 0);
    }

    #[test]
    fn non_compound_root_is_rejected() {
        let err = write_root(&mut Vec::new(), "", &Tag::byte(1), &WriterOptions::new()).unwrap_err();
        assert!(matches!(err, NbtError::Format { .. }));
    }
}
