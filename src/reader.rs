//! The recursive tree reader: the whole-document path that walks an NBT
//! byte stream straight into a [`Tag`] tree, materializing eagerly from
//! the root.
//!
//! Supports big/little endian via [`Endian`], the parent-aware [`Tag`]
//! handle, a depth limit from [`ReaderOptions`], and plain UTF-8 strings —
//! the wire string payload is UTF-8, and Rust's `String` cannot even
//! represent non-UTF-8 text, so no separate "wonky" decode path is needed
//! or possible.

use std::io::Read;

use crate::codec::{self, Endian};
use crate::config::ReaderOptions;
use crate::error::{NbtError, NbtResult};
use crate::tag::Tag;
use crate::tag_type::TagType;

/// A per-tag filter applied during tree loads: receives a tag's type,
/// name (absent for list elements and the root), and the
/// already-materialized parent it would be attached under, and decides
/// whether to materialize it at all. Returning `false` skips the payload
/// without decoding it and omits the tag from its parent.
pub type Selector<'a> = dyn Fn(TagType, Option<&str>, Option<&Tag>) -> bool + 'a;

/// Reads a full document: `TAG_Compound` id, root name, then the compound
/// body. Returns the root's name alongside the root tag itself.
pub fn read_root<R: Read>(reader: &mut R, options: &ReaderOptions) -> NbtResult<(String, Tag)> {
    read_root_filtered(reader, options, None)
}

/// Like [`read_root`], but prunes subtrees `selector` rejects instead of
/// materializing them. The root itself is always kept; `selector` only
/// applies to its descendants, so an always-false selector yields an
/// *empty* root, not no root at all.
pub fn read_root_filtered<R: Read>(
    reader: &mut R,
    options: &ReaderOptions,
    selector: Option<&Selector>,
) -> NbtResult<(String, Tag)> {
    let id = codec::read_u8(reader)?;
    let ty = TagType::from_wire_byte(id)
        .ok_or_else(|| NbtError::Malformed { reason: format!("unknown tag id {}", id) })?;
    if ty != TagType::Compound {
        return Err(NbtError::Malformed {
            reason: format!("root tag must be TAG_Compound, found {}", ty),
        });
    }
    let name = codec::read_string(reader, options.endian)?;
    let root = read_tag_body_filtered(reader, ty, options, 0, selector)?;
    Ok((name, root))
}

/// Reads a tag's body, given that its type (and, for list context, name)
/// has already been consumed by the caller. Exposed crate-wide so the pull
/// reader's `read_as_tag` can reuse the compound-walking logic without
/// duplicating it.
pub(crate) fn read_tag_body<R: Read>(
    reader: &mut R,
    ty: TagType,
    options: &ReaderOptions,
    depth: usize,
) -> NbtResult<Tag> {
    read_tag_body_filtered(reader, ty, options, depth, None)
}

pub(crate) fn read_tag_body_filtered<R: Read>(
    reader: &mut R,
    ty: TagType,
    options: &ReaderOptions,
    depth: usize,
    selector: Option<&Selector>,
) -> NbtResult<Tag> {
    if depth > options.max_depth {
        return Err(NbtError::Malformed {
            reason: format!("nesting exceeds the configured maximum depth of {}", options.max_depth),
        });
    }
    let endian = options.endian;
    match ty {
        TagType::End => Err(NbtError::Malformed { reason: "unexpected TAG_End".to_string() }),
        TagType::Byte => Ok(Tag::byte(codec::read_u8(reader)?)),
        TagType::Short => Ok(Tag::short(codec::read_i16(reader, endian)?)),
        TagType::Int => Ok(Tag::int(codec::read_i32(reader, endian)?)),
        TagType::Long => Ok(Tag::long(codec::read_i64(reader, endian)?)),
        TagType::Float => Ok(Tag::float(codec::read_f32(reader, endian)?)),
        TagType::Double => Ok(Tag::double(codec::read_f64(reader, endian)?)),
        TagType::String => Ok(Tag::string(codec::read_string(reader, endian)?)),
        TagType::ByteArray => {
            let len = read_length(reader, endian)?;
            let mut buf = vec![0u8; len];
            reader
                .read_exact(&mut buf)
                .map_err(|_| NbtError::Truncated { while_reading: "byte array".to_string() })?;
            Ok(Tag::byte_array(buf))
        }
        TagType::IntArray => {
            let len = read_length(reader, endian)?;
            let mut values = Vec::with_capacity(len.min(1 << 20));
            for _ in 0..len {
                values.push(codec::read_i32(reader, endian)?);
            }
            Ok(Tag::int_array(values))
        }
        TagType::LongArray => {
            let len = read_length(reader, endian)?;
            let mut values = Vec::with_capacity(len.min(1 << 20));
            for _ in 0..len {
                values.push(codec::read_i64(reader, endian)?);
            }
            Ok(Tag::long_array(values))
        }
        TagType::List => {
            let element_id = codec::read_u8(reader)?;
            let element_type = TagType::from_wire_byte(element_id).ok_or_else(|| {
                NbtError::Malformed { reason: format!("unknown list element id {}", element_id) }
            })?;
            let len = read_length(reader, endian)?;
            if element_type == TagType::End && len > 0 {
                return Err(NbtError::Malformed {
                    reason: "non-empty list of TAG_End is not representable".to_string(),
                });
            }
            let list = Tag::empty_list();
            for _ in 0..len {
                let keep = selector.map_or(true, |s| s(element_type, None, Some(&list)));
                if keep {
                    let element =
                        read_tag_body_filtered(reader, element_type, options, depth + 1, selector)?;
                    list.list_add(element)?;
                } else {
                    skip_tag_body(reader, element_type, options, depth + 1)?;
                }
            }
            // `list_add` only commits `element_type` as a side effect of a
            // real insert, which never runs when `len == 0` or every
            // element was filtered out. Commit the wire-declared type
            // explicitly so the list stays round-trippable either way.
            if list.list_len().unwrap_or(0) == 0 {
                list.commit_list_element_type(element_type)?;
            }
            Ok(list)
        }
        TagType::Compound => {
            let compound = Tag::compound();
            loop {
                let id = codec::read_u8(reader)?;
                let child_ty = TagType::from_wire_byte(id).ok_or_else(|| NbtError::Malformed {
                    reason: format!("unknown tag id {}", id),
                })?;
                if child_ty == TagType::End {
                    break;
                }
                let name = codec::read_string(reader, endian)?;
                let keep = selector.map_or(true, |s| s(child_ty, Some(name.as_str()), Some(&compound)));
                if keep {
                    let child =
                        read_tag_body_filtered(reader, child_ty, options, depth + 1, selector)?;
                    compound.compound_add(name, child)?;
                } else {
                    skip_tag_body(reader, child_ty, options, depth + 1)?;
                }
            }
            Ok(compound)
        }
        TagType::Unknown => unreachable!("TagType::Unknown never arrives over the wire"),
    }
}

/// Consumes and discards a tag's payload without materializing it, used
/// when `selector` rejects a tag — the bytes still have to be walked to
/// find where the next sibling starts.
fn skip_tag_body<R: Read>(
    reader: &mut R,
    ty: TagType,
    options: &ReaderOptions,
    depth: usize,
) -> NbtResult<()> {
    let endian = options.endian;
    match ty {
        TagType::End => Ok(()),
        TagType::Byte => codec::read_u8(reader).map(drop),
        TagType::Short => codec::read_i16(reader, endian).map(drop),
        TagType::Int => codec::read_i32(reader, endian).map(drop),
        TagType::Long => codec::read_i64(reader, endian).map(drop),
        TagType::Float => codec::read_f32(reader, endian).map(drop),
        TagType::Double => codec::read_f64(reader, endian).map(drop),
        TagType::String => codec::read_string(reader, endian).map(drop),
        TagType::ByteArray => {
            let len = read_length(reader, endian)?;
            codec::skip(reader, len as u64)
        }
        TagType::IntArray => {
            let len = read_length(reader, endian)?;
            codec::skip(reader, len as u64 * 4)
        }
        TagType::LongArray => {
            let len = read_length(reader, endian)?;
            codec::skip(reader, len as u64 * 8)
        }
        TagType::List => {
            let element_id = codec::read_u8(reader)?;
            let element_type = TagType::from_wire_byte(element_id).ok_or_else(|| {
                NbtError::Malformed { reason: format!("unknown list element id {}", element_id) }
            })?;
            let len = read_length(reader, endian)?;
            for _ in 0..len {
                skip_tag_body(reader, element_type, options, depth + 1)?;
            }
            Ok(())
        }
        TagType::Compound => loop {
            let id = codec::read_u8(reader)?;
            let child_ty = TagType::from_wire_byte(id)
                .ok_or_else(|| NbtError::Malformed { reason: format!("unknown tag id {}", id) })?;
            if child_ty == TagType::End {
                return Ok(());
            }
            codec::read_string(reader, endian)?;
            skip_tag_body(reader, child_ty, options, depth + 1)?;
        },
        TagType::Unknown => unreachable!("TagType::Unknown never arrives over the wire"),
    }
}

fn read_length<R: Read>(reader: &mut R, endian: Endian) -> NbtResult<usize> {
    let raw = codec::read_i32(reader, endian)?;
    if raw < 0 {
        return Err(NbtError::Malformed { reason: format!("negative length {}", raw) });
    }
    Ok(raw as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hello_world_bytes() -> Vec<u8> {
        vec![
            10, 0, 11, b'h', b'e', b'l', b'l', b'o', b' ', b'w', b'o', b'r', b'l', b'd', 8, 0, 4,
            b'n', b'a', b'm', b'e', 0, 9, b'B', b'a', b'n', b'a', b'n', b'r', b'a', b'm', b'a', 0,
        ]
    }

    #[test]
    fn reads_the_smallest_well_known_file() {
        let bytes = hello_world_bytes();
        let mut cursor = Cursor::new(bytes);
        let (name, root) = read_root(&mut cursor, &ReaderOptions::new()).unwrap();
        assert_eq!(name, "hello world");
        assert_eq!(root.compound_get("name").unwrap().as_string().unwrap(), "Bananrama");
    }

    #[test]
    fn rejects_non_compound_root() {
        let bytes = vec![1, 0, 0, 5];
        let mut cursor = Cursor::new(bytes);
        let err = read_root(&mut cursor, &ReaderOptions::new()).unwrap_err();
        assert!(matches!(err, NbtError::Malformed { .. }));
    }

    #[test]
    fn selector_returning_false_yields_an_empty_root() {
        let bytes = hello_world_bytes();
        let mut cursor = Cursor::new(bytes);
        let selector: &Selector = &|_ty, _name, _parent| false;
        let (name, root) =
            read_root_filtered(&mut cursor, &ReaderOptions::new(), Some(selector)).unwrap();
        assert_eq!(name, "hello world");
        assert!(root.is_compound());
        assert_eq!(root.compound_len(), 0);
    }

    #[test]
    fn selector_returning_true_matches_unfiltered_load() {
        let selector: &Selector = &|_ty, _name, _parent| true;
        let (name_a, root_a) =
            read_root_filtered(&mut Cursor::new(hello_world_bytes()), &ReaderOptions::new(), Some(selector))
                .unwrap();
        let (name_b, root_b) =
            read_root(&mut Cursor::new(hello_world_bytes()), &ReaderOptions::new()).unwrap();
        assert_eq!(name_a, name_b);
        assert_eq!(
            root_a.compound_get("name").unwrap().as_string().unwrap(),
            root_b.compound_get("name").unwrap().as_string().unwrap(),
        );
    }

    #[test]
    fn selector_prunes_a_named_child_by_name() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[10, 0, 0]);
        buf.push(3); // TAG_Int
        buf.extend_from_slice(&[0, 6]);
        buf.extend_from_slice(b"pruned");
        buf.extend_from_slice(&7i32.to_be_bytes());
        buf.push(3); // TAG_Int
        buf.extend_from_slice(&[0, 4]);
        buf.extend_from_slice(b"kept");
        buf.extend_from_slice(&9i32.to_be_bytes());
        buf.push(0);

        let selector: &Selector = &|_ty, name, _parent| name != Some("pruned");
        let (_, root) =
            read_root_filtered(&mut Cursor::new(buf), &ReaderOptions::new(), Some(selector)).unwrap();
        assert!(!root.compound_contains("pruned"));
        assert_eq!(root.compound_get("kept").unwrap().as_int().unwrap(), 9);
    }

    #[test]
    fn list_of_lists_with_empty_inner_round_trips() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[10, 0, 0]); // root compound, unnamed
        buf.push(9); // TAG_List
        buf.extend_from_slice(&[0, 6]);
        buf.extend_from_slice(b"nested");
        buf.push(9); // element type: list
        buf.extend_from_slice(&2i32.to_be_bytes()); // outer length 2
        // first inner list: empty list of bytes
        buf.push(1);
        buf.extend_from_slice(&0i32.to_be_bytes());
        // second inner list: one byte element
        buf.push(1);
        buf.extend_from_slice(&1i32.to_be_bytes());
        buf.push(42);
        buf.push(0); // TAG_End for root compound

        let mut cursor = Cursor::new(buf);
        let (_, root) = read_root(&mut cursor, &ReaderOptions::new()).unwrap();
        let nested = root.compound_get("nested").unwrap();
        assert_eq!(nested.list_len().unwrap(), 2);
        let first_inner = nested.list_get(0).unwrap();
        assert_eq!(first_inner.list_element_type().unwrap(), TagType::Byte);
        assert_eq!(first_inner.list_len().unwrap(), 0);
        let second_inner = nested.list_get(1).unwrap();
        assert_eq!(second_inner.list_get(0).unwrap().as_byte().unwrap(), 42);
    }
}
