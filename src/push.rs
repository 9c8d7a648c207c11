//! The push writer: a constraint-enforcing sink that emits well-formed
//! NBT bytes one call at a time, without ever building a tag tree.
//!
//! Built on a frame stack: every open compound or list is a frame
//! tracking its element type (for lists) and size/index; `enforce` is the
//! single checkpoint every emit call passes through before a byte is
//! written.

use std::io::Write;

use crate::codec;
use crate::config::WriterOptions;
use crate::error::{NbtError, NbtResult};
use crate::tag::Tag;
use crate::tag_type::TagType;

#[derive(Debug)]
enum Frame {
    Compound,
    List { element_type: TagType, size: usize, index: usize },
}

/// A sink that accepts tag-emission calls and enforces all structural
/// rules at call time.
pub struct PushWriter<W: Write> {
    writer: W,
    options: WriterOptions,
    frames: Vec<Frame>,
    finished: bool,
}

fn validate_element_type(ty: TagType) -> NbtResult<()> {
    if ty == TagType::End || ty == TagType::Unknown {
        return Err(NbtError::InvalidArgument {
            message: format!("{} is not a valid list element type", ty),
        });
    }
    Ok(())
}

impl<W: Write> PushWriter<W> {
    /// Writes the outer `TAG_Compound` id and root name, establishing the
    /// root frame.
    pub fn new(mut writer: W, root_name: &str, options: WriterOptions) -> NbtResult<Self> {
        codec::write_u8(&mut writer, TagType::Compound.to_wire_byte())?;
        codec::write_string(&mut writer, root_name, options.endian)?;
        Ok(PushWriter { writer, options, frames: vec![Frame::Compound], finished: false })
    }

    fn enforce(&mut self, name: Option<&str>, desired_type: TagType) -> NbtResult<()> {
        if self.finished {
            return Err(NbtError::Format { message: "root closed".to_string() });
        }
        match self.frames.last_mut() {
            Some(Frame::List { element_type, size, index }) => {
                if name.is_some() {
                    return Err(NbtError::Format {
                        message: "cannot write a named tag inside a list".to_string(),
                    });
                }
                if desired_type != *element_type {
                    return Err(NbtError::Format {
                        message: format!(
                            "list holds {} elements, cannot write a {}",
                            element_type, desired_type
                        ),
                    });
                }
                if *index >= *size {
                    return Err(NbtError::Format {
                        message: format!("list already has its declared {} elements written", size),
                    });
                }
                *index += 1;
                Ok(())
            }
            Some(Frame::Compound) => {
                if name.is_none() {
                    return Err(NbtError::Format {
                        message: "a tag inside a compound must be named".to_string(),
                    });
                }
                Ok(())
            }
            None => Err(NbtError::Format { message: "root closed".to_string() }),
        }
    }

    fn write_header(&mut self, name: Option<&str>, ty: TagType) -> NbtResult<()> {
        codec::write_u8(&mut self.writer, ty.to_wire_byte())?;
        if let Some(name) = name {
            codec::write_string(&mut self.writer, name, self.options.endian)?;
        }
        Ok(())
    }

    pub fn write_byte(&mut self, name: Option<&str>, value: u8) -> NbtResult<()> {
        self.enforce(name, TagType::Byte)?;
        self.write_header(name, TagType::Byte)?;
        codec::write_u8(&mut self.writer, value)
    }

    pub fn write_short(&mut self, name: Option<&str>, value: i16) -> NbtResult<()> {
        self.enforce(name, TagType::Short)?;
        self.write_header(name, TagType::Short)?;
        codec::write_i16(&mut self.writer, value, self.options.endian)
    }

    pub fn write_int(&mut self, name: Option<&str>, value: i32) -> NbtResult<()> {
        self.enforce(name, TagType::Int)?;
        self.write_header(name, TagType::Int)?;
        codec::write_i32(&mut self.writer, value, self.options.endian)
    }

    pub fn write_long(&mut self, name: Option<&str>, value: i64) -> NbtResult<()> {
        self.enforce(name, TagType::Long)?;
        self.write_header(name, TagType::Long)?;
        codec::write_i64(&mut self.writer, value, self.options.endian)
    }

    pub fn write_float(&mut self, name: Option<&str>, value: f32) -> NbtResult<()> {
        self.enforce(name, TagType::Float)?;
        self.write_header(name, TagType::Float)?;
        codec::write_f32(&mut self.writer, value, self.options.endian)
    }

    pub fn write_double(&mut self, name: Option<&str>, value: f64) -> NbtResult<()> {
        self.enforce(name, TagType::Double)?;
        self.write_header(name, TagType::Double)?;
        codec::write_f64(&mut self.writer, value, self.options.endian)
    }

    pub fn write_string(&mut self, name: Option<&str>, value: &str) -> NbtResult<()> {
        self.enforce(name, TagType::String)?;
        self.write_header(name, TagType::String)?;
        codec::write_string(&mut self.writer, value, self.options.endian)
    }

    fn write_length(&mut self, len: usize) -> NbtResult<()> {
        if len > i32::MAX as usize {
            return Err(NbtError::InvalidArgument {
                message: format!("length {} exceeds i32::MAX", len),
            });
        }
        codec::write_i32(&mut self.writer, len as i32, self.options.endian)
    }

    pub fn write_byte_array(&mut self, name: Option<&str>, bytes: &[u8]) -> NbtResult<()> {
        self.enforce(name, TagType::ByteArray)?;
        self.write_header(name, TagType::ByteArray)?;
        self.write_length(bytes.len())?;
        codec::write_bytes(&mut self.writer, bytes)
    }

    pub fn write_int_array(&mut self, name: Option<&str>, values: &[i32]) -> NbtResult<()> {
        self.enforce(name, TagType::IntArray)?;
        self.write_header(name, TagType::IntArray)?;
        self.write_length(values.len())?;
        for &v in values {
            codec::write_i32(&mut self.writer, v, self.options.endian)?;
        }
        Ok(())
    }

    pub fn write_long_array(&mut self, name: Option<&str>, values: &[i64]) -> NbtResult<()> {
        self.enforce(name, TagType::LongArray)?;
        self.write_header(name, TagType::LongArray)?;
        self.write_length(values.len())?;
        for &v in values {
            codec::write_i64(&mut self.writer, v, self.options.endian)?;
        }
        Ok(())
    }

    /// Streams a byte array's payload from `source`, `count` bytes at a
    /// time, through an internal buffer (default ~8 KiB) rather than
    /// requiring the caller to materialize the whole array up front.
    pub fn write_byte_array_from_reader<R: std::io::Read>(
        &mut self,
        name: Option<&str>,
        source: &mut R,
        count: usize,
        buffer_size: Option<usize>,
    ) -> NbtResult<()> {
        self.enforce(name, TagType::ByteArray)?;
        self.write_header(name, TagType::ByteArray)?;
        self.write_length(count)?;
        let mut buf = vec![0u8; buffer_size.unwrap_or(8 * 1024).max(1)];
        let mut remaining = count;
        while remaining > 0 {
            let chunk = remaining.min(buf.len());
            source
                .read_exact(&mut buf[..chunk])
                .map_err(|_| NbtError::Truncated { while_reading: "byte array source".to_string() })?;
            codec::write_bytes(&mut self.writer, &buf[..chunk])?;
            remaining -= chunk;
        }
        Ok(())
    }

    pub fn begin_compound(&mut self, name: Option<&str>) -> NbtResult<()> {
        self.enforce(name, TagType::Compound)?;
        self.write_header(name, TagType::Compound)?;
        self.frames.push(Frame::Compound);
        Ok(())
    }

    /// Emits the closing `TAG_End` byte. *Format-error* outside compound
    /// context.
    pub fn end_compound(&mut self) -> NbtResult<()> {
        if self.finished {
            return Err(NbtError::Format { message: "root closed".to_string() });
        }
        match self.frames.last() {
            Some(Frame::Compound) => {}
            _ => {
                return Err(NbtError::Format {
                    message: "end_compound outside compound context".to_string(),
                })
            }
        }
        codec::write_u8(&mut self.writer, TagType::End.to_wire_byte())?;
        self.frames.pop();
        if self.frames.is_empty() {
            self.finished = true;
        }
        Ok(())
    }

    pub fn begin_list(&mut self, name: Option<&str>, element_type: TagType, size: usize) -> NbtResult<()> {
        validate_element_type(element_type)?;
        self.enforce(name, TagType::List)?;
        self.write_header(name, TagType::List)?;
        codec::write_u8(&mut self.writer, element_type.to_wire_byte())?;
        self.write_length(size)?;
        self.frames.push(Frame::List { element_type, size, index: 0 });
        Ok(())
    }

    /// Requires `list_index == list_size`, else *format-error*. Emits no
    /// bytes of its own — a list's size was already committed to the wire
    /// by `begin_list`.
    pub fn end_list(&mut self) -> NbtResult<()> {
        match self.frames.last() {
            Some(Frame::List { size, index, .. }) => {
                if index != size {
                    return Err(NbtError::Format {
                        message: format!(
                            "not all list elements written: expected {}, written {}",
                            size, index
                        ),
                    });
                }
            }
            _ => {
                return Err(NbtError::Format {
                    message: "end_list outside list context".to_string(),
                })
            }
        }
        self.frames.pop();
        Ok(())
    }

    /// Emits `tag` in the currently expected context: named when in a
    /// compound, unnamed when in a list. Writes the tag's full subtree in
    /// one call.
    pub fn write_tag(&mut self, name: Option<&str>, tag: &Tag) -> NbtResult<()> {
        self.enforce(name, tag.tag_type())?;
        self.write_header(name, tag.tag_type())?;
        self.write_tag_payload(tag)
    }

    fn write_tag_payload(&mut self, tag: &Tag) -> NbtResult<()> {
        match tag.tag_type() {
            TagType::Byte => codec::write_u8(&mut self.writer, tag.as_byte()?),
            TagType::Short => codec::write_i16(&mut self.writer, tag.as_short()?, self.options.endian),
            TagType::Int => codec::write_i32(&mut self.writer, tag.as_int()?, self.options.endian),
            TagType::Long => codec::write_i64(&mut self.writer, tag.as_long()?, self.options.endian),
            TagType::Float => codec::write_f32(&mut self.writer, tag.as_float()?, self.options.endian),
            TagType::Double => codec::write_f64(&mut self.writer, tag.as_double()?, self.options.endian),
            TagType::String => codec::write_string(&mut self.writer, &tag.as_string()?, self.options.endian),
            TagType::ByteArray => {
                let bytes = tag.as_byte_array()?;
                self.write_length(bytes.len())?;
                codec::write_bytes(&mut self.writer, &bytes)
            }
            TagType::IntArray => {
                let values = tag.as_int_array()?;
                self.write_length(values.len())?;
                for v in values {
                    codec::write_i32(&mut self.writer, v, self.options.endian)?;
                }
                Ok(())
            }
            TagType::LongArray => {
                let values = tag.as_long_array()?;
                self.write_length(values.len())?;
                for v in values {
                    codec::write_i64(&mut self.writer, v, self.options.endian)?;
                }
                Ok(())
            }
            TagType::List => {
                let element_type = tag.list_element_type()?;
                let wire_type = if element_type == TagType::Unknown { TagType::End } else { element_type };
                codec::write_u8(&mut self.writer, wire_type.to_wire_byte())?;
                let items = tag.list_items()?;
                self.write_length(items.len())?;
                for item in &items {
                    self.write_tag_payload(item)?;
                }
                Ok(())
            }
            TagType::Compound => {
                let mut children = tag.compound_tags();
                children.sort_by_key(|c| c.name().unwrap_or_default());
                for child in &children {
                    codec::write_u8(&mut self.writer, child.tag_type().to_wire_byte())?;
                    codec::write_string(&mut self.writer, &child.name().unwrap_or_default(), self.options.endian)?;
                    self.write_tag_payload(child)?;
                }
                codec::write_u8(&mut self.writer, TagType::End.to_wire_byte())
            }
            TagType::End | TagType::Unknown => Err(NbtError::Format {
                message: format!("cannot write a {} tag", tag.tag_type()),
            }),
        }
    }

    /// Verifies all frames are closed. Emits no bytes of its own.
    pub fn finish(&mut self) -> NbtResult<()> {
        if !self.finished || !self.frames.is_empty() {
            return Err(NbtError::Format {
                message: "writer finished with open compound/list frames".to_string(),
            });
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderOptions;
    use crate::reader::read_root;
    use std::io::Cursor;

    #[test]
    fn writes_a_small_document_and_finishes_cleanly() {
        let mut writer = PushWriter::new(Vec::new(), "player", WriterOptions::new()).unwrap();
        writer.write_byte(Some("age"), 18).unwrap();
        writer.begin_list(Some("scores"), TagType::Int, 2).unwrap();
        writer.write_int(None, 10).unwrap();
        writer.write_int(None, 20).unwrap();
        writer.end_list().unwrap();
        writer.end_compound().unwrap();
        writer.finish().unwrap();

        let bytes = writer.into_inner();
        let mut cursor = Cursor::new(bytes);
        let (name, root) = read_root(&mut cursor, &ReaderOptions::new()).unwrap();
        assert_eq!(name, "player");
        assert_eq!(root.compound_get("age").unwrap().as_byte().unwrap(), 18);
        let scores = root.compound_get("scores").unwrap();
        assert_eq!(scores.list_get(0).unwrap().as_int().unwrap(), 10);
        assert_eq!(scores.list_get(1).unwrap().as_int().unwrap(), 20);
    }

    #[test]
    fn incomplete_list_fails_at_end_list() {
        let mut writer = PushWriter::new(Vec::new(), "r", WriterOptions::new()).unwrap();
        writer.begin_list(Some("l"), TagType::Int, 2).unwrap();
        writer.write_int(None, 1).unwrap();
        let err = writer.end_list().unwrap_err();
        match err {
            NbtError::Format { message } => {
                assert!(message.contains("expected 2"));
                assert!(message.contains("written 1"));
            }
            _ => panic!("expected a format error"),
        }
    }

    #[test]
    fn named_tag_inside_list_is_rejected() {
        let mut writer = PushWriter::new(Vec::new(), "r", WriterOptions::new()).unwrap();
        writer.begin_list(Some("l"), TagType::Int, 1).unwrap();
        let err = writer.write_int(Some("oops"), 1).unwrap_err();
        assert!(matches!(err, NbtError::Format { .. }));
    }

    #[test]
    fn writing_after_finish_is_rejected() {
        let mut writer = PushWriter::new(Vec::new(), "r", WriterOptions::new()).unwrap();
        writer.end_compound().unwrap();
        let err = writer.write_byte(Some("x"), 1).unwrap_err();
        assert!(matches!(err, NbtError::Format { .. }));
    }

    #[test]
    fn write_tag_emits_a_full_subtree_in_one_call() {
        let mut writer = PushWriter::new(Vec::new(), "", WriterOptions::new()).unwrap();
        let nested = Tag::compound();
        nested.compound_add("inner", Tag::string("hi")).unwrap();
        writer.write_tag(Some("n"), &nested).unwrap();
        writer.end_compound().unwrap();
        writer.finish().unwrap();

        let mut cursor = Cursor::new(writer.into_inner());
        let (_, root) = read_root(&mut cursor, &ReaderOptions::new()).unwrap();
        let n = root.compound_get("n").unwrap();
        assert_eq!(n.compound_get("inner").unwrap().as_string().unwrap(), "hi");
    }
}
