//! The pull reader: a depth-tracking cursor that walks an NBT byte stream
//! one tag at a time, with skip/filter and optional subtree
//! materialization.
//!
//! A token-style cursor reader built as a state machine: a frame stack
//! (one entry per open compound/list), a "current tag" snapshot of
//! observable state, and the two bookkeeping flags `pending_enter`
//! (current tag is a container whose frame hasn't been pushed yet) and
//! `payload_consumed` (current tag's value/array payload hasn't been read
//! or skipped yet) that let `advance` retire whatever the caller left
//! unconsumed before moving on.

use std::io::Read;

use crate::codec::{self, Endian};
use crate::config::ReaderOptions;
use crate::counting::CountingReader;
use crate::error::{NbtError, NbtResult};
use crate::reader::read_tag_body;
use crate::tag::Tag;
use crate::tag_type::TagType;

/// A scalar value read from a value tag's payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
        }
    }
}

/// Applies the same widening rules as [`crate::tag::Tag`]'s `as_*`
/// accessors, against a freshly-read [`Value`] rather than a tree node.
pub trait FromWidenedValue: Sized {
    fn widen(value: &Value) -> NbtResult<Self>;
}

macro_rules! widen_mismatch {
    ($value:expr, $target:expr) => {
        Err(NbtError::InvalidArgument {
            message: format!("cannot widen a {} into {}", $value.type_name(), $target),
        })
    };
}

impl FromWidenedValue for u8 {
    fn widen(value: &Value) -> NbtResult<Self> {
        match value {
            Value::Byte(v) => Ok(*v),
            _ => widen_mismatch!(value, "byte"),
        }
    }
}
impl FromWidenedValue for i16 {
    fn widen(value: &Value) -> NbtResult<Self> {
        match value {
            Value::Byte(v) => Ok(*v as i16),
            Value::Short(v) => Ok(*v),
            _ => widen_mismatch!(value, "short"),
        }
    }
}
impl FromWidenedValue for i32 {
    fn widen(value: &Value) -> NbtResult<Self> {
        match value {
            Value::Byte(v) => Ok(*v as i32),
            Value::Short(v) => Ok(*v as i32),
            Value::Int(v) => Ok(*v),
            _ => widen_mismatch!(value, "int"),
        }
    }
}
impl FromWidenedValue for i64 {
    fn widen(value: &Value) -> NbtResult<Self> {
        match value {
            Value::Byte(v) => Ok(*v as i64),
            Value::Short(v) => Ok(*v as i64),
            Value::Int(v) => Ok(*v as i64),
            Value::Long(v) => Ok(*v),
            _ => widen_mismatch!(value, "long"),
        }
    }
}
impl FromWidenedValue for f32 {
    fn widen(value: &Value) -> NbtResult<Self> {
        match value {
            Value::Byte(v) => Ok(*v as f32),
            Value::Short(v) => Ok(*v as f32),
            Value::Int(v) => Ok(*v as f32),
            Value::Long(v) => Ok(*v as f32),
            Value::Float(v) => Ok(*v),
            Value::Double(v) => Ok(*v as f32),
            _ => widen_mismatch!(value, "float"),
        }
    }
}
impl FromWidenedValue for f64 {
    fn widen(value: &Value) -> NbtResult<Self> {
        match value {
            Value::Byte(v) => Ok(*v as f64),
            Value::Short(v) => Ok(*v as f64),
            Value::Int(v) => Ok(*v as f64),
            Value::Long(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v as f64),
            Value::Double(v) => Ok(*v),
            _ => widen_mismatch!(value, "double"),
        }
    }
}
impl FromWidenedValue for String {
    fn widen(value: &Value) -> NbtResult<Self> {
        match value {
            Value::Byte(v) => Ok(v.to_string()),
            Value::Short(v) => Ok(v.to_string()),
            Value::Int(v) => Ok(v.to_string()),
            Value::Long(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            Value::Double(v) => Ok(v.to_string()),
            Value::String(v) => Ok(v.clone()),
        }
    }
}

#[derive(Debug)]
struct Frame {
    parent_type: TagType, // Compound or List
    parent_name: Option<String>,
    list_element_type: TagType,
    list_length: usize,
    list_index: usize,
}

/// The cursor's observable state. Defaulted before the first successful
/// `read_to_following`.
#[derive(Debug, Clone)]
pub struct CurrentTag {
    pub tag_type: TagType,
    pub tag_name: Option<String>,
    pub list_type: TagType,
    pub tag_length: Option<usize>,
    pub depth: usize,
    pub is_list_element: bool,
    pub list_index: Option<usize>,
    pub parent_name: Option<String>,
    pub parent_type: Option<TagType>,
    pub parent_tag_length: Option<usize>,
    pub tag_start_offset: u64,
}

impl Default for CurrentTag {
    fn default() -> Self {
        CurrentTag {
            tag_type: TagType::End,
            tag_name: None,
            list_type: TagType::Unknown,
            tag_length: None,
            depth: 0,
            is_list_element: false,
            list_index: None,
            parent_name: None,
            parent_type: None,
            parent_tag_length: None,
            tag_start_offset: 0,
        }
    }
}

impl CurrentTag {
    pub fn is_list(&self) -> bool {
        self.tag_type == TagType::List
    }
    pub fn is_compound(&self) -> bool {
        self.tag_type == TagType::Compound
    }
    pub fn has_value(&self) -> bool {
        self.tag_type.is_value_type() || self.tag_type.is_array_type()
    }
    pub fn has_name(&self) -> bool {
        self.tag_name.is_some()
    }
    pub fn has_length(&self) -> bool {
        self.tag_length.is_some()
    }
}

/// A token-style cursor over an NBT byte stream.
pub struct PullReader<R: Read> {
    reader: CountingReader<R>,
    options: ReaderOptions,
    skip_end_tags: bool,
    cache_tag_values: bool,
    root_name: String,
    frames: Vec<Frame>,
    current: CurrentTag,
    pending_enter: bool,
    payload_consumed: bool,
    tags_read: u64,
    at_stream_end: bool,
    error: bool,
    cached_value: Option<Value>,
}

impl<R: Read> PullReader<R> {
    /// Reads the outer `TAG_Compound` id and root name, then constructs a
    /// cursor positioned just before the root's first child.
    pub fn new(reader: R, options: ReaderOptions) -> NbtResult<Self> {
        let mut counting = CountingReader::new(reader);
        let id = codec::read_u8(&mut counting)?;
        let ty = TagType::from_wire_byte(id)
            .ok_or_else(|| NbtError::Malformed { reason: format!("unknown tag id {}", id) })?;
        if ty != TagType::Compound {
            return Err(NbtError::Malformed {
                reason: format!("root tag must be TAG_Compound, found {}", ty),
            });
        }
        let root_name = codec::read_string(&mut counting, options.endian)?;
        Ok(PullReader {
            reader: counting,
            options,
            skip_end_tags: true,
            cache_tag_values: false,
            root_name: root_name.clone(),
            frames: vec![Frame {
                parent_type: TagType::Compound,
                parent_name: Some(root_name),
                list_element_type: TagType::Unknown,
                list_length: 0,
                list_index: 0,
            }],
            current: CurrentTag::default(),
            pending_enter: false,
            payload_consumed: true,
            tags_read: 0,
            at_stream_end: false,
            error: false,
            cached_value: None,
        })
    }

    pub fn with_skip_end_tags(mut self, skip: bool) -> Self {
        self.skip_end_tags = skip;
        self
    }

    pub fn with_cache_tag_values(mut self, cache: bool) -> Self {
        self.cache_tag_values = cache;
        self
    }

    // ---- observable state ----

    pub fn root_name(&self) -> &str {
        &self.root_name
    }
    pub fn current(&self) -> &CurrentTag {
        &self.current
    }
    pub fn tag_type(&self) -> TagType {
        self.current.tag_type
    }
    pub fn tag_name(&self) -> Option<&str> {
        self.current.tag_name.as_deref()
    }
    pub fn depth(&self) -> usize {
        self.current.depth
    }
    pub fn tags_read(&self) -> u64 {
        self.tags_read
    }
    pub fn is_in_error_state(&self) -> bool {
        self.error
    }
    pub fn is_at_stream_end(&self) -> bool {
        self.at_stream_end
    }
    pub fn bytes_read(&self) -> u64 {
        self.reader.bytes_read()
    }

    fn fail<T>(&mut self, err: NbtError) -> NbtResult<T> {
        self.error = true;
        Err(err)
    }

    fn guard(&mut self) -> NbtResult<()> {
        if self.error {
            return Err(NbtError::InvalidState {
                message: "reader has latched into an error state".to_string(),
            });
        }
        Ok(())
    }

    // ---- advancing ----

    /// Retires whatever the current tag left unconsumed: enters a pending
    /// container, or skips an unread value/array payload.
    fn retire_current(&mut self) -> NbtResult<()> {
        if self.pending_enter {
            let parent_type = self.current.tag_type;
            let parent_name = self.current.tag_name.clone();
            let (list_element_type, list_length) = if parent_type == TagType::List {
                (self.current.list_type, self.current.tag_length.unwrap_or(0))
            } else {
                (TagType::Unknown, 0)
            };
            self.frames.push(Frame {
                parent_type,
                parent_name,
                list_element_type,
                list_length,
                list_index: 0,
            });
            self.pending_enter = false;
        } else if !self.payload_consumed {
            self.skip_pending_payload()?;
        }
        Ok(())
    }

    fn skip_pending_payload(&mut self) -> NbtResult<()> {
        match self.current.tag_type {
            TagType::Byte => {
                codec::read_u8(&mut self.reader)?;
            }
            TagType::Short => {
                codec::read_i16(&mut self.reader, self.options.endian)?;
            }
            TagType::Int => {
                codec::read_i32(&mut self.reader, self.options.endian)?;
            }
            TagType::Long => {
                codec::read_i64(&mut self.reader, self.options.endian)?;
            }
            TagType::Float => {
                codec::read_f32(&mut self.reader, self.options.endian)?;
            }
            TagType::Double => {
                codec::read_f64(&mut self.reader, self.options.endian)?;
            }
            TagType::String => {
                codec::read_string(&mut self.reader, self.options.endian)?;
            }
            TagType::ByteArray => {
                codec::skip(&mut self.reader, self.current.tag_length.unwrap_or(0) as u64)?;
            }
            TagType::IntArray => {
                codec::skip(&mut self.reader, self.current.tag_length.unwrap_or(0) as u64 * 4)?;
            }
            TagType::LongArray => {
                codec::skip(&mut self.reader, self.current.tag_length.unwrap_or(0) as u64 * 8)?;
            }
            _ => {}
        }
        self.payload_consumed = true;
        self.cached_value = None;
        Ok(())
    }

    /// Reads the header-tail for a just-identified tag type: for `List`,
    /// the element type and length; for array types, just the length.
    /// Leaves everything else pending.
    fn finish_header(
        &mut self,
        tag_type: TagType,
        tag_name: Option<String>,
        depth: usize,
        is_list_element: bool,
        list_index: Option<usize>,
        start_offset: u64,
    ) -> NbtResult<()> {
        let (list_type, tag_length, pending_enter) = match tag_type {
            TagType::List => {
                let id = codec::read_u8(&mut self.reader)?;
                let elem = TagType::from_wire_byte(id).ok_or_else(|| NbtError::Malformed {
                    reason: format!("unknown list element id {}", id),
                })?;
                let len = read_length(&mut self.reader, self.options.endian)?;
                (elem, Some(len), true)
            }
            TagType::Compound => (TagType::Unknown, None, true),
            TagType::ByteArray | TagType::IntArray | TagType::LongArray => {
                let len = read_length(&mut self.reader, self.options.endian)?;
                (TagType::Unknown, Some(len), false)
            }
            _ => (TagType::Unknown, None, false),
        };

        let (parent_name, parent_type, parent_tag_length) = match self.frames.last() {
            Some(frame) => (
                frame.parent_name.clone(),
                Some(frame.parent_type),
                if frame.parent_type == TagType::List { Some(frame.list_length) } else { None },
            ),
            None => (None, None, None),
        };

        self.current = CurrentTag {
            tag_type,
            tag_name,
            list_type,
            tag_length,
            depth,
            is_list_element,
            list_index,
            parent_name,
            parent_type,
            parent_tag_length,
            tag_start_offset: start_offset,
        };
        self.pending_enter = pending_enter;
        self.payload_consumed = !tag_type.is_value_type() && !tag_type.is_array_type();
        self.cached_value = None;
        self.tags_read += 1;
        Ok(())
    }

    /// Advances to the very next tag header in document order.
    pub fn read_to_following(&mut self) -> NbtResult<bool> {
        self.guard()?;
        if self.at_stream_end {
            return Ok(false);
        }
        if let Err(e) = self.retire_current() {
            return self.fail(e);
        }
        loop {
            let depth = self.frames.len();
            if self.frames.is_empty() {
                self.at_stream_end = true;
                return Ok(false);
            }

            let list_exhausted = {
                let frame = self.frames.last().unwrap();
                frame.parent_type == TagType::List && frame.list_index >= frame.list_length
            };
            if list_exhausted {
                self.frames.pop();
                continue;
            }

            let in_list = self.frames.last().unwrap().parent_type == TagType::List;
            if in_list {
                let (index, element_type) = {
                    let frame = self.frames.last_mut().unwrap();
                    let index = frame.list_index;
                    frame.list_index += 1;
                    (index, frame.list_element_type)
                };
                let start = self.reader.bytes_read();
                if let Err(e) =
                    self.finish_header(element_type, None, depth, true, Some(index), start)
                {
                    return self.fail(e);
                }
                return Ok(true);
            }

            let start = self.reader.bytes_read();
            let id = match codec::read_u8(&mut self.reader) {
                Ok(id) => id,
                Err(e) => return self.fail(e),
            };
            let ty = match TagType::from_wire_byte(id) {
                Some(ty) => ty,
                None => {
                    return self.fail(NbtError::Malformed { reason: format!("unknown tag id {}", id) })
                }
            };
            if ty == TagType::End {
                self.frames.pop();
                if self.skip_end_tags {
                    continue;
                }
                self.current = CurrentTag {
                    tag_type: TagType::End,
                    depth,
                    tag_start_offset: start,
                    ..CurrentTag::default()
                };
                self.pending_enter = false;
                self.payload_consumed = true;
                self.tags_read += 1;
                return Ok(true);
            }
            let name = match codec::read_string(&mut self.reader, self.options.endian) {
                Ok(name) => name,
                Err(e) => return self.fail(e),
            };
            if let Err(e) = self.finish_header(ty, Some(name), depth, false, None, start) {
                return self.fail(e);
            }
            return Ok(true);
        }
    }

    /// Repeats `read_to_following` until `tag_name == name` or stream end.
    pub fn read_to_following_named(&mut self, name: &str) -> NbtResult<bool> {
        loop {
            if !self.read_to_following()? {
                return Ok(false);
            }
            if self.current.tag_name.as_deref() == Some(name) {
                return Ok(true);
            }
        }
    }

    /// Advances only among descendants of the tag that was current when
    /// called; stops at a matching name or when that container is exited.
    pub fn read_to_descendant(&mut self, name: &str) -> NbtResult<bool> {
        let base_depth = self.current.depth;
        loop {
            if !self.read_to_following()? {
                return Ok(false);
            }
            if self.current.depth <= base_depth {
                return Ok(false);
            }
            if self.current.tag_name.as_deref() == Some(name) {
                return Ok(true);
            }
        }
    }

    /// Skips to the next sibling of the current tag, exiting intermediate
    /// containers. Reading past the last sibling returns false and leaves
    /// state on the parent's successor.
    pub fn read_to_next_sibling(&mut self) -> NbtResult<bool> {
        let target_depth = self.current.depth;
        loop {
            if !self.read_to_following()? {
                return Ok(false);
            }
            if self.current.depth <= target_depth {
                return Ok(self.current.depth == target_depth);
            }
        }
    }

    pub fn read_to_next_sibling_named(&mut self, name: &str) -> NbtResult<bool> {
        loop {
            if !self.read_to_next_sibling()? {
                return Ok(false);
            }
            if self.current.tag_name.as_deref() == Some(name) {
                return Ok(true);
            }
        }
    }

    // ---- value / subtree consumption ----

    /// Reads the current value tag's payload. Outside value context:
    /// *invalid-state*.
    pub fn read_value(&mut self) -> NbtResult<Value> {
        self.guard()?;
        if !self.current.tag_type.is_value_type() {
            return self.fail(NbtError::InvalidState {
                message: format!("{} is not a value tag", self.current.tag_type),
            });
        }
        if self.payload_consumed {
            if let Some(cached) = &self.cached_value {
                return Ok(cached.clone());
            }
            return self.fail(NbtError::InvalidState {
                message: "value already consumed and caching is disabled".to_string(),
            });
        }
        let endian = self.options.endian;
        let value = match self.current.tag_type {
            TagType::Byte => Value::Byte(codec::read_u8(&mut self.reader)?),
            TagType::Short => Value::Short(codec::read_i16(&mut self.reader, endian)?),
            TagType::Int => Value::Int(codec::read_i32(&mut self.reader, endian)?),
            TagType::Long => Value::Long(codec::read_i64(&mut self.reader, endian)?),
            TagType::Float => Value::Float(codec::read_f32(&mut self.reader, endian)?),
            TagType::Double => Value::Double(codec::read_f64(&mut self.reader, endian)?),
            TagType::String => Value::String(codec::read_string(&mut self.reader, endian)?),
            _ => unreachable!("guarded above"),
        };
        self.payload_consumed = true;
        if self.cache_tag_values {
            self.cached_value = Some(value.clone());
        }
        Ok(value)
    }

    /// As [`PullReader::read_value`] but applies the tag model's numeric
    /// widening rules.
    pub fn read_value_as<T: FromWidenedValue>(&mut self) -> NbtResult<T> {
        let value = self.read_value()?;
        T::widen(&value)
    }

    /// Valid only when positioned on a `List` tag. Reads every element into
    /// a typed array, applying the same widening as the tag model. Lists of
    /// compound/list elements fail with *invalid-state*.
    pub fn read_list_as_array<T: FromWidenedValue>(&mut self) -> NbtResult<Vec<T>> {
        self.guard()?;
        if self.current.tag_type != TagType::List {
            return self.fail(NbtError::InvalidState {
                message: "read_list_as_array requires the cursor to be on a List tag".to_string(),
            });
        }
        let element_type = self.current.list_type;
        if !element_type.is_value_type() {
            return self.fail(NbtError::InvalidState {
                message: format!("cannot read a list of {} as a scalar array", element_type),
            });
        }
        let len = self.current.tag_length.unwrap_or(0);
        let endian = self.options.endian;
        let mut out = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            let raw = match element_type {
                TagType::Byte => Value::Byte(codec::read_u8(&mut self.reader)?),
                TagType::Short => Value::Short(codec::read_i16(&mut self.reader, endian)?),
                TagType::Int => Value::Int(codec::read_i32(&mut self.reader, endian)?),
                TagType::Long => Value::Long(codec::read_i64(&mut self.reader, endian)?),
                TagType::Float => Value::Float(codec::read_f32(&mut self.reader, endian)?),
                TagType::Double => Value::Double(codec::read_f64(&mut self.reader, endian)?),
                TagType::String => Value::String(codec::read_string(&mut self.reader, endian)?),
                _ => unreachable!("guarded above"),
            };
            out.push(T::widen(&raw)?);
        }
        self.payload_consumed = true;
        self.pending_enter = false;
        Ok(out)
    }

    /// Materializes the current tag (and its subtree) as a [`Tag`],
    /// advancing past it. Raises *invalid-state* for an `End` marker
    /// surfaced with `skip_end_tags=false`.
    pub fn read_as_tag(&mut self) -> NbtResult<Tag> {
        self.guard()?;
        if self.current.tag_type == TagType::End {
            return self.fail(NbtError::InvalidState {
                message: "cannot materialize an end-of-compound marker".to_string(),
            });
        }
        let tag = self.materialize_current()?;
        self.payload_consumed = true;
        self.pending_enter = false;
        Ok(tag)
    }

    fn materialize_current(&mut self) -> NbtResult<Tag> {
        match self.current.tag_type {
            TagType::Byte
            | TagType::Short
            | TagType::Int
            | TagType::Long
            | TagType::Float
            | TagType::Double
            | TagType::String => Ok(match self.read_value()? {
                Value::Byte(v) => Tag::byte(v),
                Value::Short(v) => Tag::short(v),
                Value::Int(v) => Tag::int(v),
                Value::Long(v) => Tag::long(v),
                Value::Float(v) => Tag::float(v),
                Value::Double(v) => Tag::double(v),
                Value::String(v) => Tag::string(v),
            }),
            TagType::ByteArray => {
                let len = self.current.tag_length.unwrap_or(0);
                let mut buf = vec![0u8; len];
                self.reader
                    .read_exact(&mut buf)
                    .map_err(|_| NbtError::Truncated { while_reading: "byte array".to_string() })?;
                Ok(Tag::byte_array(buf))
            }
            TagType::IntArray => {
                let len = self.current.tag_length.unwrap_or(0);
                let mut values = Vec::with_capacity(len.min(1 << 20));
                for _ in 0..len {
                    values.push(codec::read_i32(&mut self.reader, self.options.endian)?);
                }
                Ok(Tag::int_array(values))
            }
            TagType::LongArray => {
                let len = self.current.tag_length.unwrap_or(0);
                let mut values = Vec::with_capacity(len.min(1 << 20));
                for _ in 0..len {
                    values.push(codec::read_i64(&mut self.reader, self.options.endian)?);
                }
                Ok(Tag::long_array(values))
            }
            TagType::Compound => read_tag_body(&mut self.reader, TagType::Compound, &self.options, self.current.depth),
            TagType::List => {
                let element_type = self.current.list_type;
                let len = self.current.tag_length.unwrap_or(0);
                let list = Tag::empty_list();
                for _ in 0..len {
                    let element =
                        read_tag_body(&mut self.reader, element_type, &self.options, self.current.depth + 1)?;
                    list.list_add(element)?;
                }
                if list.list_len().unwrap_or(0) == 0 {
                    list.commit_list_element_type(element_type)?;
                }
                Ok(list)
            }
            other => Err(NbtError::Malformed { reason: format!("cannot materialize {}", other) }),
        }
    }

    /// Skips the current tag and all descendants, returning the number of
    /// tags skipped (inclusive of the current one).
    pub fn skip(&mut self) -> NbtResult<u64> {
        self.guard()?;
        let count = match self.current.tag_type {
            TagType::Compound => {
                let mut n = 1u64;
                loop {
                    let id = codec::read_u8(&mut self.reader)?;
                    let ty = TagType::from_wire_byte(id)
                        .ok_or_else(|| NbtError::Malformed { reason: format!("unknown tag id {}", id) })?;
                    if ty == TagType::End {
                        break;
                    }
                    codec::read_string(&mut self.reader, self.options.endian)?;
                    n += self.skip_body(ty)?;
                }
                n
            }
            TagType::List => {
                let element_type = self.current.list_type;
                let len = self.current.tag_length.unwrap_or(0);
                let mut n = 1u64;
                for _ in 0..len {
                    n += self.skip_body(element_type)?;
                }
                n
            }
            _ => {
                self.skip_pending_payload()?;
                1
            }
        };
        self.payload_consumed = true;
        self.pending_enter = false;
        Ok(count)
    }

    fn skip_body(&mut self, ty: TagType) -> NbtResult<u64> {
        match ty {
            TagType::Byte => {
                codec::read_u8(&mut self.reader)?;
                Ok(1)
            }
            TagType::Short => {
                codec::read_i16(&mut self.reader, self.options.endian)?;
                Ok(1)
            }
            TagType::Int => {
                codec::read_i32(&mut self.reader, self.options.endian)?;
                Ok(1)
            }
            TagType::Long => {
                codec::read_i64(&mut self.reader, self.options.endian)?;
                Ok(1)
            }
            TagType::Float => {
                codec::read_f32(&mut self.reader, self.options.endian)?;
                Ok(1)
            }
            TagType::Double => {
                codec::read_f64(&mut self.reader, self.options.endian)?;
                Ok(1)
            }
            TagType::String => {
                codec::read_string(&mut self.reader, self.options.endian)?;
                Ok(1)
            }
            TagType::ByteArray => {
                let len = read_length(&mut self.reader, self.options.endian)?;
                codec::skip(&mut self.reader, len as u64)?;
                Ok(1)
            }
            TagType::IntArray => {
                let len = read_length(&mut self.reader, self.options.endian)?;
                codec::skip(&mut self.reader, len as u64 * 4)?;
                Ok(1)
            }
            TagType::LongArray => {
                let len = read_length(&mut self.reader, self.options.endian)?;
                codec::skip(&mut self.reader, len as u64 * 8)?;
                Ok(1)
            }
            TagType::Compound => {
                let mut n = 1u64;
                loop {
                    let id = codec::read_u8(&mut self.reader)?;
                    let child_ty = TagType::from_wire_byte(id)
                        .ok_or_else(|| NbtError::Malformed { reason: format!("unknown tag id {}", id) })?;
                    if child_ty == TagType::End {
                        break;
                    }
                    codec::read_string(&mut self.reader, self.options.endian)?;
                    n += self.skip_body(child_ty)?;
                }
                Ok(n)
            }
            TagType::List => {
                let id = codec::read_u8(&mut self.reader)?;
                let element_type = TagType::from_wire_byte(id).ok_or_else(|| NbtError::Malformed {
                    reason: format!("unknown list element id {}", id),
                })?;
                let len = read_length(&mut self.reader, self.options.endian)?;
                let mut n = 1u64;
                for _ in 0..len {
                    n += self.skip_body(element_type)?;
                }
                Ok(n)
            }
            TagType::End | TagType::Unknown => {
                Err(NbtError::Malformed { reason: "unexpected tag type while skipping".to_string() })
            }
        }
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
    fn walks_the_smallest_well_known_file() {
        let mut reader = PullReader::new(Cursor::new(hello_world_bytes()), ReaderOptions::new()).unwrap();
        assert_eq!(reader.root_name(), "hello world");
        assert!(reader.read_to_following().unwrap());
        assert_eq!(reader.tag_type(), TagType::String);
        assert_eq!(reader.tag_name(), Some("name"));
        assert_eq!(reader.depth(), 1);
        let value = reader.read_value().unwrap();
        assert_eq!(value, Value::String("Bananrama".to_string()));
        assert!(!reader.read_to_following().unwrap());
        assert!(reader.is_at_stream_end());
    }

    fn nested_list_document() -> Vec<u8> {
        // root: { outer: List<List<Byte>> [ [], [7] ] }
        let mut buf = vec![10, 0, 0];
        buf.push(9);
        buf.extend_from_slice(&[0, 5]);
        buf.extend_from_slice(b"outer");
        buf.push(9);
        buf.extend_from_slice(&2i32.to_be_bytes());
        buf.push(1);
        buf.extend_from_slice(&0i32.to_be_bytes());
        buf.push(1);
        buf.extend_from_slice(&1i32.to_be_bytes());
        buf.push(7);
        buf.push(0);
        buf
    }

    #[test]
    fn reports_list_type_and_depth_through_nesting() {
        let mut reader = PullReader::new(Cursor::new(nested_list_document()), ReaderOptions::new()).unwrap();
        assert!(reader.read_to_following().unwrap());
        assert_eq!(reader.tag_type(), TagType::List);
        assert_eq!(reader.current().list_type, TagType::List);
        assert_eq!(reader.current().tag_length, Some(2));
        assert_eq!(reader.depth(), 1);
        assert_eq!(reader.current().parent_name.as_deref(), Some(""));

        assert!(reader.read_to_following().unwrap());
        assert_eq!(reader.tag_type(), TagType::List);
        assert_eq!(reader.current().list_type, TagType::Byte);
        assert_eq!(reader.current().tag_length, Some(0));
        assert!(reader.current().is_list_element);
        assert_eq!(reader.current().list_index, Some(0));
        assert_eq!(reader.depth(), 2);

        assert!(reader.read_to_following().unwrap());
        assert_eq!(reader.current().list_index, Some(1));
        assert_eq!(reader.current().tag_length, Some(1));
        assert!(reader.read_to_following().unwrap());
        assert_eq!(reader.tag_type(), TagType::Byte);
        assert_eq!(reader.read_value().unwrap(), Value::Byte(7));

        assert!(!reader.read_to_following().unwrap());
    }

    #[test]
    fn skip_reports_count_and_advances_past_subtree() {
        let mut reader = PullReader::new(Cursor::new(nested_list_document()), ReaderOptions::new()).unwrap();
        assert!(reader.read_to_following().unwrap());
        let skipped = reader.skip().unwrap();
        assert_eq!(skipped, 4); // outer list + empty inner list + non-empty inner list + its byte
        assert!(!reader.read_to_following().unwrap());
    }

    #[test]
    fn read_as_tag_materializes_subtree_and_advances() {
        let mut reader = PullReader::new(Cursor::new(nested_list_document()), ReaderOptions::new()).unwrap();
        assert!(reader.read_to_following().unwrap());
        let outer = reader.read_as_tag().unwrap();
        assert_eq!(outer.list_len().unwrap(), 2);
        assert_eq!(outer.list_get(1).unwrap().list_get(0).unwrap().as_byte().unwrap(), 7);
        assert!(!reader.read_to_following().unwrap());
    }

    #[test]
    fn error_latches_and_rejects_further_operations() {
        let bytes = vec![10, 0, 0, 99];
        let mut reader = PullReader::new(Cursor::new(bytes), ReaderOptions::new()).unwrap();
        let err = reader.read_to_following().unwrap_err();
        assert!(matches!(err, NbtError::Malformed { .. }));
        assert!(reader.is_in_error_state());
        let err2 = reader.read_to_following().unwrap_err();
        assert!(matches!(err2, NbtError::InvalidState { .. }));
    }
}
