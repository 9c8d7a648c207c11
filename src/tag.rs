//! The tagged data model: a twelve-variant payload behind a parent-aware
//! handle.
//!
//! A bare value enum (`HashMap<String, Tag>` for compounds, no parent
//! tracking) can't support parent-exclusivity or identity-based
//! `remove`/`contains`, since nothing about the value says who owns it.
//! `Tag` is instead a cheap-to-clone handle (`Rc<RefCell<TagNode>>`) around
//! an internal payload, with each node holding an optional name and a
//! non-owning (`Weak`) back-reference to its parent.
//!
//! `Tag` implements `Clone` as the cheap `Rc` aliasing every handle-based
//! tree type in the ecosystem uses (the same shape as `Rc<T>` itself); a
//! deep, fully detached copy is a named constructor instead, not a hook into
//! `std::clone::Clone`, exposed separately as [`Tag::deep_clone`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{NbtError, NbtResult};
use crate::tag_type::TagType;

/// The twelve wire payloads plus the two container shapes. Not exposed
/// directly; callers go through `Tag`'s typed accessors instead of
/// pattern-matching, since the payload lives behind a `RefCell`.
#[derive(Debug)]
pub(crate) enum TagValue {
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    List { element_type: TagType, items: Vec<Tag> },
    Compound(HashMap<String, Tag>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl TagValue {
    pub(crate) fn tag_type(&self) -> TagType {
        match self {
            TagValue::Byte(_) => TagType::Byte,
            TagValue::Short(_) => TagType::Short,
            TagValue::Int(_) => TagType::Int,
            TagValue::Long(_) => TagType::Long,
            TagValue::Float(_) => TagType::Float,
            TagValue::Double(_) => TagType::Double,
            TagValue::ByteArray(_) => TagType::ByteArray,
            TagValue::String(_) => TagType::String,
            TagValue::List { .. } => TagType::List,
            TagValue::Compound(_) => TagType::Compound,
            TagValue::IntArray(_) => TagType::IntArray,
            TagValue::LongArray(_) => TagType::LongArray,
        }
    }
}

#[derive(Debug)]
pub(crate) struct TagNode {
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<Weak<RefCell<TagNode>>>,
    pub(crate) value: TagValue,
}

/// A single NBT tag: a typed, optionally-named node that may sit inside a
/// list or compound, or stand detached.
///
/// Cloning a `Tag` is a cheap, shared-handle clone (like cloning an `Rc`) —
/// both handles keep pointing at the same node. Use [`Tag::deep_clone`] to
/// produce an independent, fully detached copy.
#[derive(Debug, Clone)]
pub struct Tag(pub(crate) Rc<RefCell<TagNode>>);

impl Tag {
    pub(crate) fn from_value(value: TagValue) -> Tag {
        Tag(Rc::new(RefCell::new(TagNode { name: None, parent: None, value })))
    }

    // ---- primitive constructors ----

    pub fn byte(value: u8) -> Tag {
        Tag::from_value(TagValue::Byte(value))
    }
    pub fn short(value: i16) -> Tag {
        Tag::from_value(TagValue::Short(value))
    }
    pub fn int(value: i32) -> Tag {
        Tag::from_value(TagValue::Int(value))
    }
    pub fn long(value: i64) -> Tag {
        Tag::from_value(TagValue::Long(value))
    }
    pub fn float(value: f32) -> Tag {
        Tag::from_value(TagValue::Float(value))
    }
    pub fn double(value: f64) -> Tag {
        Tag::from_value(TagValue::Double(value))
    }
    pub fn byte_array(value: Vec<u8>) -> Tag {
        Tag::from_value(TagValue::ByteArray(value))
    }
    pub fn string<S: Into<String>>(value: S) -> Tag {
        Tag::from_value(TagValue::String(value.into()))
    }
    pub fn int_array(value: Vec<i32>) -> Tag {
        Tag::from_value(TagValue::IntArray(value))
    }
    pub fn long_array(value: Vec<i64>) -> Tag {
        Tag::from_value(TagValue::LongArray(value))
    }

    /// An empty list with no fixed element type yet (invariant 4: the type
    /// may be set freely until the first element is added).
    pub fn empty_list() -> Tag {
        Tag::from_value(TagValue::List { element_type: TagType::Unknown, items: Vec::new() })
    }

    pub fn compound() -> Tag {
        Tag::from_value(TagValue::Compound(HashMap::new()))
    }

    /// A detached, deep copy of this tag and its entire subtree. Unlike
    /// `Clone::clone`, the result shares nothing with the original: mutating
    /// one never affects the other.
    pub fn deep_clone(&self) -> Tag {
        let node = self.0.borrow();
        let value = match &node.value {
            TagValue::Byte(v) => TagValue::Byte(*v),
            TagValue::Short(v) => TagValue::Short(*v),
            TagValue::Int(v) => TagValue::Int(*v),
            TagValue::Long(v) => TagValue::Long(*v),
            TagValue::Float(v) => TagValue::Float(*v),
            TagValue::Double(v) => TagValue::Double(*v),
            TagValue::ByteArray(v) => TagValue::ByteArray(v.clone()),
            TagValue::String(v) => TagValue::String(v.clone()),
            TagValue::IntArray(v) => TagValue::IntArray(v.clone()),
            TagValue::LongArray(v) => TagValue::LongArray(v.clone()),
            TagValue::List { element_type, items } => TagValue::List {
                element_type: *element_type,
                items: items.iter().map(Tag::deep_clone).collect(),
            },
            TagValue::Compound(map) => {
                TagValue::Compound(map.iter().map(|(k, v)| (k.clone(), v.deep_clone())).collect())
            }
        };
        let clone = Tag::from_value(value);
        clone.0.borrow_mut().name = node.name.clone();
        // children cloned above are fresh, detached Tags (no parent yet);
        // wire them up to the clone, not the original.
        match &clone.0.borrow().value {
            TagValue::List { items, .. } => {
                for item in items {
                    item.0.borrow_mut().parent = Some(Rc::downgrade(&clone.0));
                }
            }
            TagValue::Compound(map) => {
                for child in map.values() {
                    child.0.borrow_mut().parent = Some(Rc::downgrade(&clone.0));
                }
            }
            _ => {}
        }
        clone
    }

    pub fn tag_type(&self) -> TagType {
        self.0.borrow().value.tag_type()
    }

    pub fn name(&self) -> Option<String> {
        self.0.borrow().name.clone()
    }

    /// Sets this tag's name. Only meaningful for tags owned by a compound;
    /// the compound itself is the source of truth when the name changes via
    /// `rename`, but tags can also be named before being inserted.
    pub(crate) fn set_name(&self, name: Option<String>) {
        self.0.borrow_mut().name = name;
    }

    /// The tag currently holding this one, if any.
    pub fn parent(&self) -> Option<Tag> {
        self.0.borrow().parent.as_ref().and_then(Weak::upgrade).map(Tag)
    }

    pub(crate) fn set_parent(&self, parent: Option<&Tag>) {
        self.0.borrow_mut().parent = parent.map(|p| Rc::downgrade(&p.0));
    }

    /// True if this and `other` are handles to the very same node (pointer
    /// identity, not structural equality).
    pub fn ptr_eq(a: &Tag, b: &Tag) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// This tag's position in its root, e.g. `.a.b[3].c`. A child of a
    /// compound contributes `.name`; a child of a list contributes
    /// `[index]`.
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut current = self.clone();
        loop {
            let parent = match current.parent() {
                Some(p) => p,
                None => break,
            };
            match &parent.0.borrow().value {
                TagValue::Compound(_) => {
                    let name = current.name().unwrap_or_default();
                    segments.push(format!(".{}", name));
                }
                TagValue::List { items, .. } => {
                    let index = items.iter().position(|t| Tag::ptr_eq(t, &current)).unwrap_or(0);
                    segments.push(format!("[{}]", index));
                }
                _ => {}
            }
            current = parent;
        }
        segments.reverse();
        segments.join("")
    }

    pub fn is_value(&self) -> bool {
        self.tag_type().is_value_type()
    }
    pub fn is_array(&self) -> bool {
        self.tag_type().is_array_type()
    }
    pub fn is_list(&self) -> bool {
        self.tag_type() == TagType::List
    }
    pub fn is_compound(&self) -> bool {
        self.tag_type() == TagType::Compound
    }

    fn type_mismatch(&self, requested: &'static str) -> NbtError {
        NbtError::TypeMismatch { found: self.tag_type(), requested }
    }

    // ---- numeric widening accessors: each only ever widens, never narrows ----

    pub fn as_byte(&self) -> NbtResult<u8> {
        match &self.0.borrow().value {
            TagValue::Byte(v) => Ok(*v),
            _ => Err(self.type_mismatch("byte")),
        }
    }

    pub fn as_short(&self) -> NbtResult<i16> {
        match &self.0.borrow().value {
            TagValue::Byte(v) => Ok(*v as i16),
            TagValue::Short(v) => Ok(*v),
            _ => Err(self.type_mismatch("short")),
        }
    }

    pub fn as_int(&self) -> NbtResult<i32> {
        match &self.0.borrow().value {
            TagValue::Byte(v) => Ok(*v as i32),
            TagValue::Short(v) => Ok(*v as i32),
            TagValue::Int(v) => Ok(*v),
            _ => Err(self.type_mismatch("int")),
        }
    }

    pub fn as_long(&self) -> NbtResult<i64> {
        match &self.0.borrow().value {
            TagValue::Byte(v) => Ok(*v as i64),
            TagValue::Short(v) => Ok(*v as i64),
            TagValue::Int(v) => Ok(*v as i64),
            TagValue::Long(v) => Ok(*v),
            _ => Err(self.type_mismatch("long")),
        }
    }

    /// Long→float and Double→float both lose precision; this is accepted
    /// as a widening anyway, same as the other numeric accessors.
    pub fn as_float(&self) -> NbtResult<f32> {
        match &self.0.borrow().value {
            TagValue::Byte(v) => Ok(*v as f32),
            TagValue::Short(v) => Ok(*v as f32),
            TagValue::Int(v) => Ok(*v as f32),
            TagValue::Long(v) => Ok(*v as f32),
            TagValue::Float(v) => Ok(*v),
            TagValue::Double(v) => Ok(*v as f32),
            _ => Err(self.type_mismatch("float")),
        }
    }

    pub fn as_double(&self) -> NbtResult<f64> {
        match &self.0.borrow().value {
            TagValue::Byte(v) => Ok(*v as f64),
            TagValue::Short(v) => Ok(*v as f64),
            TagValue::Int(v) => Ok(*v as f64),
            TagValue::Long(v) => Ok(*v as f64),
            TagValue::Float(v) => Ok(*v as f64),
            TagValue::Double(v) => Ok(*v),
            _ => Err(self.type_mismatch("double")),
        }
    }

    /// Every primitive type widens to its string representation; only
    /// `String` itself is exact.
    pub fn as_string(&self) -> NbtResult<String> {
        match &self.0.borrow().value {
            TagValue::Byte(v) => Ok(v.to_string()),
            TagValue::Short(v) => Ok(v.to_string()),
            TagValue::Int(v) => Ok(v.to_string()),
            TagValue::Long(v) => Ok(v.to_string()),
            TagValue::Float(v) => Ok(v.to_string()),
            TagValue::Double(v) => Ok(v.to_string()),
            TagValue::String(v) => Ok(v.clone()),
            _ => Err(self.type_mismatch("string")),
        }
    }

    pub fn as_byte_array(&self) -> NbtResult<Vec<u8>> {
        match &self.0.borrow().value {
            TagValue::ByteArray(v) => Ok(v.clone()),
            _ => Err(self.type_mismatch("byte[]")),
        }
    }

    pub fn as_int_array(&self) -> NbtResult<Vec<i32>> {
        match &self.0.borrow().value {
            TagValue::IntArray(v) => Ok(v.clone()),
            _ => Err(self.type_mismatch("int[]")),
        }
    }

    pub fn as_long_array(&self) -> NbtResult<Vec<i64>> {
        match &self.0.borrow().value {
            TagValue::LongArray(v) => Ok(v.clone()),
            _ => Err(self.type_mismatch("long[]")),
        }
    }

    /// Pretty-prints one line per primitive/array tag and indented blocks
    /// for compounds/lists, using `indent` as the per-level indent string.
    /// Pass `None` to fall back to the process-wide
    /// [`crate::config::default_indent_string`].
    pub fn write_pretty(&self, f: &mut fmt::Formatter<'_>, indent: Option<&str>) -> fmt::Result {
        let owned_default;
        let indent = match indent {
            Some(i) => i,
            None => {
                owned_default = crate::config::default_indent_string();
                &owned_default
            }
        };
        self.write_pretty_at(f, indent, 0)
    }

    fn write_pretty_at(&self, f: &mut fmt::Formatter<'_>, indent: &str, depth: usize) -> fmt::Result {
        let pad = indent.repeat(depth);
        let node = self.0.borrow();
        let label = node.name.as_deref().unwrap_or("");
        match &node.value {
            TagValue::Compound(map) => {
                writeln!(f, "{}{}({}): {} entries", pad, node.value.tag_type(), label, map.len())?;
                writeln!(f, "{}{{", pad)?;
                let mut names: Vec<&String> = map.keys().collect();
                names.sort();
                for name in names {
                    map.get(name).unwrap().write_pretty_at(f, indent, depth + 1)?;
                }
                writeln!(f, "{}}}", pad)
            }
            TagValue::List { element_type, items } => {
                writeln!(
                    f,
                    "{}{}({}): {} entries of {}",
                    pad,
                    node.value.tag_type(),
                    label,
                    items.len(),
                    element_type
                )?;
                writeln!(f, "{}{{", pad)?;
                for item in items {
                    item.write_pretty_at(f, indent, depth + 1)?;
                }
                writeln!(f, "{}}}", pad)
            }
            _ => writeln!(f, "{}{}({}): {}", pad, node.value.tag_type(), label, self.describe_value()),
        }
    }

    fn describe_value(&self) -> String {
        match &self.0.borrow().value {
            TagValue::Byte(v) => v.to_string(),
            TagValue::Short(v) => v.to_string(),
            TagValue::Int(v) => v.to_string(),
            TagValue::Long(v) => v.to_string(),
            TagValue::Float(v) => v.to_string(),
            TagValue::Double(v) => v.to_string(),
            TagValue::ByteArray(v) => format!("[{} bytes]", v.len()),
            TagValue::String(v) => v.clone(),
            TagValue::IntArray(v) => format!("[{} ints]", v.len()),
            TagValue::LongArray(v) => format!("[{} longs]", v.len()),
            TagValue::List { .. } | TagValue::Compound(_) => unreachable!("handled by caller"),
        }
    }
}

/// Structural equality: same type, same name, same value, recursively. Two
/// handles to the same node are trivially structurally equal, but this does
/// **not** imply identity — use [`Tag::ptr_eq`] for that.
impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        let a = self.0.borrow();
        let b = other.0.borrow();
        if a.name != b.name {
            return false;
        }
        match (&a.value, &b.value) {
            (TagValue::Byte(x), TagValue::Byte(y)) => x == y,
            (TagValue::Short(x), TagValue::Short(y)) => x == y,
            (TagValue::Int(x), TagValue::Int(y)) => x == y,
            (TagValue::Long(x), TagValue::Long(y)) => x == y,
            (TagValue::Float(x), TagValue::Float(y)) => x.to_bits() == y.to_bits(),
            (TagValue::Double(x), TagValue::Double(y)) => x.to_bits() == y.to_bits(),
            (TagValue::ByteArray(x), TagValue::ByteArray(y)) => x == y,
            (TagValue::String(x), TagValue::String(y)) => x == y,
            (TagValue::IntArray(x), TagValue::IntArray(y)) => x == y,
            (TagValue::LongArray(x), TagValue::LongArray(y)) => x == y,
            (
                TagValue::List { element_type: et1, items: i1 },
                TagValue::List { element_type: et2, items: i2 },
            ) => et1 == et2 && i1 == i2,
            (TagValue::Compound(m1), TagValue::Compound(m2)) => {
                if m1.len() != m2.len() {
                    return false;
                }
                drop(a);
                drop(b);
                m1.iter().all(|(k, v)| other.compound_get(k).map_or(false, |o| &o == v))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_pretty(f, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_clone_is_fully_detached() {
        let root = Tag::compound();
        root.compound_add("age", Tag::byte(18)).unwrap();
        let clone = root.deep_clone();
        clone.compound_add("extra", Tag::byte(1)).unwrap();
        assert!(root.compound_get("extra").is_none());
        assert_eq!(clone.compound_get("age").unwrap().as_byte().unwrap(), 18);
    }

    #[test]
    fn widening_accessors_only_ever_widen() {
        let b = Tag::byte(5);
        assert_eq!(b.as_byte().unwrap(), 5);
        assert_eq!(b.as_short().unwrap(), 5);
        assert_eq!(b.as_long().unwrap(), 5);
        assert_eq!(b.as_string().unwrap(), "5");

        let long = Tag::long(10);
        assert!(long.as_int().is_err());
        assert!(long.as_byte().is_err());
        assert_eq!(long.as_float().unwrap(), 10.0);

        let double = Tag::double(2.5);
        assert_eq!(double.as_float().unwrap(), 2.5);
        assert!(double.as_long().is_err());

        let s = Tag::string("hi");
        assert!(s.as_byte().is_err());
        assert_eq!(s.as_string().unwrap(), "hi");
    }

    #[test]
    fn path_reflects_parent_chain() {
        let root = Tag::compound();
        let list = Tag::empty_list();
        root.compound_add("items", list.clone()).unwrap();
        let child = Tag::byte(1);
        list.list_add(child.clone()).unwrap();
        assert_eq!(child.path(), ".items[0]");
    }
}
