//! The `serde::Serializer` bridge: arbitrary `Serialize` types in, a
//! [`Tag`] tree out.
//!
//! `Tag::byte` is `u8`, so `u8` is the exact-fit, always-on path and `i8`
//! reinterprets its bits, also always on — both are one byte wide, so
//! neither loses information. Every container builds a plain
//! `HashMap<String, Tag>` first, only becoming a real `Tag::compound()` at
//! `end()`, since `Tag` enforces parent-exclusivity and would reject a
//! child inserted into two different in-progress maps.

use std::collections::HashMap;
use std::fmt::Display;

use serde::ser::{
    SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant, SerializeTuple,
    SerializeTupleStruct, SerializeTupleVariant,
};
use serde::{Serialize, Serializer};

use crate::error::NbtError;
use crate::tag::Tag;

fn build_compound(entries: HashMap<String, Tag>) -> Result<Tag, NbtError> {
    let compound = Tag::compound();
    for (name, value) in entries {
        compound.compound_add(name, value)?;
    }
    Ok(compound)
}

fn build_list(elements: Vec<Tag>) -> Result<Tag, NbtError> {
    let list = Tag::empty_list();
    for element in elements {
        list.list_add(element)?;
    }
    Ok(list)
}

fn external(name: &str, value: Tag) -> Result<Tag, NbtError> {
    let compound = Tag::compound();
    compound.compound_add(name.to_string(), value)?;
    Ok(compound)
}

pub struct NbtSerializer;

#[allow(unused_variables)]
impl Serializer for NbtSerializer {
    type Ok = Option<Tag>;
    type Error = NbtError;
    type SerializeSeq = NbtSeqSerializer;
    type SerializeTuple = NbtSeqSerializer;
    type SerializeTupleStruct = NbtSeqSerializer;
    type SerializeTupleVariant = NbtVariantSeqSerializer;
    type SerializeMap = NbtMapSerializer;
    type SerializeStruct = NbtStructSerializer;
    type SerializeStructVariant = NbtVariantStructSerializer;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        #[cfg(feature = "serde_boolean")]
        return Ok(Some(Tag::byte(v as u8)));

        #[cfg(not(feature = "serde_boolean"))]
        return Err(NbtError::Custom("bool is unserializable without the serde_boolean feature".to_string()));
    }

    fn serialize_i8(self, v: i8) -> Result<Self::Ok, Self::Error> {
        Ok(Some(Tag::byte(v as u8)))
    }

    fn serialize_i16(self, v: i16) -> Result<Self::Ok, Self::Error> {
        Ok(Some(Tag::short(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Self::Ok, Self::Error> {
        Ok(Some(Tag::int(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Self::Ok, Self::Error> {
        Ok(Some(Tag::long(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Self::Ok, Self::Error> {
        Ok(Some(Tag::byte(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Self::Ok, Self::Error> {
        #[cfg(feature = "serde_unsigned")]
        return Ok(Some(Tag::short(v as i16)));

        #[cfg(not(feature = "serde_unsigned"))]
        return Err(NbtError::Custom("u16 is unserializable without the serde_unsigned feature".to_string()));
    }

    fn serialize_u32(self, v: u32) -> Result<Self::Ok, Self::Error> {
        #[cfg(feature = "serde_unsigned")]
        return Ok(Some(Tag::int(v as i32)));

        #[cfg(not(feature = "serde_unsigned"))]
        return Err(NbtError::Custom("u32 is unserializable without the serde_unsigned feature".to_string()));
    }

    fn serialize_u64(self, v: u64) -> Result<Self::Ok, Self::Error> {
        #[cfg(feature = "serde_unsigned")]
        return Ok(Some(Tag::long(v as i64)));

        #[cfg(not(feature = "serde_unsigned"))]
        return Err(NbtError::Custom("u64 is unserializable without the serde_unsigned feature".to_string()));
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok, Self::Error> {
        Ok(Some(Tag::float(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok, Self::Error> {
        Ok(Some(Tag::double(v)))
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok, Self::Error> {
        Ok(Some(Tag::string(v.to_string())))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok, Self::Error> {
        Ok(Some(Tag::string(v)))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Self::Ok, Self::Error> {
        Err(NbtError::Custom("byte slices are unserializable; use an explicit byte array tag".to_string()))
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(None)
    }

    fn serialize_some<T: ?Sized>(self, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Ok(None)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        Ok(None)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(Some(Tag::string(variant)))
    }

    fn serialize_newtype_struct<T: ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize,
    {
        match Serialize::serialize(value, self)? {
            Some(tag) => Ok(Some(external(variant, tag)?)),
            None => Ok(None),
        }
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Ok(NbtSeqSerializer::new())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Ok(NbtSeqSerializer::new())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Ok(NbtSeqSerializer::new())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Ok(NbtVariantSeqSerializer::new(variant))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Ok(NbtMapSerializer::new())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(NbtStructSerializer::new())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Ok(NbtVariantStructSerializer::new(variant))
    }

    fn collect_str<T: ?Sized>(self, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: Display,
    {
        Ok(Some(Tag::string(value.to_string())))
    }
}

pub struct NbtSeqSerializer {
    elements: Vec<Tag>,
}
impl NbtSeqSerializer {
    fn new() -> Self {
        NbtSeqSerializer { elements: Vec::new() }
    }
}

impl SerializeSeq for NbtSeqSerializer {
    type Ok = Option<Tag>;
    type Error = NbtError;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        if let Some(value) = value.serialize(NbtSerializer)? {
            self.elements.push(value);
        }
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Some(build_list(self.elements)?))
    }
}
impl SerializeTuple for NbtSeqSerializer {
    type Ok = Option<Tag>;
    type Error = NbtError;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        SerializeSeq::end(self)
    }
}

impl SerializeTupleStruct for NbtSeqSerializer {
    type Ok = Option<Tag>;
    type Error = NbtError;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        SerializeSeq::end(self)
    }
}

pub struct NbtVariantSeqSerializer {
    variant: String,
    elements: Vec<Tag>,
}
impl NbtVariantSeqSerializer {
    fn new(variant: &str) -> Self {
        Self { variant: variant.to_string(), elements: Vec::new() }
    }
}
impl SerializeTupleVariant for NbtVariantSeqSerializer {
    type Ok = Option<Tag>;
    type Error = NbtError;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        if let Some(value) = value.serialize(NbtSerializer)? {
            self.elements.push(value);
        }
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        let list = build_list(self.elements)?;
        Ok(Some(external(&self.variant, list)?))
    }
}

pub struct NbtMapSerializer {
    map: HashMap<String, Tag>,
    key: Option<String>,
}
impl NbtMapSerializer {
    fn new() -> Self {
        Self { map: HashMap::new(), key: None }
    }
}

impl SerializeMap for NbtMapSerializer {
    type Ok = Option<Tag>;
    type Error = NbtError;

    fn serialize_key<T: ?Sized>(&mut self, key: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        if let Some(tag) = key.serialize(NbtSerializer)? {
            self.key = Some(tag.as_string().map_err(|_| {
                NbtError::Custom("map keys must serialize to a string".to_string())
            })?);
        }
        Ok(())
    }

    fn serialize_value<T: ?Sized>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        if let Some(key) = self.key.take() {
            if let Some(value) = value.serialize(NbtSerializer)? {
                self.map.insert(key, value);
            }
        }
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Some(build_compound(self.map)?))
    }
}

pub struct NbtStructSerializer {
    map: HashMap<String, Tag>,
}
impl NbtStructSerializer {
    fn new() -> Self {
        Self { map: HashMap::new() }
    }
}
impl SerializeStruct for NbtStructSerializer {
    type Ok = Option<Tag>;
    type Error = NbtError;

    fn serialize_field<T: ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        if let Some(value) = value.serialize(NbtSerializer)? {
            self.map.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Some(build_compound(self.map)?))
    }
}

pub struct NbtVariantStructSerializer {
    map: HashMap<String, Tag>,
    variant: String,
}
impl NbtVariantStructSerializer {
    fn new(variant: &str) -> Self {
        Self { map: HashMap::new(), variant: variant.to_string() }
    }
}
impl SerializeStructVariant for NbtVariantStructSerializer {
    type Ok = Option<Tag>;
    type Error = NbtError;

    fn serialize_field<T: ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize,
    {
        if let Some(value) = value.serialize(NbtSerializer)? {
            self.map.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        let compound = build_compound(self.map)?;
        Ok(Some(external(&self.variant, compound)?))
    }
}

/// Serializes `value` to a detached [`Tag`], or `None` if it serialized to
/// a serde unit/option-none (nothing to represent on the wire).
pub fn encode_tag<T: Serialize>(value: &T) -> Result<Option<Tag>, NbtError> {
    value.serialize(NbtSerializer)
}

/// Serializes `value` to a root document: a `(name, compound)` pair ready
/// to hand to [`crate::writer::write_root`]. Fails if `value` does not
/// serialize to a compound (a struct, map, or struct-like enum variant).
pub fn encode_named<T: Serialize>(value: &T, name: &str) -> Result<(String, Tag), NbtError> {
    match encode_tag(value)? {
        Some(tag) if tag.is_compound() => Ok((name.to_string(), tag)),
        Some(tag) => Err(NbtError::Custom(format!(
            "root document must serialize to a compound, found a {}",
            tag.tag_type()
        ))),
        None => Err(NbtError::Custom("value serialized to nothing".to_string())),
    }
}

/// Serializes `value` to an unnamed (`""`) root document.
pub fn encode<T: Serialize>(value: &T) -> Result<(String, Tag), NbtError> {
    encode_named(value, "")
}
