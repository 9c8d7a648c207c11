//! Black-box, whole-document scenarios that don't fit neatly beside a
//! single module: end-to-end cases with literal input/output, plus the
//! boundary cases that only show up once several modules are wired
//! together (tree reader/writer, file façade, compression,
//! selector-filtered load).

use nbtwire::reader::{read_root, read_root_filtered, Selector};
use nbtwire::writer::write_root;
use nbtwire::{Codec, Endian, ReaderOptions, Tag, WriterOptions};
use std::io::Cursor;

fn round_trip(root: &Tag, name: &str, options: &WriterOptions) -> (String, Tag) {
    let mut bytes = Vec::new();
    write_root(&mut bytes, name, root, options).unwrap();
    read_root(&mut Cursor::new(bytes), &ReaderOptions::new()).unwrap()
}

#[test]
fn smallest_file_round_trips_byte_identical() {
    let bytes = vec![
        0x0A, 0x00, 0x0B, b'h', b'e', b'l', b'l', b'o', b' ', b'w', b'o', b'r', b'l', b'd', 0x08,
        0x00, 0x04, b'n', b'a', b'm', b'e', 0x00, 0x09, b'B', b'a', b'n', b'a', b'n', b'r', b'a',
        b'm', b'a', 0x00,
    ];
    let (name, root) = read_root(&mut Cursor::new(bytes.clone()), &ReaderOptions::new()).unwrap();
    assert_eq!(name, "hello world");
    assert_eq!(root.compound_get("name").unwrap().as_string().unwrap(), "Bananrama");

    let mut rewritten = Vec::new();
    write_root(&mut rewritten, &name, &root, &WriterOptions::new()).unwrap();
    assert_eq!(rewritten, bytes);
}

#[test]
fn filtered_load_prunes_a_named_subtree_and_keeps_siblings() {
    let root = Tag::compound();
    root.compound_add("nested compound test", {
        let inner = Tag::compound();
        inner.compound_add("egg", Tag::string("yes")).unwrap();
        inner
    })
    .unwrap();
    let longs = Tag::empty_list();
    for v in 11i64..=15 {
        longs.list_add(Tag::long(v)).unwrap();
    }
    root.compound_add("listTest (long)", longs).unwrap();

    let mut bytes = Vec::new();
    write_root(&mut bytes, "", &root, &WriterOptions::new()).unwrap();

    let selector: &Selector = &|_ty, name, _parent| name != Some("nested compound test");
    let (_, filtered) =
        read_root_filtered(&mut Cursor::new(bytes), &ReaderOptions::new(), Some(selector)).unwrap();

    assert!(!filtered.compound_contains("nested compound test"));
    let longs = filtered.compound_get("listTest (long)").unwrap();
    assert_eq!(longs.list_len().unwrap(), 5);
    for (i, v) in (11i64..=15).enumerate() {
        assert_eq!(longs.list_get(i).unwrap().as_long().unwrap(), v);
    }
}

#[test]
fn list_of_lists_with_empty_inner_preserves_element_types() {
    let root = Tag::compound();
    root.compound_add("emptyList", Tag::empty_list()).unwrap();

    let listy = Tag::empty_list();
    listy.list_add(Tag::empty_list()).unwrap();
    root.compound_add("listyList", listy).unwrap();

    let (_, read_back) = round_trip(&root, "", &WriterOptions::new());

    let empty_list = read_back.compound_get("emptyList").unwrap();
    assert_eq!(empty_list.list_len().unwrap(), 0);
    assert_eq!(empty_list.list_element_type().unwrap(), nbtwire::TagType::End);

    let listy_list = read_back.compound_get("listyList").unwrap();
    assert_eq!(listy_list.list_len().unwrap(), 1);
    assert_eq!(listy_list.list_element_type().unwrap(), nbtwire::TagType::List);
    let inner = listy_list.list_get(0).unwrap();
    assert_eq!(inner.list_element_type().unwrap(), nbtwire::TagType::End);
    assert_eq!(inner.list_len().unwrap(), 0);
}

#[test]
fn round_trip_holds_across_endianness() {
    let root = Tag::compound();
    root.compound_add("age", Tag::byte(18)).unwrap();
    root.compound_add("score", Tag::int(-123_456)).unwrap();
    root.compound_add("pi", Tag::double(std::f64::consts::PI)).unwrap();

    for endian in [Endian::Big, Endian::Little] {
        let writer_options = WriterOptions::new().with_endian(endian);
        let mut bytes = Vec::new();
        write_root(&mut bytes, "doc", &root, &writer_options).unwrap();

        let reader_options = ReaderOptions::new().with_endian(endian);
        let (name, read_back) = read_root(&mut Cursor::new(bytes), &reader_options).unwrap();
        assert_eq!(name, "doc");
        assert_eq!(read_back.compound_get("age").unwrap().as_byte().unwrap(), 18);
        assert_eq!(read_back.compound_get("score").unwrap().as_int().unwrap(), -123_456);
    }
}

#[test]
fn boundary_cases_round_trip() {
    let root = Tag::compound();
    root.compound_add("emptyCompound", Tag::compound()).unwrap();
    root.compound_add("emptyString", Tag::string("")).unwrap();
    root.compound_add("emptyByteArray", Tag::byte_array(Vec::new())).unwrap();
    root.compound_add("emptyIntArray", Tag::int_array(Vec::new())).unwrap();
    root.compound_add("emptyLongArray", Tag::long_array(Vec::new())).unwrap();

    let near_limit = "x".repeat(32767);
    root.compound_add("nearLimitString", Tag::string(near_limit.clone())).unwrap();

    let nested = Tag::empty_list();
    let middle = Tag::empty_list();
    let inner = Tag::empty_list();
    inner.list_add(Tag::int(7)).unwrap();
    middle.list_add(inner).unwrap();
    nested.list_add(middle).unwrap();
    root.compound_add("listOfListOfList", nested).unwrap();

    let siblings = Tag::compound();
    let sibling_list = Tag::empty_list();
    sibling_list.list_add(Tag::string("a")).unwrap();
    siblings.compound_add("siblingList", sibling_list).unwrap();
    siblings.compound_add("siblingCompound", Tag::compound()).unwrap();
    siblings.compound_add("siblingValue", Tag::int(1)).unwrap();
    root.compound_add("siblings", siblings).unwrap();

    let (_, read_back) = round_trip(&root, "", &WriterOptions::new());

    assert_eq!(read_back.compound_get("emptyCompound").unwrap().compound_len(), 0);
    assert_eq!(read_back.compound_get("emptyString").unwrap().as_string().unwrap(), "");
    assert!(read_back.compound_get("emptyByteArray").unwrap().as_byte_array().unwrap().is_empty());
    assert!(read_back.compound_get("emptyIntArray").unwrap().as_int_array().unwrap().is_empty());
    assert!(read_back.compound_get("emptyLongArray").unwrap().as_long_array().unwrap().is_empty());
    assert_eq!(
        read_back.compound_get("nearLimitString").unwrap().as_string().unwrap(),
        near_limit
    );

    let nested = read_back.compound_get("listOfListOfList").unwrap();
    let middle = nested.list_get(0).unwrap();
    let inner = middle.list_get(0).unwrap();
    assert_eq!(inner.list_get(0).unwrap().as_int().unwrap(), 7);

    let siblings = read_back.compound_get("siblings").unwrap();
    assert_eq!(
        siblings.compound_get("siblingList").unwrap().list_get(0).unwrap().as_string().unwrap(),
        "a"
    );
    assert_eq!(siblings.compound_get("siblingCompound").unwrap().compound_len(), 0);
    assert_eq!(siblings.compound_get("siblingValue").unwrap().as_int().unwrap(), 1);
}

#[test]
fn negative_lengths_are_malformed() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&[0x0A, 0x00, 0x00]);
    buf.push(0x07); // TAG_Byte_Array
    buf.extend_from_slice(&[0x00, 0x01, b'x']);
    buf.extend_from_slice(&(-1i32).to_be_bytes());
    buf.push(0x00);

    let err = read_root(&mut Cursor::new(buf), &ReaderOptions::new()).unwrap_err();
    assert!(matches!(err, nbtwire::NbtError::Malformed { .. }));
}

#[test]
fn push_writer_reports_list_size_mismatch_on_end_list() {
    let mut writer =
        nbtwire::push::PushWriter::new(Vec::new(), "r", WriterOptions::new()).unwrap();
    writer.begin_list(Some("l"), nbtwire::TagType::Int, 2).unwrap();
    writer.write_int(None, 1).unwrap();
    let err = writer.end_list().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("expected 2"), "{message}");
    assert!(message.contains("written 1"), "{message}");
}

/// A tiny deterministic PRNG (xorshift64*) so the 1024-string scenario is
/// reproducible without pulling in a `rand` dependency just for one test.
struct Xorshift64(u64);
impl Xorshift64 {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    fn next_codepoint(&mut self) -> char {
        loop {
            let candidate = (self.next() % 0x11_0000) as u32;
            let excluded = (0xD800..=0xDFFF).contains(&candidate) // surrogates
                || candidate < 0x20 // controls
                || (0x7F..=0x9F).contains(&candidate)
                || (0xE000..=0xF8FF).contains(&candidate) // private use
                || (0xF0000..=0xFFFFD).contains(&candidate)
                || (0x100000..=0x10FFFD).contains(&candidate);
            if excluded {
                continue;
            }
            if let Some(c) = char::from_u32(candidate) {
                return c;
            }
        }
    }
}

#[test]
fn round_trips_1024_random_unicode_strings() {
    let mut rng = Xorshift64(0x9E3779B97F4A7C15);
    let strings: Vec<String> = (0..1024)
        .map(|_| {
            let len = 1 + (rng.next() % 12) as usize;
            (0..len).map(|_| rng.next_codepoint()).collect()
        })
        .collect();

    let list = Tag::empty_list();
    for s in &strings {
        list.list_add(Tag::string(s.clone())).unwrap();
    }
    let root = Tag::compound();
    root.compound_add("strings", list).unwrap();

    let (_, read_back) = round_trip(&root, "", &WriterOptions::new());
    let read_list = read_back.compound_get("strings").unwrap();
    assert_eq!(read_list.list_len().unwrap(), 1024);
    for (i, expected) in strings.iter().enumerate() {
        assert_eq!(&read_list.list_get(i).unwrap().as_string().unwrap(), expected);
    }
}

#[test]
fn file_facade_round_trips_with_every_codec() {
    let root = Tag::compound();
    root.compound_add("greeting", Tag::string("hi")).unwrap();

    for codec in [Codec::None, Codec::GZip, Codec::ZLib] {
        let mut buf = Vec::new();
        nbtwire::save(&mut buf, "doc", &root, codec, &WriterOptions::new()).unwrap();
        let (name, read_back) = nbtwire::load(Cursor::new(buf), &ReaderOptions::new()).unwrap();
        assert_eq!(name, "doc");
        assert_eq!(read_back.compound_get("greeting").unwrap().as_string().unwrap(), "hi");
    }
}
