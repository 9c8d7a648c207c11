//! Process-wide defaults and the per-reader/per-writer options that
//! snapshot them.
//!
//! The two knobs here, `default_buffer_size` and `default_indent_string`,
//! are read *once*, at construction time, by
//! [`ReaderOptions::new`]/[`WriterOptions::new`]: changing a global default
//! afterwards never retroactively changes an already-built reader or
//! writer, matching how most buffered-I/O libraries in the ecosystem treat
//! their defaults (a knob you turn before building the thing, not a live
//! dial on it).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::sync::RwLock;

use crate::codec::Endian;

const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;
const DEFAULT_MAX_DEPTH: usize = 512;

static BUFFER_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_BUFFER_SIZE);

fn indent_string_slot() -> &'static RwLock<String> {
    static SLOT: OnceLock<RwLock<String>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new("  ".to_string()))
}

/// The buffer size new readers/writers snapshot by default, in bytes.
pub fn default_buffer_size() -> usize {
    BUFFER_SIZE.load(Ordering::Relaxed)
}

pub fn set_default_buffer_size(bytes: usize) {
    BUFFER_SIZE.store(bytes, Ordering::Relaxed);
}

/// The indent unit [`crate::tag::Tag::write_pretty`] falls back to when not
/// given one explicitly.
pub fn default_indent_string() -> String {
    indent_string_slot().read().expect("indent string lock poisoned").clone()
}

pub fn set_default_indent_string<S: Into<String>>(indent: S) {
    *indent_string_slot().write().expect("indent string lock poisoned") = indent.into();
}

/// Options snapshotted at construction time for a pull reader or a
/// recursive tree read.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub endian: Endian,
    pub buffer_size: usize,
    /// Maximum nesting depth before a read is rejected with
    /// [`crate::error::NbtError::Malformed`] — guards against
    /// stack-exhausting adversarial input.
    pub max_depth: usize,
}

impl ReaderOptions {
    pub fn new() -> Self {
        ReaderOptions {
            endian: Endian::default(),
            buffer_size: default_buffer_size(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions::new()
    }
}

/// Options snapshotted at construction time for a push writer or a
/// recursive tree write.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub endian: Endian,
    pub buffer_size: usize,
}

impl WriterOptions {
    pub fn new() -> Self {
        WriterOptions { endian: Endian::default(), buffer_size: default_buffer_size() }
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // default_buffer_size/default_indent_string are process-wide; serialize
    // the tests that touch them so they don't race each other.
    static GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn options_snapshot_the_default_at_construction_time() {
        let _lock = GUARD.lock().unwrap();
        set_default_buffer_size(4096);
        let opts = ReaderOptions::new();
        assert_eq!(opts.buffer_size, 4096);
        set_default_buffer_size(9000);
        assert_eq!(opts.buffer_size, 4096, "already-built options must not see the new default");
        set_default_buffer_size(DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn indent_string_default_round_trips() {
        let _lock = GUARD.lock().unwrap();
        set_default_indent_string("    ");
        assert_eq!(default_indent_string(), "    ");
        set_default_indent_string("  ");
    }
}
