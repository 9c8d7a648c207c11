use std::fmt;

use crate::tag_type::TagType;

/// Everything that can go wrong while reading, writing, or mutating NBT data.
///
/// Variants line up with the taxonomy a caller needs to branch on: malformed
/// wire data, a truncated byte source, an accessor asking for an
/// incompatible widening, an operation illegal in the reader/writer's
/// current state, a bad argument, a tree that cannot be serialized, or a
/// plain I/O failure from the underlying transport.
#[derive(Debug)]
pub enum NbtError {
    /// A plain I/O failure from the underlying byte sink/source.
    Io { error: std::io::Error },

    /// Negative array/string length, bad root tag type, invalid list
    /// element-type byte, truncated UTF-8, or a bad Adler-32 footer.
    Malformed { reason: String },

    /// The byte source ended in the middle of a tag, string, or array.
    Truncated { while_reading: String },

    /// A widening accessor was asked for a type the source tag cannot
    /// represent.
    TypeMismatch { found: TagType, requested: &'static str },

    /// An operation illegal in the reader/writer's current state: e.g.
    /// `read_value` outside a value tag, `end_compound` not in a compound,
    /// a list write that over/under-runs its declared size, or a named tag
    /// expected where an unnamed one was given.
    InvalidState { message: String },

    /// A null or out-of-range argument: e.g. a string longer than 32767
    /// UTF-8 bytes, or renaming a tag to a name already present.
    InvalidArgument { message: String },

    /// A tag tree cannot be serialized, e.g. a list whose `element_type`
    /// is still `Unknown`, or a push writer left with open frames.
    Format { message: String },

    /// A caller-supplied conversion failed (used by the `serde` bridge).
    Custom(String),
}

pub type NbtResult<T> = Result<T, NbtError>;

pub(crate) fn digest_io<T>(r: Result<T, std::io::Error>) -> NbtResult<T> {
    match r {
        Ok(value) => Ok(value),
        Err(error) => Err(io_error(error)),
    }
}

pub(crate) fn io_error(error: std::io::Error) -> NbtError {
    if error.kind() == std::io::ErrorKind::UnexpectedEof {
        NbtError::Truncated { while_reading: "primitive".to_string() }
    } else {
        NbtError::Io { error }
    }
}

impl fmt::Display for NbtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtError::Io { error } => write!(f, "an I/O error occurred: {}", error),
            NbtError::Malformed { reason } => write!(f, "malformed NBT data: {}", reason),
            NbtError::Truncated { while_reading } => {
                write!(f, "truncated input while reading {}", while_reading)
            }
            NbtError::TypeMismatch { found, requested } => {
                write!(f, "cannot read a {} as {}", found, requested)
            }
            NbtError::InvalidState { message } => write!(f, "invalid operation: {}", message),
            NbtError::InvalidArgument { message } => write!(f, "invalid argument: {}", message),
            NbtError::Format { message } => write!(f, "cannot serialize: {}", message),
            NbtError::Custom(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for NbtError {}

impl From<std::io::Error> for NbtError {
    fn from(error: std::io::Error) -> Self {
        io_error(error)
    }
}

#[cfg(feature = "serde")]
use serde::{de::Error as DeserializeError, ser::Error as SerializeError};

#[cfg(feature = "serde")]
impl SerializeError for NbtError {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::Custom(msg.to_string())
    }
}

#[cfg(feature = "serde")]
impl DeserializeError for NbtError {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::Custom(msg.to_string())
    }
}
