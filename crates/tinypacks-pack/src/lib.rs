//! Compact self-describing binary serialization over fixed buffers.
//!
//! Every element on the wire starts with a tag byte:
//! - The top 3 bits carry the element type (None, Boolean, Integer, Real,
//!   String, Bytes, List, Map)
//! - The low 5 bits carry the content length (0-30), or `0x1F` to signal an
//!   extended length field
//!
//! Encoding and decoding never allocate. [`PackEncoder`] appends into a
//! caller-owned `&mut [u8]` and [`PackDecoder`] walks a borrowed `&[u8]`,
//! both with a fixed-size container stack.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
#[cfg(feature = "json")]
pub mod json;

pub use decoder::PackDecoder;
pub use encoder::PackEncoder;
pub use error::{PackError, Result};
pub use format::{ElementType, FormatWidth, PackConfig, DEFAULT_MAX_LEVELS};
