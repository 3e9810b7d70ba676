//! Wire constants, element types and format-width configuration.

use std::fmt;

/// Tag type code for None.
pub const NONE: u8 = 0x00;
/// Tag type code for Boolean.
pub const BOOLEAN: u8 = 0x20;
/// Tag type code for Integer.
pub const INTEGER: u8 = 0x40;
/// Tag type code for Real.
pub const REAL: u8 = 0x60;
/// Tag type code for String.
pub const STRING: u8 = 0x80;
/// Tag type code for Bytes.
pub const BYTES: u8 = 0xA0;
/// Tag type code for List.
pub const LIST: u8 = 0xC0;
/// Tag type code for Map.
pub const MAP: u8 = 0xE0;

/// Mask selecting the 3-bit type code of a tag.
pub const TYPE_MASK: u8 = 0b1110_0000;
/// Mask selecting the 2-bit family of a tag.
pub const FAMILY_MASK: u8 = 0b1100_0000;

pub const FAMILY_NUMBER: u8 = 0b0100_0000;
pub const FAMILY_BLOCK: u8 = 0b1000_0000;
pub const FAMILY_CONTAINER: u8 = 0b1100_0000;

/// Mask selecting the inline length of a tag.
pub const SMALL_SIZE_MASK: u8 = 0x1F;
/// Largest content length that fits in the tag itself.
pub const SMALL_SIZE_MAX: u8 = 0x1E;
/// Inline length value announcing a 16-bit length field.
pub const EXTENDED_SIZE_16: u8 = 0x1F;
/// 16-bit length value announcing a further 32-bit length field.
pub const EXTENDED_SIZE_32: u16 = 0xFFFF;

/// Default depth of the encoder/decoder container stacks.
pub const DEFAULT_MAX_LEVELS: usize = 5;

/// The type of a single element, taken from the top 3 bits of its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    None,
    Boolean,
    Integer,
    Real,
    String,
    Bytes,
    List,
    Map,
}

impl ElementType {
    /// Decode the type from a tag byte. Every tag maps to a type.
    pub fn from_tag(tag: u8) -> Self {
        match tag & TYPE_MASK {
            NONE => Self::None,
            BOOLEAN => Self::Boolean,
            INTEGER => Self::Integer,
            REAL => Self::Real,
            STRING => Self::String,
            BYTES => Self::Bytes,
            LIST => Self::List,
            _ => Self::Map,
        }
    }

    /// The tag type code (high bits) for this type.
    pub fn code(self) -> u8 {
        match self {
            Self::None => NONE,
            Self::Boolean => BOOLEAN,
            Self::Integer => INTEGER,
            Self::Real => REAL,
            Self::String => STRING,
            Self::Bytes => BYTES,
            Self::List => LIST,
            Self::Map => MAP,
        }
    }

    /// Integer or Real.
    pub fn is_number(self) -> bool {
        self.code() & FAMILY_MASK == FAMILY_NUMBER
    }

    /// String or Bytes.
    pub fn is_block(self) -> bool {
        self.code() & FAMILY_MASK == FAMILY_BLOCK
    }

    /// List or Map.
    pub fn is_container(self) -> bool {
        self.code() & FAMILY_MASK == FAMILY_CONTAINER
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which length extensions are enabled, and therefore how large a pack can be.
///
/// Both ends of a link must use the same width; nothing on the wire says
/// which one produced a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatWidth {
    /// Inline lengths only: elements up to 30 content bytes, buffers up to 255 bytes.
    Small,
    /// Inline and 16-bit lengths: buffers up to 64 KiB.
    #[default]
    Medium,
    /// Inline, 16-bit and 32-bit lengths.
    Big,
}

impl FormatWidth {
    /// Whether the 16-bit extended length field is understood.
    pub fn has_extended_16(self) -> bool {
        !matches!(self, Self::Small)
    }

    /// Whether the 32-bit extended length field is understood.
    pub fn has_extended_32(self) -> bool {
        matches!(self, Self::Big)
    }

    /// Largest buffer (and therefore offset) this width can address.
    pub fn max_buffer_len(self) -> usize {
        match self {
            Self::Small => 0xFF,
            Self::Medium => 0xFFFF,
            Self::Big => usize::try_from(0xFFFF_FFFFu32).unwrap_or(usize::MAX),
        }
    }

    /// Header size used for containers, whose length is only known at close.
    pub fn container_header_len(self) -> usize {
        match self {
            Self::Small => 1,
            Self::Medium => 3,
            Self::Big => 7,
        }
    }

    /// Largest content length a container header of this width can carry.
    pub fn max_container_len(self) -> usize {
        match self {
            Self::Small => SMALL_SIZE_MAX as usize,
            Self::Medium => EXTENDED_SIZE_32 as usize - 1,
            Self::Big => self.max_buffer_len() - 1,
        }
    }

    /// Smallest header able to describe `length` content bytes, if any.
    pub fn header_len(self, length: usize) -> Option<usize> {
        if length <= SMALL_SIZE_MAX as usize {
            Some(1)
        } else if self.has_extended_16() && length < EXTENDED_SIZE_32 as usize {
            Some(3)
        } else if self.has_extended_32() && length < self.max_buffer_len() {
            Some(7)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Big => "big",
        }
    }
}

impl fmt::Display for FormatWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoder/decoder configuration shared by both ends of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackConfig {
    /// Supported length extensions.
    pub width: FormatWidth,
    /// Encode reals as 8-byte doubles and accept 8-byte reals when decoding.
    /// Default: 4-byte singles.
    pub wide_reals: bool,
}

impl PackConfig {
    pub fn new(width: FormatWidth) -> Self {
        Self {
            width,
            wide_reals: false,
        }
    }

    pub fn with_wide_reals(mut self, wide_reals: bool) -> Self {
        self.wide_reals = wide_reals;
        self
    }
}

/// Write a header for `length` content bytes into `dst`, which must be
/// exactly as long as the header. Returns the header length.
pub(crate) fn write_header(dst: &mut [u8], code: u8, length: usize) -> usize {
    match dst.len() {
        1 => dst[0] = code | (length as u8 & SMALL_SIZE_MASK),
        3 => {
            dst[0] = code | EXTENDED_SIZE_16;
            dst[1..3].copy_from_slice(&(length as u16).to_be_bytes());
        }
        _ => {
            dst[0] = code | EXTENDED_SIZE_16;
            dst[1..3].copy_from_slice(&EXTENDED_SIZE_32.to_be_bytes());
            dst[3..7].copy_from_slice(&(length as u32).to_be_bytes());
        }
    }
    dst.len()
}

/// A decoded element header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub header_len: usize,
    pub content_len: usize,
}

/// Why a header could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeaderError {
    /// The length field uses an extension the active width does not support.
    Unsupported,
    /// The header or content runs past the available bytes.
    Truncated,
}

/// Parse the header at the start of `bytes`, checking that the whole element
/// lies within `bytes`.
pub(crate) fn parse_header(
    bytes: &[u8],
    width: FormatWidth,
) -> std::result::Result<Header, HeaderError> {
    let tag = *bytes.first().ok_or(HeaderError::Truncated)?;
    let small = tag & SMALL_SIZE_MASK;

    let header = if small != EXTENDED_SIZE_16 {
        Header {
            header_len: 1,
            content_len: small as usize,
        }
    } else {
        if !width.has_extended_16() {
            return Err(HeaderError::Unsupported);
        }
        let ext = bytes.get(1..3).ok_or(HeaderError::Truncated)?;
        let length16 = u16::from_be_bytes([ext[0], ext[1]]);
        if length16 != EXTENDED_SIZE_32 {
            Header {
                header_len: 3,
                content_len: length16 as usize,
            }
        } else {
            if !width.has_extended_32() {
                return Err(HeaderError::Unsupported);
            }
            let ext = bytes.get(3..7).ok_or(HeaderError::Truncated)?;
            let length32 = u32::from_be_bytes([ext[0], ext[1], ext[2], ext[3]]);
            Header {
                header_len: 7,
                content_len: usize::try_from(length32).map_err(|_| HeaderError::Truncated)?,
            }
        }
    };

    match header.header_len.checked_add(header.content_len) {
        Some(total) if total <= bytes.len() => Ok(header),
        _ => Err(HeaderError::Truncated),
    }
}
