//! Byte-stuffed, CRC-16 protected framing for serial links.
//!
//! Every frame on the wire looks like:
//! - Payload bytes, with `0x7E` and `0x7D` escaped as `0x7D, byte ^ 0x20`
//! - A 2-byte big-endian CRC-16 of the unescaped payload, escaped the same way
//! - A closing `0x7E` flag
//!
//! The [`Framer`] consumes or produces one byte per call and never blocks,
//! so it can be driven from an interrupt handler or a polling loop.
//! [`FrameReader`] and [`FrameWriter`] pump it over any `Read`/`Write`
//! stream.

pub mod crc;
pub mod error;
pub mod framer;
pub mod reader;
pub mod writer;

pub use crc::{crc16, crc16_update};
pub use error::{FramerError, Result};
pub use framer::{Framer, FramerMode, CRC_LEN, ESCAPE, ESCAPE_XOR, FLAG};
pub use reader::FrameReader;
pub use writer::FrameWriter;
