use crate::error::{PackError, Result};
use crate::format::{
    write_header, ElementType, PackConfig, DEFAULT_MAX_LEVELS, EXTENDED_SIZE_16,
    EXTENDED_SIZE_32, SMALL_SIZE_MASK, TYPE_MASK,
};

/// Append-only writer into a caller-owned buffer.
///
/// Every `put_*` call checks the remaining capacity for the whole element
/// before touching the buffer, so a failed call writes nothing.
///
/// Containers are written with a fixed-width placeholder length that is
/// patched by [`close`](Self::close). The placeholder width depends on the
/// configured [`FormatWidth`](crate::FormatWidth) and is never widened
/// afterwards: a container whose content outgrows it fails to close, and the
/// whole message must then be discarded.
#[derive(Debug)]
pub struct PackEncoder<'a, const MAX_LEVELS: usize = DEFAULT_MAX_LEVELS> {
    buffer: &'a mut [u8],
    capacity: usize,
    cursor: usize,
    open: [usize; MAX_LEVELS],
    depth: usize,
    config: PackConfig,
}

impl<'a> PackEncoder<'a> {
    /// Create an encoder with the default configuration and stack depth.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self::with_config(buffer, PackConfig::default())
    }

    /// Create an encoder with an explicit configuration and the default depth.
    pub fn with_config(buffer: &'a mut [u8], config: PackConfig) -> Self {
        Self::with_levels(buffer, config)
    }
}

impl<'a, const MAX_LEVELS: usize> PackEncoder<'a, MAX_LEVELS> {
    /// Create an encoder with an explicit configuration and stack depth.
    pub fn with_levels(buffer: &'a mut [u8], config: PackConfig) -> Self {
        let capacity = buffer.len().min(config.width.max_buffer_len());
        Self {
            buffer,
            capacity,
            cursor: 0,
            open: [0; MAX_LEVELS],
            depth: 0,
            config,
        }
    }

    /// Rebind to a new buffer, discarding any open containers.
    pub fn bind(&mut self, buffer: &'a mut [u8]) {
        self.capacity = buffer.len().min(self.config.width.max_buffer_len());
        self.buffer = buffer;
        self.cursor = 0;
        self.depth = 0;
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Usable size of the bound buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.capacity - self.cursor
    }

    /// Number of containers currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Current write position.
    pub fn offset(&self) -> usize {
        self.cursor
    }

    /// Move the write position, e.g. to rewrite a fixed-size field in place.
    ///
    /// The caller is responsible for keeping the encoded structure valid.
    pub fn set_offset(&mut self, offset: usize) -> Result<()> {
        if offset >= self.capacity {
            return Err(PackError::InvalidOffset {
                offset,
                capacity: self.capacity,
            });
        }
        self.cursor = offset;
        Ok(())
    }

    /// Everything written before the cursor.
    pub fn written(&self) -> &[u8] {
        &self.buffer[..self.cursor]
    }

    /// Append one element with the given raw content.
    pub fn put_element(&mut self, element_type: ElementType, content: &[u8]) -> Result<()> {
        let width = self.config.width;
        let header_len = width
            .header_len(content.len())
            .ok_or(PackError::LengthOverflow {
                length: content.len(),
                width,
            })?;

        let needed = header_len + content.len();
        if needed > self.remaining() {
            return Err(PackError::BufferFull {
                needed,
                available: self.remaining(),
            });
        }

        let start = self.cursor;
        write_header(
            &mut self.buffer[start..start + header_len],
            element_type.code(),
            content.len(),
        );
        self.buffer[start + header_len..start + needed].copy_from_slice(content);
        self.cursor += needed;
        Ok(())
    }

    /// Append already-encoded elements verbatim.
    pub fn put_raw(&mut self, elements: &[u8]) -> Result<()> {
        if elements.len() > self.remaining() {
            return Err(PackError::BufferFull {
                needed: elements.len(),
                available: self.remaining(),
            });
        }
        let start = self.cursor;
        self.buffer[start..start + elements.len()].copy_from_slice(elements);
        self.cursor += elements.len();
        Ok(())
    }

    /// Discard everything written at or after `offset`, including any
    /// containers opened there.
    pub fn rewind(&mut self, offset: usize) -> Result<()> {
        if offset > self.cursor {
            return Err(PackError::InvalidOffset {
                offset,
                capacity: self.capacity,
            });
        }
        while self.depth > 0 && self.open[self.depth - 1] >= offset {
            self.depth -= 1;
        }
        self.cursor = offset;
        Ok(())
    }

    pub fn put_none(&mut self) -> Result<()> {
        self.put_element(ElementType::None, &[])
    }

    /// `false` is written without a content byte.
    pub fn put_boolean(&mut self, value: bool) -> Result<()> {
        if value {
            self.put_element(ElementType::Boolean, &[1])
        } else {
            self.put_element(ElementType::Boolean, &[])
        }
    }

    /// Written with the smallest of 1, 2 or 4 bytes that holds `value`.
    pub fn put_integer(&mut self, value: i32) -> Result<()> {
        if let Ok(byte) = i8::try_from(value) {
            self.put_element(ElementType::Integer, &byte.to_be_bytes())
        } else if let Ok(short) = i16::try_from(value) {
            self.put_element(ElementType::Integer, &short.to_be_bytes())
        } else {
            self.put_element(ElementType::Integer, &value.to_be_bytes())
        }
    }

    /// Zero is written without content. Anything else uses the configured
    /// precision: 8-byte double, or 4-byte single after narrowing `value`.
    ///
    /// Narrowing follows `as f32`: magnitudes below the single range become
    /// zero (and take the empty encoding), magnitudes above it become
    /// infinity.
    pub fn put_real(&mut self, value: f64) -> Result<()> {
        if self.config.wide_reals {
            if value == 0.0 {
                return self.put_element(ElementType::Real, &[]);
            }
            return self.put_element(ElementType::Real, &value.to_be_bytes());
        }

        let single = value as f32;
        if single == 0.0 {
            self.put_element(ElementType::Real, &[])
        } else {
            self.put_element(ElementType::Real, &single.to_be_bytes())
        }
    }

    pub fn put_string(&mut self, value: &str) -> Result<()> {
        self.put_element(ElementType::String, value.as_bytes())
    }

    pub fn put_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.put_element(ElementType::Bytes, value)
    }

    pub fn open_list(&mut self) -> Result<()> {
        self.open(ElementType::List)
    }

    pub fn open_map(&mut self) -> Result<()> {
        self.open(ElementType::Map)
    }

    fn open(&mut self, element_type: ElementType) -> Result<()> {
        if self.depth >= MAX_LEVELS {
            return Err(PackError::DepthExceeded { max: MAX_LEVELS });
        }
        let header_len = self.config.width.container_header_len();
        if header_len > self.remaining() {
            return Err(PackError::BufferFull {
                needed: header_len,
                available: self.remaining(),
            });
        }

        let start = self.cursor;
        let header = &mut self.buffer[start..start + header_len];
        header.fill(0);
        if header_len == 1 {
            header[0] = element_type.code();
        } else {
            header[0] = element_type.code() | EXTENDED_SIZE_16;
            if header_len == 7 {
                header[1..3].copy_from_slice(&EXTENDED_SIZE_32.to_be_bytes());
            }
        }

        self.open[self.depth] = start;
        self.depth += 1;
        self.cursor += header_len;
        Ok(())
    }

    /// Close the most recently opened container, patching its length.
    ///
    /// On failure the container stays open and its placeholder unpatched.
    pub fn close(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(PackError::NothingOpen);
        }
        let width = self.config.width;
        let start = self.open[self.depth - 1];
        let header_len = width.container_header_len();
        let content_start = start + header_len;

        let length = self
            .cursor
            .checked_sub(content_start)
            .ok_or(PackError::InvalidOffset {
                offset: self.cursor,
                capacity: self.capacity,
            })?;
        if length > width.max_container_len() {
            return Err(PackError::LengthOverflow { length, width });
        }

        let header = &mut self.buffer[start..content_start];
        match header_len {
            1 => header[0] = (header[0] & TYPE_MASK) | (length as u8 & SMALL_SIZE_MASK),
            3 => header[1..3].copy_from_slice(&(length as u16).to_be_bytes()),
            _ => header[3..7].copy_from_slice(&(length as u32).to_be_bytes()),
        }

        self.depth -= 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::PackDecoder;
    use crate::format::FormatWidth;

    fn encode(config: PackConfig, f: impl FnOnce(&mut PackEncoder<'_>)) -> Vec<u8> {
        let mut buf = vec![0u8; 512];
        let mut encoder = PackEncoder::with_config(&mut buf, config);
        f(&mut encoder);
        let len = encoder.offset();
        buf.truncate(len);
        buf
    }

    #[test]
    fn minimal_integer_widths() {
        let bytes = encode(PackConfig::default(), |e| {
            e.put_integer(-5).unwrap();
            e.put_integer(200).unwrap();
            e.put_integer(40000).unwrap();
        });
        assert_eq!(
            bytes,
            [0x41, 0xFB, 0x42, 0x00, 0xC8, 0x44, 0x00, 0x00, 0x9C, 0x40]
        );
    }

    #[test]
    fn integer_range_boundaries() {
        let bytes = encode(PackConfig::default(), |e| {
            e.put_integer(127).unwrap();
            e.put_integer(-128).unwrap();
            e.put_integer(128).unwrap();
            e.put_integer(-32768).unwrap();
            e.put_integer(32768).unwrap();
        });
        assert_eq!(
            bytes,
            [
                0x41, 0x7F, //
                0x41, 0x80, //
                0x42, 0x00, 0x80, //
                0x42, 0x80, 0x00, //
                0x44, 0x00, 0x00, 0x80, 0x00,
            ]
        );
    }

    #[test]
    fn canonical_booleans_and_none() {
        let bytes = encode(PackConfig::default(), |e| {
            e.put_boolean(false).unwrap();
            e.put_boolean(true).unwrap();
            e.put_none().unwrap();
        });
        assert_eq!(bytes, [0x20, 0x21, 0x01, 0x00]);
    }

    #[test]
    fn reals_use_configured_precision() {
        let narrow = encode(PackConfig::default(), |e| {
            e.put_real(0.0).unwrap();
            e.put_real(1.5).unwrap();
        });
        assert_eq!(narrow, [0x60, 0x64, 0x3F, 0xC0, 0x00, 0x00]);

        let wide = encode(PackConfig::default().with_wide_reals(true), |e| {
            e.put_real(-0.0).unwrap();
            e.put_real(1.5).unwrap();
        });
        assert_eq!(wide, [0x60, 0x68, 0x3F, 0xF8, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn narrowed_reals_out_of_single_range() {
        let narrow = encode(PackConfig::default(), |e| {
            e.put_real(1e-50).unwrap();
            e.put_real(1e40).unwrap();
        });
        assert_eq!(narrow, [0x60, 0x64, 0x7F, 0x80, 0x00, 0x00]);

        let wide = encode(PackConfig::default().with_wide_reals(true), |e| {
            e.put_real(1e-50).unwrap();
        });
        assert_eq!(wide[0], 0x68);
        assert_eq!(&wide[1..], &1e-50f64.to_be_bytes());
    }

    #[test]
    fn strings_and_bytes() {
        let bytes = encode(PackConfig::default(), |e| {
            e.put_string("hi").unwrap();
            e.put_string("").unwrap();
            e.put_bytes(&[0x7E, 0x7D]).unwrap();
        });
        assert_eq!(bytes, [0x82, b'h', b'i', 0x80, 0xA2, 0x7E, 0x7D]);
    }

    #[test]
    fn long_string_uses_extended_header() {
        let text = "x".repeat(40);
        let bytes = encode(PackConfig::default(), |e| e.put_string(&text).unwrap());
        assert_eq!(&bytes[..3], &[0x9F, 0x00, 40]);
        assert_eq!(bytes.len(), 43);

        let mut buf = [0u8; 64];
        let mut small = PackEncoder::with_config(&mut buf, PackConfig::new(FormatWidth::Small));
        assert_eq!(
            small.put_string(&text),
            Err(PackError::LengthOverflow {
                length: 40,
                width: FormatWidth::Small
            })
        );
        assert_eq!(small.offset(), 0);
    }

    #[test]
    fn big_width_uses_32_bit_header() {
        let content = vec![0xAB; 0x1_0000];
        let mut buf = vec![0u8; 0x1_0010];
        let mut encoder = PackEncoder::with_config(&mut buf, PackConfig::new(FormatWidth::Big));
        encoder.put_bytes(&content).unwrap();
        assert_eq!(encoder.offset(), 7 + 0x1_0000);
        assert_eq!(&buf[..7], &[0xBF, 0xFF, 0xFF, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn full_buffer_writes_nothing() {
        let mut buf = [0u8; 4];
        let mut encoder = PackEncoder::new(&mut buf);
        encoder.put_integer(1).unwrap();
        assert_eq!(
            encoder.put_string("abc"),
            Err(PackError::BufferFull {
                needed: 4,
                available: 2
            })
        );
        assert_eq!(encoder.offset(), 2);
        assert!(encoder.put_integer(40000).is_err());
        assert_eq!(encoder.offset(), 2);
        encoder.put_boolean(true).unwrap();
        assert_eq!(encoder.remaining(), 0);
        assert_eq!(buf, [0x41, 0x01, 0x21, 0x01]);
    }

    #[test]
    fn nested_containers_roundtrip() {
        let bytes = encode(PackConfig::default(), |e| {
            e.open_list().unwrap();
            e.open_map().unwrap();
            e.put_string("a").unwrap();
            e.put_integer(1).unwrap();
            e.close().unwrap();
            e.put_string("s").unwrap();
            e.close().unwrap();
        });
        assert_eq!(
            bytes,
            [
                0xDF, 0x00, 0x09, //
                0xFF, 0x00, 0x04, 0x81, b'a', 0x41, 0x01, //
                0x81, b's',
            ]
        );

        let mut decoder = PackDecoder::new(&bytes);
        assert!(decoder.advance());
        decoder.enter_list().unwrap();
        assert!(decoder.advance());
        decoder.enter_map().unwrap();
        assert!(decoder.advance());
        assert!(decoder.matches("a"));
        assert_eq!(decoder.get_integer(), 1);
        assert!(!decoder.advance());
        decoder.exit().unwrap();
        assert!(decoder.advance());
        assert!(decoder.equals("s"));
        assert!(!decoder.has_next());
    }

    #[test]
    fn small_width_containers_patch_the_tag() {
        let bytes = encode(PackConfig::new(FormatWidth::Small), |e| {
            e.open_list().unwrap();
            e.put_integer(1).unwrap();
            e.put_integer(2).unwrap();
            e.close().unwrap();
        });
        assert_eq!(bytes, [0xC4, 0x41, 0x01, 0x41, 0x02]);
    }

    #[test]
    fn big_width_container_header() {
        let bytes = encode(PackConfig::new(FormatWidth::Big), |e| {
            e.open_map().unwrap();
            e.close().unwrap();
        });
        assert_eq!(bytes, [0xFF, 0xFF, 0xFF, 0, 0, 0, 0]);
    }

    #[test]
    fn close_without_open_fails() {
        let mut buf = [0u8; 8];
        let mut encoder = PackEncoder::new(&mut buf);
        assert_eq!(encoder.close(), Err(PackError::NothingOpen));
        assert_eq!(encoder.offset(), 0);
    }

    #[test]
    fn close_overflow_keeps_container_open() {
        let mut buf = [0u8; 64];
        let mut encoder = PackEncoder::with_config(&mut buf, PackConfig::new(FormatWidth::Small));
        encoder.open_list().unwrap();
        for _ in 0..8 {
            encoder.put_integer(40000).unwrap();
        }
        assert_eq!(
            encoder.close(),
            Err(PackError::LengthOverflow {
                length: 40,
                width: FormatWidth::Small
            })
        );
        assert_eq!(encoder.depth(), 1);
        assert_eq!(buf[0], 0xC0);
    }

    #[test]
    fn open_depth_is_bounded() {
        let mut buf = [0u8; 64];
        let mut encoder = PackEncoder::new(&mut buf);
        for _ in 0..DEFAULT_MAX_LEVELS {
            encoder.open_list().unwrap();
        }
        let offset = encoder.offset();
        assert_eq!(
            encoder.open_map(),
            Err(PackError::DepthExceeded {
                max: DEFAULT_MAX_LEVELS
            })
        );
        assert_eq!(encoder.offset(), offset);
        assert_eq!(encoder.depth(), DEFAULT_MAX_LEVELS);

        for _ in 0..DEFAULT_MAX_LEVELS {
            encoder.close().unwrap();
        }
        assert_eq!(encoder.depth(), 0);
        assert_eq!(encoder.close(), Err(PackError::NothingOpen));
    }

    #[test]
    fn open_needs_room_for_placeholder() {
        let mut buf = [0u8; 2];
        let mut encoder = PackEncoder::new(&mut buf);
        assert_eq!(
            encoder.open_list(),
            Err(PackError::BufferFull {
                needed: 3,
                available: 2
            })
        );
        assert_eq!(encoder.depth(), 0);
    }

    #[test]
    fn set_offset_rewrites_fixed_field() {
        let mut buf = [0u8; 16];
        let mut encoder = PackEncoder::new(&mut buf);
        encoder.put_integer(0).unwrap();
        encoder.put_string("ok").unwrap();
        let end = encoder.offset();

        encoder.set_offset(0).unwrap();
        encoder.put_integer(0x25).unwrap();
        encoder.set_offset(end).unwrap();
        encoder.put_boolean(false).unwrap();

        assert_eq!(encoder.written(), &[0x41, 0x25, 0x82, b'o', b'k', 0x20]);
        assert_eq!(
            encoder.set_offset(16),
            Err(PackError::InvalidOffset {
                offset: 16,
                capacity: 16
            })
        );
    }

    #[test]
    fn scalars_roundtrip_through_decoder() {
        let bytes = encode(PackConfig::default(), |e| {
            e.put_integer(i32::MAX).unwrap();
            e.put_integer(i32::MIN).unwrap();
            e.put_real(-3.25).unwrap();
            e.put_string("héllo").unwrap();
            e.put_bytes(&[0, 1, 2, 0xFF]).unwrap();
            e.put_boolean(true).unwrap();
        });

        let mut decoder = PackDecoder::new(&bytes);
        decoder.advance();
        assert_eq!(decoder.get_integer(), i32::MAX);
        decoder.advance();
        assert_eq!(decoder.get_integer(), i32::MIN);
        decoder.advance();
        assert_eq!(decoder.get_real(), -3.25);
        decoder.advance();
        assert_eq!(decoder.as_str(), Some("héllo"));
        decoder.advance();
        assert_eq!(decoder.as_bytes(), Some(&[0u8, 1, 2, 0xFF][..]));
        decoder.advance();
        assert!(decoder.get_boolean());
        assert!(!decoder.advance());
    }

    #[test]
    fn put_raw_copies_verbatim() {
        let bytes = encode(PackConfig::default(), |e| {
            e.put_integer(1).unwrap();
            e.put_raw(&[0xDF, 0x00, 0x02, 0x41, 0x07]).unwrap();
        });
        assert_eq!(bytes, [0x41, 0x01, 0xDF, 0x00, 0x02, 0x41, 0x07]);

        let mut buf = [0u8; 3];
        let mut encoder = PackEncoder::new(&mut buf);
        assert_eq!(
            encoder.put_raw(&[0u8; 4]),
            Err(PackError::BufferFull {
                needed: 4,
                available: 3
            })
        );
        assert_eq!(encoder.offset(), 0);
    }

    #[test]
    fn rewind_drops_containers_opened_after_offset() {
        let mut buf = [0u8; 32];
        let mut encoder = PackEncoder::new(&mut buf);
        encoder.open_list().unwrap();
        encoder.put_integer(1).unwrap();
        let mark = encoder.offset();
        encoder.open_map().unwrap();
        encoder.open_list().unwrap();
        assert_eq!(encoder.depth(), 3);

        encoder.rewind(mark).unwrap();
        assert_eq!(encoder.depth(), 1);
        assert_eq!(encoder.offset(), mark);
        encoder.close().unwrap();
        assert_eq!(encoder.written(), &[0xDF, 0x00, 0x02, 0x41, 0x01]);

        let end = encoder.offset();
        assert_eq!(
            encoder.rewind(end + 1),
            Err(PackError::InvalidOffset {
                offset: end + 1,
                capacity: 32
            })
        );
    }

    #[test]
    fn bind_clears_open_containers() {
        let mut first = [0u8; 8];
        let mut second = [0u8; 8];
        let mut encoder = PackEncoder::new(&mut first);
        encoder.open_list().unwrap();
        encoder.bind(&mut second);
        assert_eq!(encoder.depth(), 0);
        assert_eq!(encoder.offset(), 0);
        assert_eq!(encoder.close(), Err(PackError::NothingOpen));
    }
}
