use tracing::debug;

use crate::error::{PackError, Result};
use crate::format::{parse_header, ElementType, HeaderError, PackConfig, DEFAULT_MAX_LEVELS};

/// One scope of the decoder stack: the current element and the region it
/// iterates over. All offsets index into the bound buffer.
#[derive(Debug, Clone, Copy, Default)]
struct Level {
    element_start: usize,
    element_len: usize,
    content_start: usize,
    content_len: usize,
    parent_start: usize,
    parent_len: usize,
}

impl Level {
    fn spanning(start: usize, len: usize) -> Self {
        Self {
            element_start: start,
            element_len: 0,
            content_start: start,
            content_len: 0,
            parent_start: start,
            parent_len: len,
        }
    }

    fn element_end(&self) -> usize {
        self.element_start + self.element_len
    }

    fn parent_end(&self) -> usize {
        self.parent_start + self.parent_len
    }
}

/// Lazy, allocation-free reader over a packed buffer.
///
/// The decoder starts positioned *before* the first element; call
/// [`advance`](Self::advance) to step onto each sibling in turn. Containers
/// are walked by [`enter`](Self::enter)ing them and [`exit`](Self::exit)ing
/// back out. Level 0 spans the whole buffer, so at most `MAX_LEVELS - 1`
/// containers can be entered at once.
///
/// Accessors never move the cursor. Asking for the wrong type yields a
/// neutral value (`false`, `0`, `0.0`) rather than an error.
#[derive(Debug, Clone)]
pub struct PackDecoder<'a, const MAX_LEVELS: usize = DEFAULT_MAX_LEVELS> {
    buffer: &'a [u8],
    config: PackConfig,
    levels: [Level; MAX_LEVELS],
    depth: usize,
}

impl<'a> PackDecoder<'a> {
    /// Create a decoder with the default configuration and stack depth.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_config(buffer, PackConfig::default())
    }

    /// Create a decoder with an explicit configuration and the default depth.
    pub fn with_config(buffer: &'a [u8], config: PackConfig) -> Self {
        Self::with_levels(buffer, config)
    }
}

impl<'a, const MAX_LEVELS: usize> PackDecoder<'a, MAX_LEVELS> {
    /// Create a decoder with an explicit configuration and stack depth.
    pub fn with_levels(buffer: &'a [u8], config: PackConfig) -> Self {
        const { assert!(MAX_LEVELS > 0, "decoder needs at least the root level") };
        let mut decoder = Self {
            buffer,
            config,
            levels: [Level::default(); MAX_LEVELS],
            depth: 0,
        };
        decoder.bind(buffer);
        decoder
    }

    /// Rebind to a new buffer, positioned before its first element.
    ///
    /// Bytes beyond what the configured width can address are ignored.
    pub fn bind(&mut self, buffer: &'a [u8]) {
        let len = buffer.len().min(self.config.width.max_buffer_len());
        self.buffer = buffer;
        self.depth = 0;
        self.levels[0] = Level::spanning(0, len);
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Number of containers currently entered (0 = top level).
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn level(&self) -> &Level {
        &self.levels[self.depth]
    }

    /// Whether another sibling follows the current element in this level.
    pub fn has_next(&self) -> bool {
        let level = self.level();
        level.element_end() < level.parent_end()
    }

    /// Step onto the next sibling within the current level.
    ///
    /// Returns `false` at the end of the level. An element whose length
    /// field needs an extension the active width does not support, or which
    /// runs past the end of its level, exhausts the level: this and every
    /// later call return `false` until the level is left.
    pub fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }

        let width = self.config.width;
        let level = &mut self.levels[self.depth];
        let start = level.element_end();
        let end = level.parent_end();

        match parse_header(&self.buffer[start..end], width) {
            Ok(header) => {
                level.element_start = start;
                level.element_len = header.header_len + header.content_len;
                level.content_start = start + header.header_len;
                level.content_len = header.content_len;
                true
            }
            Err(reason) => {
                match reason {
                    HeaderError::Unsupported => {
                        debug!(offset = start, %width, "length extension not supported")
                    }
                    HeaderError::Truncated => {
                        debug!(offset = start, end, "element runs past its level")
                    }
                }
                *level = Level {
                    element_start: start,
                    element_len: 0,
                    content_start: start,
                    content_len: 0,
                    parent_start: level.parent_start,
                    parent_len: 0,
                };
                false
            }
        }
    }

    /// Type of the current element, or `None` before the first element.
    pub fn element_type(&self) -> Option<ElementType> {
        let level = self.level();
        if level.element_len == 0 {
            return None;
        }
        Some(ElementType::from_tag(self.buffer[level.element_start]))
    }

    fn is(&self, element_type: ElementType) -> bool {
        self.element_type() == Some(element_type)
    }

    pub fn is_none(&self) -> bool {
        self.is(ElementType::None)
    }

    pub fn is_boolean(&self) -> bool {
        self.is(ElementType::Boolean)
    }

    pub fn is_integer(&self) -> bool {
        self.is(ElementType::Integer)
    }

    pub fn is_real(&self) -> bool {
        self.is(ElementType::Real)
    }

    pub fn is_string(&self) -> bool {
        self.is(ElementType::String)
    }

    pub fn is_bytes(&self) -> bool {
        self.is(ElementType::Bytes)
    }

    pub fn is_list(&self) -> bool {
        self.is(ElementType::List)
    }

    pub fn is_map(&self) -> bool {
        self.is(ElementType::Map)
    }

    pub fn is_number(&self) -> bool {
        self.element_type().is_some_and(ElementType::is_number)
    }

    pub fn is_block(&self) -> bool {
        self.element_type().is_some_and(ElementType::is_block)
    }

    pub fn is_container(&self) -> bool {
        self.element_type().is_some_and(ElementType::is_container)
    }

    /// Offset of the current element's tag within the buffer.
    pub fn element_offset(&self) -> usize {
        self.level().element_start
    }

    /// Total wire length of the current element (header + content).
    pub fn element_len(&self) -> usize {
        self.level().element_len
    }

    pub fn content_offset(&self) -> usize {
        self.level().content_start
    }

    pub fn content_len(&self) -> usize {
        self.level().content_len
    }

    /// The current element as it appears on the wire.
    pub fn element(&self) -> &'a [u8] {
        let level = self.level();
        &self.buffer[level.element_start..level.element_end()]
    }

    /// The current element's content bytes.
    pub fn content(&self) -> &'a [u8] {
        let level = self.level();
        &self.buffer[level.content_start..level.content_start + level.content_len]
    }

    /// Descend into the current List or Map.
    ///
    /// Fails without touching the cursor if the element is not a container,
    /// has no content, or the stack is full.
    pub fn enter(&mut self) -> Result<()> {
        if !self.is_container() {
            return Err(PackError::NotContainer);
        }
        let current = *self.level();
        if current.content_len == 0 {
            return Err(PackError::EmptyContainer);
        }
        if self.depth + 1 >= MAX_LEVELS {
            return Err(PackError::DepthExceeded { max: MAX_LEVELS });
        }

        self.depth += 1;
        self.levels[self.depth] = Level::spanning(current.content_start, current.content_len);
        Ok(())
    }

    /// [`enter`](Self::enter), but only if the current element is a List.
    pub fn enter_list(&mut self) -> Result<()> {
        if !self.is_list() {
            return Err(PackError::NotContainer);
        }
        self.enter()
    }

    /// [`enter`](Self::enter), but only if the current element is a Map.
    pub fn enter_map(&mut self) -> Result<()> {
        if !self.is_map() {
            return Err(PackError::NotContainer);
        }
        self.enter()
    }

    /// Return to the enclosing level, positioned on the container just left.
    pub fn exit(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(PackError::AtRoot);
        }
        self.depth -= 1;
        Ok(())
    }

    /// Boolean value of the current element.
    ///
    /// `false` is canonically encoded with no content byte. Anything that is
    /// not a Boolean with 0 or 1 content bytes reads as `false`.
    pub fn get_boolean(&self) -> bool {
        self.is_boolean() && matches!(self.content(), [byte] if *byte != 0)
    }

    /// Integer value of the current element.
    ///
    /// Integers of 1, 2 or 4 bytes are sign-extended; reals are truncated
    /// toward zero (saturating). Anything else reads as `0`.
    pub fn get_integer(&self) -> i32 {
        match self.element_type() {
            Some(ElementType::Integer) => {
                let content = self.content();
                match *content {
                    [b0] => b0 as i8 as i32,
                    [b0, b1] => i16::from_be_bytes([b0, b1]) as i32,
                    [b0, b1, b2, b3] => i32::from_be_bytes([b0, b1, b2, b3]),
                    _ => 0,
                }
            }
            Some(ElementType::Real) => self.get_real() as i32,
            _ => 0,
        }
    }

    /// Real value of the current element.
    ///
    /// Reals of 4 bytes are single precision; 8-byte doubles are only read
    /// when `wide_reals` is configured. Empty content is zero and integers
    /// are widened. Anything else reads as `0.0`.
    pub fn get_real(&self) -> f64 {
        match self.element_type() {
            Some(ElementType::Real) => match *self.content() {
                [b0, b1, b2, b3] => f32::from_be_bytes([b0, b1, b2, b3]) as f64,
                [b0, b1, b2, b3, b4, b5, b6, b7] if self.config.wide_reals => {
                    f64::from_be_bytes([b0, b1, b2, b3, b4, b5, b6, b7])
                }
                _ => 0.0,
            },
            Some(ElementType::Integer) => self.get_integer() as f64,
            _ => 0.0,
        }
    }

    /// Copy the current content into `dst` followed by a NUL terminator.
    ///
    /// Returns the content length (terminator excluded).
    pub fn get_string(&self, dst: &mut [u8]) -> Result<usize> {
        let content = self.content();
        let needed = content.len() + 1;
        if needed > dst.len() {
            return Err(PackError::BufferTooSmall {
                needed,
                capacity: dst.len(),
            });
        }
        dst[..content.len()].copy_from_slice(content);
        dst[content.len()] = 0;
        Ok(content.len())
    }

    /// Copy the current content into `dst`. Returns the content length.
    pub fn get_bytes(&self, dst: &mut [u8]) -> Result<usize> {
        let content = self.content();
        if content.len() > dst.len() {
            return Err(PackError::BufferTooSmall {
                needed: content.len(),
                capacity: dst.len(),
            });
        }
        dst[..content.len()].copy_from_slice(content);
        Ok(content.len())
    }

    /// Borrow the current String element as `&str`.
    pub fn as_str(&self) -> Option<&'a str> {
        if !self.is_string() {
            return None;
        }
        std::str::from_utf8(self.content()).ok()
    }

    /// Borrow the current Bytes element.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        self.is_bytes().then(|| self.content())
    }

    /// Whether the current element is a String equal to `text`.
    pub fn equals(&self, text: &str) -> bool {
        self.is_string() && self.content() == text.as_bytes()
    }

    /// Like [`equals`](Self::equals), and step to the next sibling on a match.
    pub fn matches(&mut self, text: &str) -> bool {
        if !self.equals(text) {
            return false;
        }
        self.advance();
        true
    }
}
