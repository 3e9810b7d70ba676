use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{FramerError, Result};
use crate::framer::{Framer, FLAG};

/// Writes framed payloads to any `Write` stream.
///
/// The whole frame is stuffed into an internal buffer first and written
/// with as few `write` calls as the stream allows.
pub struct FrameWriter<T, B> {
    inner: T,
    framer: Framer<B>,
    buf: BytesMut,
    leading_flag: bool,
}

impl<T: Write, B: AsRef<[u8]> + AsMut<[u8]>> FrameWriter<T, B> {
    /// Create a writer that stages payloads in `buffer`.
    ///
    /// Payloads longer than `buffer.len() - 2` bytes are rejected.
    pub fn new(inner: T, buffer: B) -> Self {
        let framer = Framer::new(buffer);
        let buf = BytesMut::with_capacity(framer.capacity() * 2 + 1);
        Self {
            inner,
            framer,
            buf,
            leading_flag: false,
        }
    }

    /// Also send a flag before every frame, so a receiver that joined
    /// mid-frame resynchronises before the payload starts.
    pub fn with_leading_flag(mut self, leading_flag: bool) -> Self {
        self.leading_flag = leading_flag;
        self
    }

    /// Frame and send a payload (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.framer.load(payload)?;

        self.buf.clear();
        if self.leading_flag {
            self.buf.put_u8(FLAG);
        }
        while self.framer.is_sending() {
            self.buf.put_u8(self.framer.next_byte_to_send());
        }

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FramerError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FramerError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FramerError::Io(err)),
            }
        }
    }

    /// Largest payload [`send`](Self::send) accepts.
    pub fn max_payload_len(&self) -> usize {
        self.framer.max_payload_len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
