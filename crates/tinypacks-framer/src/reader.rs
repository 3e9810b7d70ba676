use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FramerError, Result};
use crate::framer::Framer;

const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete, CRC-checked frames from any `Read` stream.
///
/// Corrupt frames and line noise are dropped silently; callers only see
/// payloads that passed the CRC check.
pub struct FrameReader<T, B> {
    inner: T,
    framer: Framer<B>,
    pending: BytesMut,
}

impl<T: Read, B: AsRef<[u8]> + AsMut<[u8]>> FrameReader<T, B> {
    /// Create a reader that receives into `buffer`.
    ///
    /// Frames longer than `buffer.len() - 2` bytes are dropped.
    pub fn new(inner: T, buffer: B) -> Self {
        Self {
            inner,
            framer: Framer::new(buffer),
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Read the next valid frame payload (blocking).
    ///
    /// Returns `Err(FramerError::ConnectionClosed)` when EOF is reached,
    /// including EOF in the middle of a frame.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            let mut found = None;
            for (position, byte) in self.pending.iter().enumerate() {
                if self.framer.receive_byte(*byte).is_some() {
                    found = Some(position);
                    break;
                }
            }

            match found {
                Some(position) => {
                    self.pending.advance(position + 1);
                    return Ok(Bytes::copy_from_slice(self.framer.payload()));
                }
                None => self.pending.clear(),
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FramerError::Io(err)),
            };

            if read == 0 {
                return Err(FramerError::ConnectionClosed);
            }

            self.pending.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The receiving framer.
    pub fn framer(&self) -> &Framer<B> {
        &self.framer
    }
}
