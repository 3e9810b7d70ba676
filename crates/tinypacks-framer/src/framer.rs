use tracing::{debug, trace};

use crate::crc::crc16_update;
use crate::error::{FramerError, Result};

/// Frame delimiter.
pub const FLAG: u8 = 0x7E;
/// Escape prefix for reserved bytes inside a frame.
pub const ESCAPE: u8 = 0x7D;
/// Value XORed into an escaped byte.
pub const ESCAPE_XOR: u8 = 0x20;
/// Length of the CRC trailer appended to every payload.
pub const CRC_LEN: usize = 2;

/// Direction the framer buffer is currently used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramerMode {
    #[default]
    Receiving,
    Sending,
}

/// Duplex byte-stuffing framer over one fixed buffer.
///
/// The buffer is shared between directions: while [`FramerMode::Sending`]
/// it holds the outgoing payload and its trailer, otherwise it accumulates
/// incoming bytes. Any `B: AsRef<[u8]> + AsMut<[u8]>` can back it.
///
/// Incoming frames are validated without a second pass: the CRC register
/// is chained through two lag registers, so when the flag arrives the value
/// from two bytes earlier is exactly the CRC of the payload, ready to be
/// compared with the trailer bytes already in the buffer.
#[derive(Debug)]
pub struct Framer<B> {
    buffer: B,
    mode: FramerMode,
    len: usize,
    index: usize,
    crc: u16,
    crc1: u16,
    crc2: u16,
    escape: bool,
    overflowed: bool,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Framer<B> {
    /// Create a framer in receiving mode backed by `buffer`.
    pub fn new(buffer: B) -> Self {
        Self {
            buffer,
            mode: FramerMode::Receiving,
            len: 0,
            index: 0,
            crc: 0,
            crc1: 0,
            crc2: 0,
            escape: false,
            overflowed: false,
        }
    }

    /// Feed one received byte.
    ///
    /// Returns the payload length when the byte closes a valid frame; the
    /// payload is then available from [`payload`](Self::payload) until the
    /// next byte is fed. Bytes are ignored while a send is in flight.
    pub fn receive_byte(&mut self, byte: u8) -> Option<usize> {
        if self.mode != FramerMode::Receiving {
            return None;
        }

        match byte {
            ESCAPE => {
                self.escape = true;
                None
            }
            FLAG => {
                let result = self.check_frame();
                self.reset_receive();
                result
            }
            _ => {
                let byte = if self.escape {
                    self.escape = false;
                    byte ^ ESCAPE_XOR
                } else {
                    byte
                };

                self.crc2 = self.crc1;
                self.crc1 = self.crc;
                self.crc = crc16_update(self.crc, byte);

                let capacity = self.capacity();
                if self.index < capacity {
                    self.buffer.as_mut()[self.index] = byte;
                    self.index += 1;
                } else if !self.overflowed {
                    self.overflowed = true;
                    debug!(capacity, "frame exceeds receive buffer; dropping bytes");
                }
                None
            }
        }
    }

    fn check_frame(&mut self) -> Option<usize> {
        if self.index <= CRC_LEN {
            if self.index > 0 {
                debug!(len = self.index, "frame too short; dropped");
            }
            return None;
        }

        let buf = self.buffer.as_ref();
        let trailer = u16::from_be_bytes([buf[self.index - 2], buf[self.index - 1]]);
        if trailer != self.crc2 {
            debug!(
                len = self.index,
                expected = self.crc2,
                received = trailer,
                "frame CRC mismatch; dropped"
            );
            return None;
        }

        self.len = self.index - CRC_LEN;
        trace!(len = self.len, "frame received");
        Some(self.len)
    }

    /// A flag always starts a fresh frame, so a dangling escape is dropped
    /// with the rest of the partial frame.
    fn reset_receive(&mut self) {
        self.escape = false;
        self.index = 0;
        self.crc = 0;
        self.crc1 = 0;
        self.crc2 = 0;
        self.overflowed = false;
    }

    /// Produce the next byte to put on the wire.
    ///
    /// While sending this walks the payload, the CRC trailer and the closing
    /// flag, then switches back to receiving. Outside a send it returns
    /// [`FLAG`], which receivers treat as idle line fill.
    pub fn next_byte_to_send(&mut self) -> u8 {
        if self.mode != FramerMode::Sending {
            return FLAG;
        }

        if self.index == self.len + CRC_LEN {
            trace!(len = self.len, "frame sent");
            self.mode = FramerMode::Receiving;
            self.reset_receive();
            return FLAG;
        }

        let len = self.len;
        if self.index == len {
            let trailer = self.crc.to_be_bytes();
            self.buffer.as_mut()[len..len + CRC_LEN].copy_from_slice(&trailer);
        }

        let byte = self.buffer.as_ref()[self.index];
        if self.escape {
            self.escape = false;
            self.crc = crc16_update(self.crc, byte);
            self.index += 1;
            byte ^ ESCAPE_XOR
        } else if byte == FLAG || byte == ESCAPE {
            self.escape = true;
            ESCAPE
        } else {
            self.crc = crc16_update(self.crc, byte);
            self.index += 1;
            byte
        }
    }

    /// Arm a send of the first `len` bytes already written to
    /// [`buffer_mut`](Self::buffer_mut).
    pub fn start_send(&mut self, len: usize) -> Result<()> {
        self.check_armable(len)?;

        self.mode = FramerMode::Sending;
        self.len = len;
        self.index = 0;
        self.crc = 0;
        self.crc1 = 0;
        self.crc2 = 0;
        self.escape = false;
        self.overflowed = false;
        Ok(())
    }

    /// Copy `payload` into the buffer and arm a send.
    pub fn load(&mut self, payload: &[u8]) -> Result<()> {
        self.check_armable(payload.len())?;
        self.buffer.as_mut()[..payload.len()].copy_from_slice(payload);
        self.start_send(payload.len())
    }

    fn check_armable(&self, size: usize) -> Result<()> {
        if self.mode == FramerMode::Sending {
            return Err(FramerError::Busy);
        }
        let max = self.max_payload_len();
        if size > max || self.capacity() < CRC_LEN {
            return Err(FramerError::PayloadTooLarge { size, max });
        }
        Ok(())
    }

    /// Abandon an in-flight send and go back to receiving.
    ///
    /// The peer sees a truncated frame, which it drops at the next flag.
    pub fn cancel_send(&mut self) {
        if self.mode == FramerMode::Sending {
            debug!(len = self.len, sent = self.index, "send cancelled");
            self.mode = FramerMode::Receiving;
            self.reset_receive();
        }
    }

    pub fn mode(&self) -> FramerMode {
        self.mode
    }

    pub fn is_sending(&self) -> bool {
        self.mode == FramerMode::Sending
    }

    /// Length of the last received frame, or of the armed send.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total buffer size, including room for the CRC trailer.
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().len()
    }

    /// Largest payload that can be sent or received.
    pub fn max_payload_len(&self) -> usize {
        self.capacity().saturating_sub(CRC_LEN)
    }

    /// The last received payload, or the payload being sent.
    pub fn payload(&self) -> &[u8] {
        &self.buffer.as_ref()[..self.len]
    }

    /// The whole backing buffer, for writing a payload in place before
    /// [`start_send`](Self::start_send).
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut()
    }

    pub fn into_inner(self) -> B {
        self.buffer
    }
}
