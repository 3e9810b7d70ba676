//! The running CRC-16 used in frame trailers.
//!
//! This is CRC-16/XMODEM (polynomial `0x1021`, initial value 0), computed a
//! byte at a time with shifts instead of a table. Peers compute it exactly
//! this way; do not change it.

/// Fold one byte into a running CRC.
#[inline]
pub fn crc16_update(crc: u16, byte: u8) -> u16 {
    let mut crc = crc.rotate_left(8);
    crc ^= byte as u16;
    crc ^= (crc & 0xFF) >> 4;
    crc ^= crc << 12;
    crc ^= (crc & 0xFF) << 5;
    crc
}

/// CRC of a whole slice, starting from zero.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0, |crc, byte| crc16_update(crc, *byte))
}
