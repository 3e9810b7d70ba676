//! Compact binary serialization and CRC-checked framing for small serial
//! links.
//!
//! TinyPacks encodes self-describing values (None, Boolean, Integer, Real,
//! String, Bytes, List, Map) into caller-owned fixed buffers, and carries
//! them between a host and a microcontroller in byte-stuffed frames
//! protected by a CRC-16.
//!
//! # Crate Structure
//!
//! - [`pack`]: the element format, [`pack::PackEncoder`] and [`pack::PackDecoder`]
//! - [`framer`]: the byte-at-a-time [`framer::Framer`] and its io pumps
//! - [`postman`]: path/method dispatch of requests (behind `postman` feature)

/// Re-export pack format types.
pub mod pack {
    pub use tinypacks_pack::*;
}

/// Re-export framing types.
pub mod framer {
    pub use tinypacks_framer::*;
}

/// Re-export dispatch types (requires `postman` feature).
#[cfg(feature = "postman")]
pub mod postman {
    pub use tinypacks_postman::*;
}
