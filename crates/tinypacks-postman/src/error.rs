use tinypacks_framer::FramerError;
use tinypacks_pack::PackError;

/// Errors from the dispatch layer and the host-side client.
#[derive(Debug, thiserror::Error)]
pub enum PostmanError {
    #[error("resource table full ({max} entries)")]
    TableFull { max: usize },

    #[error("path too long ({len} bytes, max {max})")]
    PathTooLong { len: usize, max: usize },

    #[error("scratch buffer too small ({needed} bytes needed, {capacity} available)")]
    ScratchTooSmall { needed: usize, capacity: usize },

    #[error("malformed response: {0}")]
    MalformedResponse(&'static str),

    #[error("unknown status code 0x{0:02X}")]
    UnknownStatus(u8),

    #[error("response token {received} does not match request token {expected}")]
    TokenMismatch { expected: i32, received: i32 },

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Framer(#[from] FramerError),
}

pub type Result<T> = std::result::Result<T, PostmanError>;
