/// Errors that can occur while arming or pumping a framer.
#[derive(Debug, thiserror::Error)]
pub enum FramerError {
    /// The payload plus its CRC trailer does not fit the framer buffer.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A frame is still being sent.
    #[error("framer busy sending a frame")]
    Busy,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FramerError>;
