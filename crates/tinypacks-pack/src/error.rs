/// Errors that can occur while encoding or navigating a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    /// The destination buffer cannot hold the element.
    #[error("buffer full ({needed} bytes needed, {available} available)")]
    BufferFull { needed: usize, available: usize },

    /// The caller-supplied output slice is too small for the element content.
    #[error("destination too small ({needed} bytes needed, {capacity} available)")]
    BufferTooSmall { needed: usize, capacity: usize },

    /// The length cannot be represented by the active format width.
    #[error("length {length} does not fit the {width} format width")]
    LengthOverflow {
        length: usize,
        width: crate::format::FormatWidth,
    },

    /// An integer outside the 32-bit range Integer elements carry.
    #[error("integer {value} does not fit in 32 bits")]
    IntegerOutOfRange { value: i128 },

    /// The container stack is already at its configured depth.
    #[error("container depth exceeded (max {max})")]
    DepthExceeded { max: usize },

    /// `close()` was called with no open container.
    #[error("no open container to close")]
    NothingOpen,

    /// `exit()` was called on the top-level scope.
    #[error("already at the top level")]
    AtRoot,

    /// The current element is not a container of the requested kind.
    #[error("current element is not a container")]
    NotContainer,

    /// The current container has no content to enter.
    #[error("container is empty")]
    EmptyContainer,

    /// The requested write offset lies outside the buffer.
    #[error("offset {offset} out of range (capacity {capacity})")]
    InvalidOffset { offset: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, PackError>;
