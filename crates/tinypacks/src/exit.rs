use std::fmt;
use std::io;

use tinypacks_framer::FramerError;
use tinypacks_pack::PackError;
use tinypacks_postman::PostmanError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn pack_error(context: &str, err: PackError) -> CliError {
    let code = match err {
        PackError::BufferFull { .. }
        | PackError::BufferTooSmall { .. }
        | PackError::LengthOverflow { .. }
        | PackError::IntegerOutOfRange { .. }
        | PackError::DepthExceeded { .. } => DATA_INVALID,
        PackError::NothingOpen
        | PackError::AtRoot
        | PackError::NotContainer
        | PackError::EmptyContainer
        | PackError::InvalidOffset { .. } => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn framer_error(context: &str, err: FramerError) -> CliError {
    match err {
        FramerError::Io(source) => io_error(context, source),
        FramerError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FramerError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        FramerError::Busy => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

pub fn postman_error(context: &str, err: PostmanError) -> CliError {
    match err {
        PostmanError::Pack(err) => pack_error(context, err),
        PostmanError::Framer(err) => framer_error(context, err),
        PostmanError::PathTooLong { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        PostmanError::MalformedResponse(_)
        | PostmanError::UnknownStatus(_)
        | PostmanError::TokenMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn json_error(context: &str, err: serde_json::Error) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_problems_are_data_errors() {
        let err = pack_error(
            "encode failed",
            PackError::BufferFull {
                needed: 9,
                available: 4,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("encode failed: "));

        let err = framer_error("frame failed", FramerError::PayloadTooLarge { size: 9, max: 4 });
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn nested_errors_map_through() {
        let err = postman_error(
            "request failed",
            PostmanError::Framer(FramerError::Io(io::Error::from(
                io::ErrorKind::PermissionDenied,
            ))),
        );
        assert_eq!(err.code, PERMISSION_DENIED);

        let err = postman_error("request failed", PostmanError::PathTooLong { len: 20, max: 15 });
        assert_eq!(err.code, USAGE);

        let err = postman_error("response failed", PostmanError::UnknownStatus(0x23));
        assert_eq!(err.code, DATA_INVALID);
        assert_eq!(err.to_string(), "response failed: unknown status code 0x23");
    }
}
