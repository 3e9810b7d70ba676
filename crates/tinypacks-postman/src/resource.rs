use tinypacks_pack::{PackDecoder, PackEncoder};

use crate::status::Status;

/// One request being dispatched to a [`Resource`].
pub struct Request<'a> {
    path: &'a str,
    /// Positioned on the path element; call `advance()` to reach the body.
    pub reader: PackDecoder<'a>,
    /// Positioned right after the echoed token. Whatever is written here
    /// becomes the response body.
    pub writer: PackEncoder<'a>,
}

impl<'a> Request<'a> {
    pub(crate) fn new(path: &'a str, reader: PackDecoder<'a>, writer: PackEncoder<'a>) -> Self {
        Self {
            path,
            reader,
            writer,
        }
    }

    pub fn path(&self) -> &'a str {
        self.path
    }
}

/// Something addressable by path.
///
/// Every method defaults to 405 Method Not Allowed, so a resource only
/// implements the methods it supports.
pub trait Resource {
    fn get(&mut self, _request: &mut Request<'_>) -> Status {
        Status::MethodNotAllowed
    }

    fn post(&mut self, _request: &mut Request<'_>) -> Status {
        Status::MethodNotAllowed
    }

    fn put(&mut self, _request: &mut Request<'_>) -> Status {
        Status::MethodNotAllowed
    }

    fn delete(&mut self, _request: &mut Request<'_>) -> Status {
        Status::MethodNotAllowed
    }
}
