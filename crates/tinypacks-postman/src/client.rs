//! Host side: building requests and reading responses.

use std::io::{Read, Write};

use bytes::Bytes;
use tinypacks_framer::{FrameReader, FrameWriter};
use tinypacks_pack::{PackConfig, PackDecoder, PackEncoder};
use tracing::debug;

use crate::error::{PostmanError, Result};
use crate::router::MAX_PATH_LEN;
use crate::status::{Method, Status};

/// Tokens wrap at this value.
const TOKEN_MODULUS: i32 = 0x80;

/// Append a request to `encoder`.
///
/// `body` holds zero or more already-encoded elements and is copied as is.
pub fn write_request(
    encoder: &mut PackEncoder<'_>,
    method: Method,
    token: i32,
    path: &str,
    body: &[u8],
) -> Result<()> {
    if path.len() > MAX_PATH_LEN {
        return Err(PostmanError::PathTooLong {
            len: path.len(),
            max: MAX_PATH_LEN,
        });
    }
    encoder.put_integer(i32::from(method.code()))?;
    encoder.put_integer(token)?;
    encoder.put_string(path)?;
    encoder.put_raw(body)?;
    Ok(())
}

/// Encode a request into `dst` with the default configuration, returning
/// its length.
pub fn build_request(
    method: Method,
    token: i32,
    path: &str,
    body: &[u8],
    dst: &mut [u8],
) -> Result<usize> {
    let mut encoder = PackEncoder::new(dst);
    write_request(&mut encoder, method, token, path, body)?;
    Ok(encoder.offset())
}

/// A decoded response payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    /// The echoed token, if the device got far enough to echo it and it is
    /// an Integer.
    pub token: Option<i32>,
    /// Remaining elements, still encoded.
    pub body: Bytes,
    config: PackConfig,
}

impl Response {
    pub fn parse(payload: &[u8], config: PackConfig) -> Result<Self> {
        let mut decoder = PackDecoder::with_config(payload, config);
        if !decoder.advance() || !decoder.is_integer() {
            return Err(PostmanError::MalformedResponse("missing status"));
        }
        let code = u8::try_from(decoder.get_integer())
            .map_err(|_| PostmanError::MalformedResponse("status out of range"))?;
        let status = Status::from_code(code).ok_or(PostmanError::UnknownStatus(code))?;

        let mut token = None;
        if decoder.advance() {
            token = decoder.is_integer().then(|| decoder.get_integer());
        }
        let body_start = decoder.element_offset() + decoder.element_len();

        Ok(Self {
            status,
            token,
            body: Bytes::copy_from_slice(&payload[body_start..]),
            config,
        })
    }

    /// A decoder over the body elements.
    pub fn body_decoder(&self) -> PackDecoder<'_> {
        PackDecoder::with_config(&self.body, self.config)
    }
}

/// Parse a response encoded with the default configuration.
pub fn parse_response(payload: &[u8]) -> Result<Response> {
    Response::parse(payload, PackConfig::default())
}

/// Blocking request/response client for a device on a framed link.
///
/// Each exchange sends one request frame and waits for one response frame.
/// The token starts at 0 and advances modulo 128 after every successful
/// exchange.
pub struct Client<R, W> {
    reader: FrameReader<R, Box<[u8]>>,
    writer: FrameWriter<W, Box<[u8]>>,
    scratch: Box<[u8]>,
    token: i32,
    config: PackConfig,
}

impl<R: Read, W: Write> Client<R, W> {
    /// Create a client whose frames carry at most `capacity - 2` payload
    /// bytes.
    pub fn new(reader: R, writer: W, capacity: usize) -> Self {
        Self::with_config(reader, writer, capacity, PackConfig::default())
    }

    pub fn with_config(reader: R, writer: W, capacity: usize, config: PackConfig) -> Self {
        Self {
            reader: FrameReader::new(reader, vec![0u8; capacity].into_boxed_slice()),
            writer: FrameWriter::new(writer, vec![0u8; capacity].into_boxed_slice())
                .with_leading_flag(true),
            scratch: vec![0u8; capacity].into_boxed_slice(),
            token: 0,
            config,
        }
    }

    /// Token the next request will carry.
    pub fn token(&self) -> i32 {
        self.token
    }

    pub fn get(&mut self, path: &str) -> Result<Response> {
        self.request(Method::Get, path, &[])
    }

    pub fn post(&mut self, path: &str, body: &[u8]) -> Result<Response> {
        self.request(Method::Post, path, body)
    }

    pub fn put(&mut self, path: &str, body: &[u8]) -> Result<Response> {
        self.request(Method::Put, path, body)
    }

    pub fn delete(&mut self, path: &str) -> Result<Response> {
        self.request(Method::Delete, path, &[])
    }

    /// Send one request and wait for its response.
    pub fn request(&mut self, method: Method, path: &str, body: &[u8]) -> Result<Response> {
        let len = {
            let mut encoder = PackEncoder::with_config(&mut self.scratch, self.config);
            write_request(&mut encoder, method, self.token, path, body)?;
            encoder.offset()
        };
        self.writer.send(&self.scratch[..len])?;

        let payload = self.reader.read_frame()?;
        let response = Response::parse(&payload, self.config)?;
        if let Some(received) = response.token {
            if received != self.token {
                return Err(PostmanError::TokenMismatch {
                    expected: self.token,
                    received,
                });
            }
        }

        debug!(%method, path, token = self.token, status = %response.status, "exchange complete");
        self.token = (self.token + 1) % TOKEN_MODULUS;
        Ok(response)
    }

    /// Split back into the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        (self.reader.into_inner(), self.writer.into_inner())
    }
}
