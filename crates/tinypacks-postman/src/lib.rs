//! Resource/method dispatch for TinyPacks requests.
//!
//! A request payload is a short sequence of pack elements:
//! - `method`: Integer, 1 GET, 2 POST, 3 PUT, 4 DELETE
//! - `token`: any element, echoed back untouched
//! - `path`: String of at most 15 bytes
//! - optional body elements
//!
//! The response starts with a 1-byte Integer status and the echoed token,
//! followed by whatever the resource wrote.
//!
//! [`Postman`] is the device side. The [`client`] module builds requests and
//! parses responses for host tools.

pub mod client;
pub mod error;
pub mod resource;
pub mod router;
pub mod status;

pub use client::{build_request, parse_response, write_request, Client, Response};
pub use error::{PostmanError, Result};
pub use resource::{Request, Resource};
pub use router::{serve_frame, Postman, DEFAULT_MAX_RESOURCES, MAX_PATH_LEN};
pub use status::{Method, Status};
