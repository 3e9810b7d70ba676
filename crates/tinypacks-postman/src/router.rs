use tinypacks_framer::{Framer, FramerError};
use tinypacks_pack::{PackConfig, PackDecoder, PackEncoder};
use tracing::{debug, trace};

use crate::error::{PostmanError, Result};
use crate::resource::{Request, Resource};
use crate::status::{Method, Status};

/// Default number of resources a [`Postman`] can hold.
pub const DEFAULT_MAX_RESOURCES: usize = 4;

/// Longest accepted path, in bytes.
pub const MAX_PATH_LEN: usize = 15;

struct Route<'r> {
    path: &'r str,
    resource: &'r mut dyn Resource,
}

/// Routes request payloads to registered resources by path.
///
/// The table holds at most `N` resources and never allocates. A GET on the
/// empty path lists every registered path.
pub struct Postman<'r, const N: usize = DEFAULT_MAX_RESOURCES> {
    routes: [Option<Route<'r>>; N],
    len: usize,
    config: PackConfig,
}

impl<'r> Postman<'r> {
    pub fn new() -> Self {
        Self::with_config(PackConfig::default())
    }

    pub fn with_config(config: PackConfig) -> Self {
        Self::with_slots(config)
    }
}

impl Default for Postman<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r, const N: usize> Postman<'r, N> {
    /// Create a router with room for `N` resources.
    pub fn with_slots(config: PackConfig) -> Self {
        Self {
            routes: [const { None }; N],
            len: 0,
            config,
        }
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Register `resource` under `path`.
    ///
    /// Paths are matched exactly; if the same path is registered twice the
    /// first registration wins.
    pub fn register(&mut self, path: &'r str, resource: &'r mut dyn Resource) -> Result<()> {
        if path.len() > MAX_PATH_LEN {
            return Err(PostmanError::PathTooLong {
                len: path.len(),
                max: MAX_PATH_LEN,
            });
        }
        if self.len == N {
            return Err(PostmanError::TableFull { max: N });
        }
        self.routes[self.len] = Some(Route { path, resource });
        self.len += 1;
        Ok(())
    }

    /// Registered paths, in registration order.
    pub fn paths(&self) -> impl Iterator<Item = &'r str> + '_ {
        self.routes.iter().flatten().map(|route| route.path)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle one request payload, writing the response into `response`.
    ///
    /// Returns the response length. Malformed requests still get a
    /// response (400); the only error is a response buffer too small for
    /// the status element.
    pub fn handle(&mut self, request: &[u8], response: &mut [u8]) -> Result<usize> {
        let mut writer = PackEncoder::with_config(response, self.config);
        // Placeholder 1-byte Integer; the status byte is patched in below.
        writer.put_integer(0)?;
        let reader = PackDecoder::with_config(request, self.config);

        let (status, len) = self.dispatch(reader, writer);
        response[1] = status.code();
        Ok(len)
    }

    fn dispatch<'a>(
        &mut self,
        mut reader: PackDecoder<'a>,
        mut writer: PackEncoder<'a>,
    ) -> (Status, usize) {
        if !reader.advance() || !reader.is_integer() {
            debug!("request without method");
            return (Status::BadRequest, writer.offset());
        }
        let code = reader.get_integer();
        if code == 0 {
            debug!("request with zero method");
            return (Status::BadRequest, writer.offset());
        }

        if !reader.advance() || writer.put_raw(reader.element()).is_err() {
            debug!("request without token");
            return (Status::BadRequest, writer.offset());
        }

        if !reader.advance() {
            debug!("request without path");
            return (Status::BadRequest, writer.offset());
        }
        let Some(path) = reader.as_str().filter(|path| path.len() <= MAX_PATH_LEN) else {
            debug!(len = reader.content_len(), "request path invalid");
            return (Status::BadRequest, writer.offset());
        };

        if code == i32::from(Method::Get.code()) && path.is_empty() {
            let status = self.write_index(&mut writer);
            trace!(status = %status, "index listed");
            return (status, writer.offset());
        }

        let Some(route) = self
            .routes
            .iter_mut()
            .flatten()
            .find(|route| route.path == path)
        else {
            trace!(path, "no such resource");
            return (Status::NotFound, writer.offset());
        };

        let Some(method) = Method::from_code(code) else {
            debug!(code, path, "unknown method");
            return (Status::BadRequest, writer.offset());
        };

        let mut request = Request::new(path, reader, writer);
        let status = match method {
            Method::Get => route.resource.get(&mut request),
            Method::Post => route.resource.post(&mut request),
            Method::Put => route.resource.put(&mut request),
            Method::Delete => route.resource.delete(&mut request),
        };
        trace!(%method, path, status = %status, "request handled");
        (status, request.writer.offset())
    }

    fn write_index(&self, writer: &mut PackEncoder<'_>) -> Status {
        let mark = writer.offset();
        let listed = writer.open_list().and_then(|()| {
            for path in self.paths() {
                writer.put_string(path)?;
            }
            writer.close()
        });

        match listed {
            Ok(()) => Status::Content,
            Err(err) => {
                debug!(error = %err, "resource index does not fit the response");
                // `mark` was read from this writer, so rewinding to it cannot fail.
                let _ = writer.rewind(mark);
                Status::RequestEntityTooLarge
            }
        }
    }
}

/// Answer the frame `framer` just received.
///
/// Call this right after [`Framer::receive_byte`] reported a frame. The
/// request is copied into `scratch` (the framer buffer is reused for the
/// response), handled, and the response is armed for sending. Returns the
/// response length.
pub fn serve_frame<B, const N: usize>(
    framer: &mut Framer<B>,
    postman: &mut Postman<'_, N>,
    scratch: &mut [u8],
) -> Result<usize>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    if framer.is_sending() {
        return Err(FramerError::Busy.into());
    }

    let payload = framer.payload();
    let needed = payload.len();
    if needed > scratch.len() {
        return Err(PostmanError::ScratchTooSmall {
            needed,
            capacity: scratch.len(),
        });
    }
    scratch[..needed].copy_from_slice(payload);

    let max = framer.max_payload_len();
    let len = postman.handle(&scratch[..needed], &mut framer.buffer_mut()[..max])?;
    framer.start_send(len)?;
    Ok(len)
}
