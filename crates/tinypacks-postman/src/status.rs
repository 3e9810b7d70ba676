use std::fmt;

/// Request method, carried as the first Integer of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Method::Get),
            2 => Some(Method::Post),
            3 => Some(Method::Put),
            4 => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Method::Get => 1,
            Method::Post => 2,
            Method::Put => 3,
            Method::Delete => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Response status, CoAP-style: the high 3 bits are the class, the low 5
/// bits the detail (`0x25` reads as "2.05", i.e. 205 Content).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Created,
    Deleted,
    Changed,
    Content,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    RequestEntityTooLarge,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Status::Created => 0x21,
            Status::Deleted => 0x22,
            Status::Changed => 0x24,
            Status::Content => 0x25,
            Status::BadRequest => 0x40,
            Status::Unauthorized => 0x41,
            Status::Forbidden => 0x43,
            Status::NotFound => 0x44,
            Status::MethodNotAllowed => 0x45,
            Status::RequestEntityTooLarge => 0x4D,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let status = match code {
            0x21 => Status::Created,
            0x22 => Status::Deleted,
            0x24 => Status::Changed,
            0x25 => Status::Content,
            0x40 => Status::BadRequest,
            0x41 => Status::Unauthorized,
            0x43 => Status::Forbidden,
            0x44 => Status::NotFound,
            0x45 => Status::MethodNotAllowed,
            0x4D => Status::RequestEntityTooLarge,
            _ => return None,
        };
        Some(status)
    }

    /// Human-readable label, e.g. `"205 Content"`.
    pub fn text(self) -> &'static str {
        match self {
            Status::Created => "201 Created",
            Status::Deleted => "202 Deleted",
            Status::Changed => "204 Changed",
            Status::Content => "205 Content",
            Status::BadRequest => "400 Bad Request",
            Status::Unauthorized => "401 Unauthorized",
            Status::Forbidden => "403 Forbidden",
            Status::NotFound => "404 Not Found",
            Status::MethodNotAllowed => "405 Method Not Allowed",
            Status::RequestEntityTooLarge => "413 Request Entity Too Large",
        }
    }

    pub fn is_success(self) -> bool {
        self.code() >> 5 == 1
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
