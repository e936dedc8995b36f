//! Result of a lookup, independent of the HTTP layer
//!
//! The server maps each variant to a wire status; see [`Outcome`].

use bytes::Bytes;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Request method as far as the engine cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    /// Headers only, no body
    Head,
}

impl Method {
    #[must_use]
    pub const fn is_head(self) -> bool {
        matches!(self, Self::Head)
    }
}

/// A successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    /// 200 for local hits, the upstream status for proxied ones
    pub status: u16,
    pub content_type: String,
    pub content_length: Option<u64>,
    /// `Content-Disposition` file name
    pub file_name: Option<String>,
    /// `None` for HEAD requests
    pub body: Option<Bytes>,
}

impl Served {
    /// Generated document served with status 200
    pub fn document(content_type: &str, body: impl Into<Bytes>, method: Method) -> Self {
        let body = body.into();
        Self {
            status: 200,
            content_type: content_type.to_string(),
            content_length: Some(body.len() as u64),
            file_name: None,
            body: (!method.is_head()).then_some(body),
        }
    }
}

/// Lookup outcome
///
/// | variant | wire status |
/// |---|---|
/// | `Served` | status carried by [`Served`] |
/// | `SoftError` | 200 with the message as body |
/// | `TryProxy` | never sent; routed to the proxy chain |
/// | `NotFound` | 404 |
/// | `Unauthorized` | 401 |
/// | `InternalError` | 500 |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Served(Served),
    /// Malformed request, answered with a readable message
    SoftError(String),
    /// Not available locally
    TryProxy(String),
    /// Definitive miss
    NotFound(String),
    Unauthorized(String),
    /// Local I/O failure
    InternalError(String),
}

impl Outcome {
    #[must_use]
    pub const fn is_served(&self) -> bool {
        matches!(self, Self::Served(_))
    }
}
