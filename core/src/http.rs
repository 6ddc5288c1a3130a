//! HTTP plain-data types and the raw response splitter.
//!
//! # Design
//! A transfer engine that returns headers inline hands back one byte stream:
//! `status line + headers + CRLF CRLF + body`. When the transfer went through
//! a redirect, a `100 Continue` or a proxy tunnel, the stream starts with
//! extra header blocks from those intermediate responses. Only the final
//! block describes the response the caller asked for, so [`split_response`]
//! drops everything before it.

use std::fmt;

/// Separator between the header block and the body.
const BLANK_LINE: &str = "\r\n\r\n";

/// Separator that starts a chained header block of a later response.
const CHAINED_HEAD: &str = "\r\n\r\nHTTP/";

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    /// Any other verb, passed through verbatim.
    Custom(String),
}

impl HttpMethod {
    /// Parse a method name case-insensitively.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "HEAD" => HttpMethod::Head,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            other => HttpMethod::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Custom(name) => name,
        }
    }

    /// Whether a request with this method carries a body.
    pub fn has_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header and body text of the final response in a raw payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseParts {
    pub headers: String,
    pub body: String,
}

/// Split a raw transfer payload into the final response's headers and body.
///
/// Everything up to the last `CRLF CRLF HTTP/` is discarded. The remaining
/// tail is cut at its first blank line. A tail without a blank line is all
/// headers and an empty body. Empty input gives empty parts.
pub fn split_response(raw: &[u8]) -> ResponseParts {
    if raw.is_empty() {
        return ResponseParts::default();
    }

    let text = String::from_utf8_lossy(raw);
    let tail = match text.rfind(CHAINED_HEAD) {
        // Keep the "HTTP/" that opens the final block.
        Some(at) => &text[at + BLANK_LINE.len()..],
        None => &text[..],
    };

    match tail.split_once(BLANK_LINE) {
        Some((headers, body)) => ResponseParts {
            headers: headers.to_string(),
            body: body.to_string(),
        },
        None => ResponseParts {
            headers: tail.to_string(),
            body: String::new(),
        },
    }
}
