//! HTTP transport types.
//!
//! # Design
//! Requests and responses are plain data. `OntraportClient::build_*` methods
//! produce an `HttpRequest` without touching the network, and a `Transport`
//! implementation turns it into an `HttpResponse`. Keeping the two apart
//! lets every payload be asserted on in tests without a server.

use std::fmt;
use std::time::Duration;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute. `body` holds the already-encoded form body, ready to be
/// written to the wire as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Look up a field of the form body by name, returning its raw
    /// (still percent-encoded) value.
    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.body
            .as_deref()?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// What was sent and how it went, returned next to every response body.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub http_method: HttpMethod,
    pub request_url: String,
    /// The posted form body with the API key replaced by `***`.
    pub posted_data: Option<String>,
    pub status: u16,
    /// Value of the response `Content-Type` header, if any.
    pub content_type: Option<String>,
    pub response_headers: Vec<(String, String)>,
    pub elapsed: Duration,
}

/// A raw response body plus the diagnostics of the call that produced it.
#[derive(Debug, Clone)]
pub struct Reply {
    pub body: String,
    pub diagnostics: Diagnostics,
}
