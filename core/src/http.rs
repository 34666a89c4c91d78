//! HTTP request and response values exchanged with the transport.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! client assembles an `OutgoingRequest` without touching the network, and
//! a `Transport` turns it into an `HttpResponse`. A host that wants to run
//! the I/O itself can call `Client::build_request`, execute the request any
//! way it likes, and hand the body to `decode`.
//!
//! All fields use owned types (`String`, `Vec`) so a request can outlive
//! the options it was built from.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::uri::{self, Endpoint};

/// The verbs a client can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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

impl FromStr for HttpMethod {
    type Err = Error;

    /// Case-insensitive; anything but get, post, put and delete is rejected.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            _ => Err(Error::invalid(format!(
                "unsupported method `{s}`, only get, post, put and delete are supported"
            ))),
        }
    }
}

/// A fully assembled request.
///
/// Built fresh by `Client::build_request` for every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    /// Absolute URI including the query string.
    pub uri: String,
    /// Lower-cased header names, sorted, one entry per name.
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Format the response will be decoded with; `None` means raw.
    pub format: Option<Format>,
}

impl OutgoingRequest {
    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Host and port this request targets.
    pub fn endpoint(&self) -> Result<Endpoint> {
        Endpoint::from_uri(&self.uri)
    }

    /// Path and query sent on the request line.
    pub fn request_target(&self) -> Result<String> {
        uri::request_target(&self.uri)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
