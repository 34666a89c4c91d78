//! Base-URI normalization and request-URI assembly.
//!
//! # Design
//! Assembly is plain string work so that whatever the caller wrote (a raw
//! query with a trailing `&`, an unusual path) reaches the wire unchanged.
//! The request target is sliced out of the assembled string for the same
//! reason. The `url` crate is only used to pull out the host and port the
//! transport needs.

use url::Url;

use crate::error::{Error, Result};

/// True when `s` starts with `http://` or `https://`.
pub fn is_absolute(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Prefix a scheme onto a base URI that lacks one.
///
/// `https://` is chosen when `:443` appears anywhere in the string, which is
/// a port sniff and nothing more; everything else gets `http://`.
pub fn normalize_base_uri(s: &str) -> String {
    if is_absolute(s) {
        s.to_string()
    } else if s.contains(":443") {
        format!("https://{s}")
    } else {
        format!("http://{s}")
    }
}

/// Ensure a request path starts with `/`, leaving absolute URIs alone.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') || is_absolute(path) {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Join a base URI, a request path and a new query fragment.
///
/// An absolute `path` replaces the base entirely. When the joined URI already
/// carries a query, it is kept and suffixed with `&` before `query` is
/// appended; the result is emitted as-is even if it ends in `&`. A fragment
/// (`#...`) never reaches the server and is dropped.
pub fn build_request_uri(base_uri: Option<&str>, path: &str, query: Option<&str>) -> String {
    let path = normalize_path(path);
    let joined = match base_uri {
        Some(base) if !is_absolute(&path) => format!("{base}{path}"),
        _ => path,
    };
    let unfragmented = match joined.split_once('#') {
        Some((before, _)) => before,
        None => joined.as_str(),
    };

    let (location, existing) = match unfragmented.split_once('?') {
        Some((location, existing)) => (location, Some(existing)),
        None => (unfragmented, None),
    };

    let mut full_query = existing.map(|q| format!("{q}&")).unwrap_or_default();
    if let Some(fragment) = query {
        full_query.push_str(fragment);
    }

    if full_query.is_empty() {
        location.to_string()
    } else {
        format!("{location}?{full_query}")
    }
}

/// Host and port a connection is opened against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Whether TLS is used. Derived from the port alone (443), not from the
    /// scheme written in the URI.
    pub secure: bool,
}

impl Endpoint {
    pub fn from_uri(uri: &str) -> Result<Self> {
        let parsed = parse_absolute(uri)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::invalid(format!("request URI `{uri}` has no host")))?
            .to_string();
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| Error::invalid(format!("request URI `{uri}` has no port")))?;
        Ok(Self {
            host,
            port,
            secure: port == 443,
        })
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// `scheme://host:port` for this endpoint.
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.host, self.port)
    }
}

/// Path plus query of an absolute URI, the part sent on the request line.
///
/// Sliced straight out of `uri`: nothing is re-encoded and dot segments are
/// left in place. An empty path becomes `/`.
pub fn request_target(uri: &str) -> Result<String> {
    let authority_and_rest = match uri.split_once("://") {
        Some((_, rest)) if is_absolute(uri) => rest,
        _ => return Err(Error::invalid(format!("request URI `{uri}` is not absolute"))),
    };
    let target = match authority_and_rest.find(['/', '?']) {
        Some(start) => &authority_and_rest[start..],
        None => "",
    };
    Ok(if target.starts_with('/') {
        target.to_string()
    } else {
        format!("/{target}")
    })
}

fn parse_absolute(uri: &str) -> Result<Url> {
    Url::parse(uri).map_err(|e| Error::invalid(format!("cannot parse request URI `{uri}`: {e}")))
}
