//! The declarative client: configuration, request assembly and dispatch.
//!
//! # Design
//! `Client` owns a `ClientConfig`, a `Transport`, and two once-only slots:
//! the format resolved from the first path with a usable extension, and
//! the connection opened for the first request. Configuration methods take
//! `&mut self`, so there is one writer at a time. Verb methods take `&self`
//! and never write the configuration; per-call options are merged into
//! fresh values.
//!
//! Each call is split the same way the host-does-IO pattern splits it:
//! `build_request` produces an `OutgoingRequest` as plain data, the
//! transport runs it, and `decode` interprets the body. Hosts that execute
//! requests themselves can call the first and last steps directly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::config::{ClientConfig, Credentials};
use crate::decode::{decode, Parsed};
use crate::error::{Error, Result};
use crate::format::{self, Format};
use crate::http::{HttpMethod, OutgoingRequest};
use crate::options::{to_query, Params, RequestOptions};
use crate::transport::{Transport, UreqTransport};
use crate::uri::{build_request_uri, normalize_path, Endpoint};

/// HTTP client assembled from declared defaults.
///
/// ```no_run
/// use rest_kit::{Client, RequestOptions};
///
/// let mut client: Client = Client::default();
/// client.set_base_uri("api.example.com");
/// client.merge_default_params([("api_key", "secret")]);
///
/// let users = client.get("/users.json", &RequestOptions::new())?;
/// # Ok::<(), rest_kit::Error>(())
/// ```
pub struct Client<T: Transport = UreqTransport> {
    config: ClientConfig,
    transport: T,
    resolved_format: OnceLock<Format>,
    connection: OnceLock<T::Connection>,
}

impl<T: Transport + fmt::Debug> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("resolved_format", &self.resolved_format.get())
            .field("connected", &self.connection.get().is_some())
            .finish()
    }
}

impl Default for Client<UreqTransport> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Client<UreqTransport> {
    /// Client using the default `ureq` transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::default())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            resolved_format: OnceLock::new(),
            connection: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The connection opened by the first dispatched request, if any.
    pub fn connection(&self) -> Option<&T::Connection> {
        self.connection.get()
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    pub fn set_base_uri(&mut self, base_uri: &str) -> &str {
        self.config.set_base_uri(base_uri)
    }

    pub fn base_uri(&self) -> Option<&str> {
        self.config.base_uri()
    }

    /// Store credentials used by every call that does not bring its own.
    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.config.set_basic_auth(username, password);
    }

    pub fn merge_default_params<I, K, V>(&mut self, update: I) -> &BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.config.merge_default_params(update)
    }

    pub fn merge_headers<I, K, V>(&mut self, update: I) -> &BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.config.merge_headers(update)
    }

    /// Set the response format, overriding one picked up from a path.
    pub fn set_format(&mut self, format: impl AsRef<str>) -> Result<Format> {
        self.config.set_format(format)
    }

    /// The format the next call will decode with, if already known.
    pub fn format(&self) -> Option<Format> {
        self.config.format().or_else(|| self.resolved_format.get().copied())
    }

    // -----------------------------------------------------------------------
    // Verbs
    // -----------------------------------------------------------------------

    pub fn get(&self, path: &str, options: &RequestOptions) -> Result<Parsed> {
        self.send_request(HttpMethod::Get, path, options)
    }

    pub fn post(&self, path: &str, options: &RequestOptions) -> Result<Parsed> {
        self.send_request(HttpMethod::Post, path, options)
    }

    pub fn put(&self, path: &str, options: &RequestOptions) -> Result<Parsed> {
        self.send_request(HttpMethod::Put, path, options)
    }

    pub fn delete(&self, path: &str, options: &RequestOptions) -> Result<Parsed> {
        self.send_request(HttpMethod::Delete, path, options)
    }

    /// Assemble, dispatch and decode one request.
    ///
    /// Transport failures are returned as they came; nothing is retried.
    pub fn send_request(&self, method: HttpMethod, path: &str, options: &RequestOptions) -> Result<Parsed> {
        let request = self.build_request(method, path, options)?;
        let connection = self.connect(&request)?;
        tracing::debug!(method = %request.method, uri = %request.uri, "dispatching request");

        let response = self.transport.execute(connection, &request)?;
        tracing::debug!(status = response.status, bytes = response.body.len(), "response received");
        decode(response.body, request.format)
    }

    /// Build the request a verb call would send, without sending it.
    pub fn build_request(&self, method: HttpMethod, path: &str, options: &RequestOptions) -> Result<OutgoingRequest> {
        let path = normalize_path(path);

        let query = match options.present_query() {
            None => None,
            Some(Params::Map(query)) => {
                let mut merged = self.config.default_params().clone();
                merged.extend(query.iter().map(|(k, v)| (k.clone(), v.clone())));
                Some(to_query(&merged)?)
            }
            Some(Params::Raw(query)) => Some(query.clone()),
        };
        let uri = build_request_uri(self.config.base_uri(), &path, query.as_deref());
        Endpoint::from_uri(&uri)?;

        let body = match options.present_body() {
            None => None,
            Some(Params::Map(body)) => Some(to_query(body)?),
            Some(Params::Raw(body)) => Some(body.clone()),
        };

        let credentials = options.basic_auth.as_ref().or(self.config.basic_auth());
        let headers = merge_headers(self.config.headers(), options.headers.as_ref(), credentials)?;
        let format = self.resolve_format(&path);
        tracing::trace!(%method, %uri, headers = headers.len(), has_body = body.is_some(), "request assembled");

        Ok(OutgoingRequest {
            method,
            uri,
            headers,
            body,
            format,
        })
    }

    /// Configured format first, then the cached path format, then this
    /// path's extension. A format found here is cached for later calls.
    fn resolve_format(&self, path: &str) -> Option<Format> {
        let known = self.format();
        let format = format::resolve_format(path, known)?;
        if known.is_some() {
            return Some(format);
        }
        tracing::debug!(%format, path, "format resolved from path extension");
        Some(*self.resolved_format.get_or_init(|| format))
    }

    /// The client's connection, opened for `request`'s endpoint on first use.
    fn connect(&self, request: &OutgoingRequest) -> Result<&T::Connection> {
        if let Some(connection) = self.connection.get() {
            return Ok(connection);
        }
        let connection = self.transport.connect(&request.endpoint()?)?;
        Ok(self.connection.get_or_init(|| connection))
    }
}

/// Overlay call headers on the defaults, then apply basic auth last so
/// nothing in either header layer can replace it.
fn merge_headers(
    defaults: &BTreeMap<String, String>,
    overrides: Option<&BTreeMap<String, String>>,
    credentials: Option<&Credentials>,
) -> Result<Vec<(String, String)>> {
    let mut merged = BTreeMap::new();
    for (name, value) in defaults.iter().chain(overrides.into_iter().flatten()) {
        check_header(name, value)?;
        merged.insert(name.to_ascii_lowercase(), value.clone());
    }
    if let Some(credentials) = credentials {
        check_credentials(credentials)?;
        merged.insert("authorization".to_string(), credentials.authorization());
    }
    Ok(merged.into_iter().collect())
}

fn check_header(name: &str, value: &str) -> Result<()> {
    let valid_name = !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_graphic() && !matches!(b, b':' | b'(' | b')' | b'"' | b'/' | b'[' | b']'));
    if !valid_name {
        return Err(Error::invalid(format!("invalid header name `{name}`")));
    }
    if value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0) {
        return Err(Error::invalid(format!("invalid value for header `{name}`")));
    }
    Ok(())
}

fn check_credentials(credentials: &Credentials) -> Result<()> {
    if credentials.username.contains(':') {
        return Err(Error::invalid("basic auth username must not contain `:`"));
    }
    Ok(())
}
