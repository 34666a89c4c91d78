//! The network side of a call.
//!
//! # Design
//! The client only needs two things from an HTTP library: open a connection
//! to a host and port, and exchange one request for one response on it.
//! `Transport` captures exactly that, so tests can swap in a recording fake
//! and hosts can bring their own stack. `UreqTransport` is the blocking
//! implementation shipped with the crate.
//!
//! Redirects are never followed: a 3xx comes back as the response, body and
//! all, like any other status.
//!
//! TLS is chosen from the port (443) rather than the URI scheme, and
//! certificate verification is OFF unless `UreqTransport::verified` is
//! used. The insecure default is logged at `warn` every time a TLS
//! connection is opened.

use std::fmt;

use ureq::typestate::{WithBody, WithoutBody};
use ureq::tls::TlsConfig;
use ureq::{Agent, RequestBuilder};

use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpResponse, OutgoingRequest};
use crate::uri::Endpoint;

/// Content type supplied for bodies sent without one.
pub const DEFAULT_BODY_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A blocking HTTP exchange.
pub trait Transport {
    /// Handle kept for the lifetime of a client and reused for every call.
    type Connection;

    /// Open a connection to `endpoint`.
    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Connection>;

    /// Send `request` on `connection` and wait for the full response.
    ///
    /// Non-2xx statuses, redirects included, are responses, not errors.
    fn execute(&self, connection: &Self::Connection, request: &OutgoingRequest) -> Result<HttpResponse>;
}

/// `Transport` backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    insecure: bool,
}

impl UreqTransport {
    /// Transport with certificate verification DISABLED.
    pub fn insecure() -> Self {
        Self { insecure: true }
    }

    /// Transport that verifies server certificates.
    pub fn verified() -> Self {
        Self { insecure: false }
    }

    pub fn is_insecure(&self) -> bool {
        self.insecure
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::insecure()
    }
}

/// An agent bound to the endpoint of the first request.
pub struct UreqConnection {
    agent: Agent,
    endpoint: Endpoint,
}

impl UreqConnection {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl fmt::Debug for UreqConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqConnection").field("endpoint", &self.endpoint).finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    type Connection = UreqConnection;

    fn connect(&self, endpoint: &Endpoint) -> Result<UreqConnection> {
        if endpoint.secure && self.insecure {
            tracing::warn!(host = %endpoint.host, port = endpoint.port, "TLS certificate verification is disabled");
        }
        tracing::trace!(host = %endpoint.host, port = endpoint.port, secure = endpoint.secure, "opening connection");

        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .tls_config(TlsConfig::builder().disable_verification(self.insecure).build())
            .build()
            .new_agent();
        Ok(UreqConnection {
            agent,
            endpoint: endpoint.clone(),
        })
    }

    fn execute(&self, connection: &UreqConnection, request: &OutgoingRequest) -> Result<HttpResponse> {
        let url = format!("{}{}", connection.endpoint.origin(), request.request_target()?);
        let agent = &connection.agent;

        let result = match request.method {
            HttpMethod::Get => send_without_body(agent.get(&url), request),
            HttpMethod::Delete => send_without_body(agent.delete(&url), request),
            HttpMethod::Post => send_with_body(agent.post(&url), request),
            HttpMethod::Put => send_with_body(agent.put(&url), request),
        };
        let mut response = result.map_err(Error::transport)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let body = response.body_mut().read_to_string().map_err(Error::transport)?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn apply_headers<B>(mut builder: RequestBuilder<B>, request: &OutgoingRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if request.body.is_some() && request.header("content-type").is_none() {
        builder = builder.header("content-type", DEFAULT_BODY_CONTENT_TYPE);
    }
    builder
}

fn send_without_body(
    builder: RequestBuilder<WithoutBody>,
    request: &OutgoingRequest,
) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let builder = apply_headers(builder, request);
    match &request.body {
        Some(body) => builder.force_send_body().send(body.as_bytes()),
        None => builder.call(),
    }
}

fn send_with_body(
    builder: RequestBuilder<WithBody>,
    request: &OutgoingRequest,
) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let builder = apply_headers(builder, request);
    match &request.body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
