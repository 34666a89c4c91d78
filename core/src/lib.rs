//! Declarative HTTP client: declare defaults once, call verbs many times.
//!
//! # Overview
//! A `Client` carries a base URI, default headers, default query params,
//! basic-auth credentials and a response format. Each `get` / `post` /
//! `put` / `delete` call merges those defaults with per-call
//! `RequestOptions`, sends the result through a `Transport`, and decodes the
//! body as JSON, XML, or leaves it raw.
//!
//! # Design
//! - Call-level values win over client defaults, and calls never write the
//!   defaults back. Only the `merge_*` / `set_*` methods change them.
//! - The response format is taken from `set_format`, or else from the first
//!   request path with a `.json` / `.xml` extension, and then sticks.
//! - Requests are plain data (`OutgoingRequest`), so assembly is testable
//!   without a network and a host can run the I/O itself.
//! - Known limitation: configuration has a single writer (`&mut self`).
//!   Share a configured client by reference; do not reconfigure it while
//!   calls are in flight.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod format;
pub mod http;
pub mod options;
pub mod transport;
pub mod uri;

pub use client::Client;
pub use config::{ClientConfig, Credentials};
pub use decode::{decode, Parsed};
pub use error::{Error, Result};
pub use format::Format;
pub use http::{HttpMethod, HttpResponse, OutgoingRequest};
pub use options::{Params, RequestOptions};
pub use transport::{Transport, UreqConnection, UreqTransport};
pub use uri::Endpoint;
