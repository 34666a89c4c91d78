//! Error types for the client.
//!
//! # Design
//! Every failure a verb call can produce lands in exactly one variant, and
//! nothing is retried or swallowed on the way out. `Decode` keeps the raw
//! body alongside the parser error so callers can inspect what the server
//! actually sent. `Transport` stays opaque: whatever the network layer
//! reported is boxed and passed through as the source.

use crate::format::Format;

/// Boxed error from a collaborator (transport or parser).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by `Client` configuration and verb methods.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A method name, header, credential, URI or configuration document was
    /// not acceptable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A format outside the supported set was requested.
    #[error("unsupported format `{0}`, must be one of: xml, json")]
    UnsupportedFormat(String),

    /// The response body could not be parsed under the resolved format.
    #[error("failed to decode {format} response body: {source}")]
    Decode {
        format: Format,
        body: String,
        #[source]
        source: BoxError,
    },

    /// The underlying HTTP transport failed.
    #[error("transport failure: {0}")]
    Transport(#[source] BoxError),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn transport(err: impl Into<BoxError>) -> Self {
        Error::Transport(err.into())
    }
}
