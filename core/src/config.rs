//! Per-client configuration: base URI, default headers and query params,
//! basic-auth credentials and response format.
//!
//! # Design
//! A `ClientConfig` is built once at startup and read on every call. All
//! mutation goes through `&mut self`, so one writer at a time is enforced
//! by ownership instead of a lock. Per-call overrides are merged into fresh
//! values at request time and never written back here; only the explicit
//! `merge_*` methods change the stored defaults.

use std::collections::BTreeMap;
use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::Format;
use crate::uri::normalize_base_uri;

/// A username/password pair sent as HTTP basic authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for the `authorization` header.
    pub fn authorization(&self) -> String {
        let token = general_purpose::STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings shared by every request a client makes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    base_uri: Option<String>,
    headers: BTreeMap<String, String>,
    default_params: BTreeMap<String, String>,
    basic_auth: Option<Credentials>,
    format: Option<Format>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration document such as
    /// `{"base_uri": "api.example.com", "format": "json"}`.
    ///
    /// The base URI goes through the same normalization as `set_base_uri`.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: ClientConfig = serde_json::from_str(json)
            .map_err(|e| Error::invalid(format!("invalid client configuration: {e}")))?;
        if let Some(base_uri) = config.base_uri.take() {
            config.set_base_uri(&base_uri);
        }
        Ok(config)
    }

    /// Store a base URI with one trailing slash removed and a scheme ensured.
    pub fn set_base_uri(&mut self, base_uri: &str) -> &str {
        let trimmed = base_uri.strip_suffix('/').unwrap_or(base_uri);
        self.base_uri.insert(normalize_base_uri(trimmed))
    }

    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    /// Replace the stored credentials.
    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.basic_auth = Some(Credentials::new(username, password));
    }

    pub fn basic_auth(&self) -> Option<&Credentials> {
        self.basic_auth.as_ref()
    }

    /// Merge `update` into the default query params and return the result.
    ///
    /// An empty update changes nothing and just returns the current params.
    pub fn merge_default_params<I, K, V>(&mut self, update: I) -> &BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        merge_into(&mut self.default_params, update);
        &self.default_params
    }

    pub fn default_params(&self) -> &BTreeMap<String, String> {
        &self.default_params
    }

    /// Merge `update` into the default headers and return the result.
    ///
    /// An empty update changes nothing and just returns the current headers.
    pub fn merge_headers<I, K, V>(&mut self, update: I) -> &BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        merge_into(&mut self.headers, update);
        &self.headers
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Set the response format. Only `xml` and `json` are accepted.
    pub fn set_format(&mut self, format: impl AsRef<str>) -> Result<Format> {
        let format = format.as_ref().parse()?;
        self.format = Some(format);
        Ok(format)
    }

    pub fn format(&self) -> Option<Format> {
        self.format
    }
}

fn merge_into<I, K, V>(target: &mut BTreeMap<String, String>, update: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    target.extend(update.into_iter().map(|(k, v)| (k.into(), v.into())));
}
