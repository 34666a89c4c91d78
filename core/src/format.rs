//! Response formats and the path-extension heuristic that picks one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Wire format used to decode a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Format {
    Xml,
    Json,
}

impl Format {
    /// Every format the decoder understands.
    pub const ALLOWED: [Format; 2] = [Format::Xml, Format::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Format {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALLOWED
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

impl TryFrom<String> for Format {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Guess a format from the extension of the last path segment.
///
/// The query string and fragment are ignored, and a segment that only starts
/// with a dot (`/.json`) has no extension. Unknown extensions yield `None`.
pub fn format_from_path(path: &str) -> Option<Format> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segment = path.rsplit('/').next().unwrap_or_default();
    match segment.rfind('.') {
        Some(idx) if idx > 0 => segment[idx + 1..].parse().ok(),
        _ => None,
    }
}

/// Pick the format for a call.
///
/// A configured (or previously resolved) format always wins; otherwise the
/// path's extension is consulted.
pub fn resolve_format(path: &str, configured: Option<Format>) -> Option<Format> {
    configured.or_else(|| format_from_path(path))
}
