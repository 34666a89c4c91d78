//! Per-call request options and form encoding.

use std::collections::BTreeMap;

use crate::config::Credentials;
use crate::error::{Error, Result};

/// A query or body value: key/value pairs to encode, or a pre-encoded string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    Map(BTreeMap<String, String>),
    Raw(String),
}

impl Params {
    /// Build a `Params::Map` from any iterator of pairs.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Params::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn raw(s: impl Into<String>) -> Self {
        Params::Raw(s.into())
    }

    /// An empty map or an empty string counts as "nothing given".
    pub fn is_blank(&self) -> bool {
        match self {
            Params::Map(map) => map.is_empty(),
            Params::Raw(s) => s.is_empty(),
        }
    }
}

impl From<&str> for Params {
    fn from(s: &str) -> Self {
        Params::Raw(s.to_string())
    }
}

impl From<String> for Params {
    fn from(s: String) -> Self {
        Params::Raw(s)
    }
}

impl From<BTreeMap<String, String>> for Params {
    fn from(map: BTreeMap<String, String>) -> Self {
        Params::Map(map)
    }
}

/// Options for a single call. Nothing here outlives the call, and the
/// client only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub query: Option<Params>,
    pub body: Option<Params>,
    pub headers: Option<BTreeMap<String, String>>,
    /// Overrides the client's stored credentials for this call.
    pub basic_auth: Option<Credentials>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<Params>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn body(mut self, body: impl Into<Params>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add one header, keeping any set before.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(BTreeMap::new).insert(name.into(), value.into());
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some(Credentials::new(username, password));
        self
    }

    /// The query, or `None` when it is absent or blank.
    pub(crate) fn present_query(&self) -> Option<&Params> {
        self.query.as_ref().filter(|q| !q.is_blank())
    }

    /// The body, or `None` when it is absent or blank.
    pub(crate) fn present_body(&self) -> Option<&Params> {
        self.body.as_ref().filter(|b| !b.is_blank())
    }
}

/// Form-encode pairs as `k1=v1&k2=v2`, sorted by key.
pub fn to_query(pairs: &BTreeMap<String, String>) -> Result<String> {
    serde_urlencoded::to_string(pairs).map_err(|e| Error::invalid(format!("cannot encode parameters: {e}")))
}

/// Parse a form-encoded string back into pairs. Later duplicates win.
pub fn from_query(query: &str) -> Result<BTreeMap<String, String>> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .map(|pairs| pairs.into_iter().collect())
        .map_err(|e| Error::invalid(format!("cannot decode parameters: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_params() {
        assert!(Params::map(Vec::<(String, String)>::new()).is_blank());
        assert!(Params::raw("").is_blank());
        assert!(!Params::raw("a=1").is_blank());
        assert!(!Params::map([("a", "1")]).is_blank());
    }

    #[test]
    fn blank_options_are_not_present() {
        let options = RequestOptions::new().query("").body(BTreeMap::<String, String>::new());
        assert!(options.present_query().is_none());
        assert!(options.present_body().is_none());
        assert!(RequestOptions::new().present_query().is_none());
    }

    #[test]
    fn header_builder_accumulates() {
        let options = RequestOptions::new().header("Accept", "text/xml").header("X-Trace", "1");
        let headers = options.headers.unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Accept"], "text/xml");
    }

    #[test]
    fn encodes_sorted_and_escaped() {
        let pairs = BTreeMap::from([
            ("q".to_string(), "cats & dogs".to_string()),
            ("limit".to_string(), "10".to_string()),
        ]);
        assert_eq!(to_query(&pairs).unwrap(), "limit=10&q=cats+%26+dogs");
    }

    #[test]
    fn decodes_query_string() {
        let pairs = from_query("a=1&b=two+words&c=%2F").unwrap();
        assert_eq!(pairs["a"], "1");
        assert_eq!(pairs["b"], "two words");
        assert_eq!(pairs["c"], "/");
    }

    #[test]
    fn empty_map_encodes_to_empty_string() {
        assert_eq!(to_query(&BTreeMap::new()).unwrap(), "");
    }
}
