use std::collections::BTreeMap;

use axum::{
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const USER_JSON: &str = r#"{"id":1,"name":"Alice","admin":false}"#;

pub const USER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<user>
  <id type="integer">1</id>
  <name>Alice</name>
  <admin type="boolean">false</admin>
</user>"#;

pub const PLAIN_TEXT: &str = "plain text, not parsed";

pub const REDIRECT_BODY: &str = "redirected";

/// What the server saw for a request to `/echo`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Lower-cased names; repeated headers are joined with `, `.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/users.json", get(user_json))
        .route("/users.xml", get(user_xml))
        .route("/plain.txt", get(plain))
        .route("/status/{code}", any(status))
        .route("/redirect", any(redirect))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        seen.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    tracing::debug!(%method, %uri, "echo");
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: seen,
        body,
    })
}

async fn user_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], USER_JSON)
}

async fn user_xml() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], USER_XML)
}

async fn plain() -> &'static str {
    PLAIN_TEXT
}

/// 302 pointing at `/plain.txt`, with a body of its own.
async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/plain.txt")], REDIRECT_BODY)
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(serde_json::json!({ "status": code }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_roundtrips_through_json() {
        let echo = Echo {
            method: "POST".to_string(),
            path: "/echo".to_string(),
            query: Some("a=1".to_string()),
            headers: BTreeMap::from([("accept".to_string(), "*/*".to_string())]),
            body: "x=1".to_string(),
        };
        let json = serde_json::to_string(&echo).unwrap();
        let back: Echo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, echo);
    }

    #[test]
    fn fixtures_are_well_formed() {
        let user: serde_json::Value = serde_json::from_str(USER_JSON).unwrap();
        assert_eq!(user["id"], 1);
        assert!(USER_XML.contains("<user>"));
    }
}
