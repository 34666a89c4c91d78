//! End-to-end calls against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the client through
//! the real `ureq` transport. Checks that what the client assembles is what
//! the server actually receives, and that fixtures decode per format.

use std::net::SocketAddr;

use mock_server::Echo;
use rest_kit::{Client, ClientConfig, Error, Format, Params, Parsed, RequestOptions};
use serde_json::json;

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// Client pointed at the server, decoding JSON so `/echo` can be read back.
fn echo_client(addr: SocketAddr) -> Client {
    let mut client = Client::new(ClientConfig::new());
    client.set_base_uri(&addr.to_string());
    client.set_format("json").unwrap();
    client
}

fn echo(parsed: Parsed) -> Echo {
    serde_json::from_value(parsed.into_value().expect("structured echo")).unwrap()
}

#[test]
fn json_fixture_decodes_by_extension() {
    let addr = start_server();
    let mut client: Client = Client::default();
    client.set_base_uri(&format!("{addr}/"));
    assert_eq!(client.base_uri(), Some(format!("http://{addr}").as_str()));

    let parsed = client.get("/users.json", &RequestOptions::new()).unwrap();
    assert_eq!(parsed, Parsed::Structured(json!({"id": 1, "name": "Alice", "admin": false})));
    assert_eq!(client.format(), Some(Format::Json));
}

#[test]
fn xml_fixture_decodes_by_extension() {
    let addr = start_server();
    let mut client: Client = Client::default();
    client.set_base_uri(&addr.to_string());

    let parsed = client.get("users.xml", &RequestOptions::new()).unwrap();
    assert_eq!(
        parsed,
        Parsed::Structured(json!({"user": {"id": 1, "name": "Alice", "admin": false}}))
    );
}

#[test]
fn unresolved_format_returns_raw_body() {
    let addr = start_server();
    let mut client: Client = Client::default();
    client.set_base_uri(&addr.to_string());

    let parsed = client.get("/plain.txt", &RequestOptions::new()).unwrap();
    assert_eq!(parsed, Parsed::Raw(mock_server::PLAIN_TEXT.to_string()));
}

#[test]
fn query_defaults_and_call_params_reach_server() {
    let addr = start_server();
    let mut client = echo_client(addr);
    client.merge_default_params([("limit", "10"), ("q", "dogs")]);

    let options = RequestOptions::new().query(Params::map([("q", "cats")]));
    let seen = echo(client.get("/echo/search", &options).unwrap());
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/echo/search");
    assert_eq!(seen.query.as_deref(), Some("limit=10&q=cats"));
}

#[test]
fn form_body_gets_default_content_type() {
    let addr = start_server();
    let client = echo_client(addr);

    let options = RequestOptions::new().body(Params::map([("name", "Jane Doe")]));
    let seen = echo(client.post("/echo/people", &options).unwrap());
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.body, "name=Jane+Doe");
    assert_eq!(seen.headers["content-type"], "application/x-www-form-urlencoded");
}

#[test]
fn explicit_content_type_is_kept() {
    let addr = start_server();
    let mut client = echo_client(addr);
    client.merge_headers([("Content-Type", "application/json")]);

    let options = RequestOptions::new().body(r#"{"name":"Jane"}"#);
    let seen = echo(client.put("/echo/people/1", &options).unwrap());
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.body, r#"{"name":"Jane"}"#);
    assert_eq!(seen.headers["content-type"], "application/json");
}

#[test]
fn headers_and_basic_auth_reach_server() {
    let addr = start_server();
    let mut client = echo_client(addr);
    client.merge_headers([("X-Client", "rest-kit"), ("Authorization", "Bearer nope")]);
    client.set_basic_auth("class", "secret");

    let options = RequestOptions::new().header("X-Call", "1").basic_auth("call", "pw");
    let seen = echo(client.delete("/echo/items/1", &options).unwrap());
    assert_eq!(seen.method, "DELETE");
    assert_eq!(seen.headers["x-client"], "rest-kit");
    assert_eq!(seen.headers["x-call"], "1");
    assert_eq!(seen.headers["authorization"], "Basic Y2FsbDpwdw==");
}

#[test]
fn error_statuses_are_decoded_not_raised() {
    let addr = start_server();
    let client = echo_client(addr);

    let parsed = client.get("/status/404", &RequestOptions::new()).unwrap();
    assert_eq!(parsed, Parsed::Structured(json!({"status": 404})));
}

#[test]
fn connection_is_opened_once() {
    let addr = start_server();
    let client = echo_client(addr);
    assert!(client.connection().is_none());

    client.get("/echo/a", &RequestOptions::new()).unwrap();
    let endpoint = client.connection().unwrap().endpoint().clone();
    assert_eq!(endpoint.port, addr.port());
    assert!(!endpoint.secure);

    client.get("/echo/b", &RequestOptions::new()).unwrap();
    assert_eq!(client.connection().unwrap().endpoint(), &endpoint);
}

#[test]
fn refused_connection_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut client: Client = Client::default();
    client.set_base_uri(&addr.to_string());
    let err = client.get("/users.json", &RequestOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{err:?}");
}

#[test]
fn undecodable_body_is_decode_error() {
    let addr = start_server();
    let mut client: Client = Client::default();
    client.set_base_uri(&addr.to_string());
    client.set_format("xml").unwrap();

    let err = client.get("/users.json", &RequestOptions::new()).unwrap_err();
    match err {
        Error::Decode { format, body, .. } => {
            assert_eq!(format, Format::Xml);
            assert_eq!(body, mock_server::USER_JSON);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn redirect_is_returned_not_followed() {
    let addr = start_server();
    let mut client: Client = Client::default();
    client.set_base_uri(&addr.to_string());

    let parsed = client.get("/redirect", &RequestOptions::new()).unwrap();
    assert_eq!(parsed, Parsed::Raw(mock_server::REDIRECT_BODY.to_string()));

    let parsed = client.post("/redirect", &RequestOptions::new().body("a=1")).unwrap();
    assert_eq!(parsed, Parsed::Raw(mock_server::REDIRECT_BODY.to_string()));
}

#[test]
fn raw_query_and_dot_segments_reach_server_verbatim() {
    let addr = start_server();
    let client = echo_client(addr);

    let options = RequestOptions::new().query("a=x|y&b=1");
    let seen = echo(client.get("/echo/a/../b", &options).unwrap());
    assert_eq!(seen.path, "/echo/a/../b");
    assert_eq!(seen.query.as_deref(), Some("a=x|y&b=1"));
}
