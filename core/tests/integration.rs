//! End-to-end calls against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then runs real transfers through
//! `UreqEngine`, both directly via `ApiCall::execute` and through the
//! registry's logging callers.

use std::sync::Arc;

use api_caller::{
    ApiCall, ApiCallerConfig, ApiConfig, CallKind, CallerRegistry, JsonParser, MemoryCallLogger,
    OptionSet, ParserKind, XmlRpcParser,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

/// Start the mock server on its own thread and return its base URL.
fn start_server() -> String {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

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

    format!("http://{addr}")
}

fn options(pairs: &[(&str, Value)]) -> OptionSet {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[test]
fn get_json_sends_query_and_parses_body() {
    let base = start_server();
    let mut call = ApiCall::new(CallKind::HttpGetJson, &format!("{base}/echo"), json!({"q": "rust lang"}));

    let echo = call.execute(&OptionSet::new(), Some(&JsonParser)).unwrap();
    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["query"], "q=rust+lang");

    assert_eq!(call.status_code(), Some(200));
    assert_eq!(call.status(), "200 OK");
    let headers = call.response_headers().unwrap();
    assert!(headers.starts_with("HTTP/1.1 200 OK\r\n"), "{headers}");
    assert!(headers.contains("content-type: application/json"), "{headers}");

    let sent = call.request_headers().unwrap();
    assert!(sent.starts_with("GET /echo?q=rust+lang HTTP/1.1\r\n"), "{sent}");
    assert!(sent.contains("Accept: application/json\r\n"), "{sent}");
}

#[test]
fn without_parser_the_body_is_returned_as_text() {
    let base = start_server();
    let mut call = ApiCall::new(CallKind::HttpGet, &format!("{base}/status/200"), Value::Null);

    let object = call.execute(&OptionSet::new(), None).unwrap();
    assert_eq!(object, json!("status 200"));
    assert_eq!(call.response_data(), Some("status 200"));
}

#[test]
fn post_json_sends_json_body() {
    let base = start_server();
    let payload = json!({"title": "Buy milk", "done": false});
    let mut call = ApiCall::new(CallKind::HttpPostJson, &format!("{base}/echo"), payload.clone());

    let echo = call.execute(&OptionSet::new(), Some(&JsonParser)).unwrap();
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["content_type"], "application/json");
    let sent: Value = serde_json::from_str(echo["body"].as_str().unwrap()).unwrap();
    assert_eq!(sent, payload);
}

#[test]
fn post_form_sends_encoded_request_data() {
    let base = start_server();
    let mut call = ApiCall::new(CallKind::HttpPost, &format!("{base}/echo"), json!({"a": 1, "b": "x y"}));

    let echo = call.execute(&OptionSet::new(), Some(&JsonParser)).unwrap();
    assert_eq!(echo["content_type"], "application/x-www-form-urlencoded");
    assert_eq!(echo["body"], "a=1&b=x+y");
    assert_eq!(echo["body"], call.request_data().as_str());
}

#[test]
fn put_and_delete_use_their_methods() {
    let base = start_server();

    let mut put = ApiCall::new(CallKind::HttpPutJson, &format!("{base}/echo"), json!({"id": 3}));
    let echo = put.execute(&OptionSet::new(), Some(&JsonParser)).unwrap();
    assert_eq!(echo["method"], "PUT");
    assert_eq!(echo["body"], r#"{"id":3}"#);

    let mut delete = ApiCall::new(CallKind::HttpDelete, &format!("{base}/echo"), json!({"id": 3}));
    let echo = delete.execute(&OptionSet::new(), Some(&JsonParser)).unwrap();
    assert_eq!(echo["method"], "DELETE");
    assert_eq!(echo["query"], "id=3");
}

#[test]
fn error_statuses_are_data() {
    let base = start_server();

    let mut missing = ApiCall::new(CallKind::HttpGet, &format!("{base}/status/404"), Value::Null);
    missing.execute(&OptionSet::new(), None).unwrap();
    assert_eq!(missing.status(), "404 Not Found");
    assert_eq!(missing.response_data(), Some("status 404"));

    let mut odd = ApiCall::new(CallKind::HttpGet, &format!("{base}/status/599"), Value::Null);
    odd.execute(&OptionSet::new(), None).unwrap();
    assert_eq!(odd.status_code(), Some(599));
    assert_eq!(odd.status(), "599");
}

#[test]
fn redirects_are_followed_only_on_request() {
    let base = start_server();
    let url = format!("{base}/redirect");

    let mut plain = ApiCall::new(CallKind::HttpGet, &url, Value::Null);
    plain.execute(&OptionSet::new(), None).unwrap();
    assert_eq!(plain.status(), "303 See Other");

    let mut followed = ApiCall::new(CallKind::HttpGet, &url, Value::Null);
    let echo = followed
        .execute(&options(&[("followlocation", json!(true))]), Some(&JsonParser))
        .unwrap();
    assert_eq!(followed.status(), "200 OK");
    assert_eq!(echo["query"], "redirected=1");
}

#[test]
fn userpwd_becomes_basic_auth() {
    let base = start_server();
    let mut call = ApiCall::new(CallKind::HttpGet, &format!("{base}/echo"), Value::Null);

    let echo = call
        .execute(&options(&[("userpwd", json!("user:pass"))]), Some(&JsonParser))
        .unwrap();
    assert_eq!(echo["authorization"], "Basic dXNlcjpwYXNz");
}

#[test]
fn xmlrpc_round_trip() {
    let base = start_server();
    let mut call = ApiCall::new(CallKind::XmlRpc, &format!("{base}/xmlrpc"), json!([1, "two"]))
        .with_method("demo.ping");

    let result = call.execute(&OptionSet::new(), Some(&XmlRpcParser)).unwrap();
    assert_eq!(result["method"], "demo.ping");
    assert!(result["bytes"].as_u64().unwrap() > 0);
    assert_eq!(call.name(), "XmlRpc");
}

#[test]
fn refused_connection_is_status_zero() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut call = ApiCall::new(CallKind::HttpGet, &format!("http://{addr}/echo"), Value::Null);
    let object = call.execute(&options(&[("connecttimeout", json!(2))]), None).unwrap();
    assert_eq!(object, json!(""));
    assert_eq!(call.status_code(), Some(0));
    assert_eq!(call.status(), "0 Connection failed");
    assert_eq!(call.response_headers(), Some(""));
    assert_eq!(call.response_data(), Some(""));
}

#[test]
fn unknown_option_fails_before_any_request() {
    let base = start_server();
    let mut call = ApiCall::new(CallKind::HttpGet, &format!("{base}/echo"), Value::Null);

    let err = call.execute(&options(&[("bogus", json!(true))]), None).unwrap_err();
    assert!(err.to_string().contains("'bogus'"));
    assert!(call.status_code().is_none());
    assert!(call.response_data().is_none());
}

#[test]
fn registry_callers_apply_config_and_log() {
    let base = start_server();
    let config = ApiCallerConfig::default()
        .with_api(
            "echo",
            ApiConfig {
                engine: options(&[("timeout", json!(10))]),
                parser: Some(ParserKind::Json),
            },
        )
        .with_api(
            "rpc",
            ApiConfig {
                engine: OptionSet::new(),
                parser: Some(ParserKind::XmlRpc),
            },
        );
    let logger = Arc::new(MemoryCallLogger::new());
    let mut registry = CallerRegistry::new(config, logger.clone());

    let mut call = ApiCall::new(CallKind::HttpGetJson, &format!("{base}/echo"), json!({"n": 1}));
    let echo = registry.api("echo").unwrap().call(&mut call).unwrap();
    assert_eq!(echo["query"], "n=1");

    let mut rpc = ApiCall::new(CallKind::XmlRpc, &format!("{base}/xmlrpc"), Value::Null).with_method("a.b");
    let result = registry.api("rpc").unwrap().call(&mut rpc).unwrap();
    assert_eq!(result["method"], "a.b");

    let logged = logger.calls();
    assert_eq!(logged.len(), 2);
    assert_eq!(logged[0].api, "echo");
    assert_eq!(logged[0].status, "200 OK");
    assert_eq!(logged[0].request_representation, "n: 1\n");
    assert!(logged[0].response_representation.contains("method: GET"));
    assert_eq!(logged[1].api, "rpc");
    assert_eq!(logged[1].name, "XmlRpc");
    assert!(logged[1].request_headers.as_deref().unwrap().starts_with("POST /xmlrpc HTTP/1.1"));
}

#[test]
fn independent_calls_keep_their_own_state() {
    let base = start_server();
    let mut first = ApiCall::new(CallKind::HttpGet, &format!("{base}/status/201"), Value::Null);
    let mut second = ApiCall::new(CallKind::HttpGet, &format!("{base}/status/404"), Value::Null);

    first.execute(&OptionSet::new(), None).unwrap();
    second.execute(&OptionSet::new(), None).unwrap();

    assert_eq!(first.status(), "201 Created");
    assert_eq!(first.response_data(), Some("status 201"));
    assert_eq!(second.status(), "404 Not Found");
    assert_eq!(second.response_data(), Some("status 404"));
}
