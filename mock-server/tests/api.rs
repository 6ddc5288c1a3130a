use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, content_type: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, content_type)
        .body(body.to_string())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_get_reports_query() {
    let resp = app()
        .oneshot(Request::builder().uri("/echo?a=1&b=two").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.as_deref(), Some("a=1&b=two"));
    assert!(echo.body.is_empty());
}

#[tokio::test]
async fn echo_post_reports_body_and_content_type() {
    let resp = app()
        .oneshot(request("POST", "/echo", "application/json", r#"{"a":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, r#"{"a":1}"#);
    assert!(echo.query.is_none());
}

#[tokio::test]
async fn echo_accepts_any_method() {
    for method in ["PUT", "DELETE", "PATCH"] {
        let resp = app()
            .oneshot(request(method, "/echo", "text/plain", ""))
            .await
            .unwrap();
        let echo: Echo = body_json(resp).await;
        assert_eq!(echo.method, method);
    }
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code() {
    let resp = app()
        .oneshot(Request::builder().uri("/status/418").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(&body_bytes(resp).await[..], b"status 418");
}

#[tokio::test]
async fn status_rejects_invalid_code() {
    let resp = app()
        .oneshot(Request::builder().uri("/status/42").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- redirect ---

#[tokio::test]
async fn redirect_points_at_echo() {
    let resp = app()
        .oneshot(Request::builder().uri("/redirect").body(String::new()).unwrap())
        .await
        .unwrap();

    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()[http::header::LOCATION], "/echo?redirected=1");
}

// --- xmlrpc ---

#[tokio::test]
async fn xmlrpc_names_the_called_method() {
    let call = "<?xml version=\"1.0\"?><methodCall><methodName>demo.ping</methodName><params/></methodCall>";
    let resp = app()
        .oneshot(request("POST", "/xmlrpc", "text/xml", call))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "text/xml");
    let body = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(body.contains("<string>demo.ping</string>"));
    assert!(!body.contains("<fault>"));
}

#[tokio::test]
async fn xmlrpc_without_method_is_a_fault() {
    let resp = app()
        .oneshot(request("POST", "/xmlrpc", "text/xml", "<methodCall/>"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(body.contains("<fault>"));
    assert!(body.contains("-32600"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let resp = app()
        .oneshot(Request::builder().uri("/nope").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
