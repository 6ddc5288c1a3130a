use axum::{
    extract::{Path, RawQuery},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw of the request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", get(status))
        .route("/redirect", get(redirect))
        .route("/xmlrpc", post(xmlrpc))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: String) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        query,
        content_type: header_text(&headers, header::CONTENT_TYPE),
        authorization: header_text(&headers, header::AUTHORIZATION),
        body,
    })
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

async fn redirect() -> Redirect {
    Redirect::to("/echo?redirected=1")
}

/// Answers every call with a struct naming the called method, or a fault
/// when the document has no method name.
async fn xmlrpc(body: String) -> Response {
    let method = body
        .split_once("<methodName>")
        .and_then(|(_, rest)| rest.split_once("</methodName>"))
        .map(|(name, _)| name.to_string());

    let payload = match method {
        Some(name) => format!(
            "<?xml version=\"1.0\"?><methodResponse><params><param><value><struct>\
             <member><name>method</name><value><string>{name}</string></value></member>\
             <member><name>bytes</name><value><int>{}</int></value></member>\
             </struct></value></param></params></methodResponse>",
            body.len()
        ),
        None => "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>\
                 <member><name>faultCode</name><value><int>-32600</int></value></member>\
                 <member><name>faultString</name><value><string>no method name</string></value></member>\
                 </struct></value></fault></methodResponse>"
            .to_string(),
    };
    ([(header::CONTENT_TYPE, "text/xml")], payload).into_response()
}
