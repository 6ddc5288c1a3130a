//! One API call: request identity and payload in, response state out.
//!
//! # Design
//! An `ApiCall` is built per logical request and executed once. `execute`
//! runs the whole pipeline in order: merge and translate options, add the
//! options the call kind sets itself (URL, method, body), configure the
//! engine, transfer, split the payload, read status and request head from
//! the engine, then parse the body.
//!
//! Option problems fail before the engine sees anything. A failed transfer
//! is not an error; it shows up as status `0`. Parser errors pass through
//! unchanged.

use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::TransferEngine;
use crate::error::ApiError;
use crate::http::{split_response, HttpMethod};
use crate::options::{merge_options, translate_options, EngineOption, EngineOptions, OptionSet};
use crate::parser::ResponseParser;
use crate::query::{append_query, build_query};
use crate::representation::dump;
use crate::status::{status_line, CONNECTION_FAILED};
use crate::ureq_engine::UreqEngine;
use crate::xmlrpc::encode_method_call;

/// How a call sends its request object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// GET with the request object as query string.
    HttpGet,
    /// GET with the request object as query string, asking for JSON.
    HttpGetJson,
    /// POST with a form-encoded body.
    HttpPost,
    /// POST with a JSON body.
    HttpPostJson,
    /// PUT with a form-encoded body.
    HttpPut,
    /// PUT with a JSON body.
    HttpPutJson,
    /// DELETE with the request object as query string.
    HttpDelete,
    /// POST of an XML-RPC `methodCall` for the call's method name.
    XmlRpc,
}

impl CallKind {
    pub fn name(self) -> &'static str {
        match self {
            CallKind::HttpGet => "HttpGet",
            CallKind::HttpGetJson => "HttpGetJson",
            CallKind::HttpPost => "HttpPost",
            CallKind::HttpPostJson => "HttpPostJson",
            CallKind::HttpPut => "HttpPut",
            CallKind::HttpPutJson => "HttpPutJson",
            CallKind::HttpDelete => "HttpDelete",
            CallKind::XmlRpc => "XmlRpc",
        }
    }

    pub fn http_method(self) -> HttpMethod {
        match self {
            CallKind::HttpGet | CallKind::HttpGetJson => HttpMethod::Get,
            CallKind::HttpPost | CallKind::HttpPostJson | CallKind::XmlRpc => HttpMethod::Post,
            CallKind::HttpPut | CallKind::HttpPutJson => HttpMethod::Put,
            CallKind::HttpDelete => HttpMethod::Delete,
        }
    }
}

/// Read-only view of a call, used by loggers.
pub trait CallDetails {
    fn name(&self) -> &str;
    fn url(&self) -> &str;
    fn status_code(&self) -> Option<u16>;
    fn status(&self) -> String;
    fn request_headers(&self) -> Option<&str>;
    fn response_headers(&self) -> Option<&str>;
    fn request_object_representation(&self) -> String;
    fn response_object_representation(&self) -> String;
}

/// A single API request and, after `execute`, its response.
#[derive(Debug)]
pub struct ApiCall<E = UreqEngine> {
    kind: CallKind,
    url: String,
    method: String,
    request_object: Value,
    request_headers: Option<String>,
    response_raw: Option<Vec<u8>>,
    response_data: Option<String>,
    response_object: Option<Value>,
    response_headers: Option<String>,
    status: Option<u16>,
    engine: E,
    engine_options: Option<EngineOptions>,
}

impl ApiCall<UreqEngine> {
    /// A call that transfers through a fresh [`UreqEngine`].
    pub fn new(kind: CallKind, url: &str, request_object: Value) -> Self {
        Self::with_engine(kind, url, request_object, UreqEngine::new())
    }
}

impl<E: TransferEngine> ApiCall<E> {
    pub fn with_engine(kind: CallKind, url: &str, request_object: Value, engine: E) -> Self {
        Self {
            kind,
            url: url.to_string(),
            method: String::new(),
            request_object,
            request_headers: None,
            response_raw: None,
            response_data: None,
            response_object: None,
            response_headers: None,
            status: None,
            engine,
            engine_options: None,
        }
    }

    /// Set the remote method name (the XML-RPC `methodName`).
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    /// Run the call and return the response object.
    ///
    /// `options` override the defaults (`returntransfer`, `header`,
    /// `curlinfo_header_out`). Without a parser the response object is the
    /// body string.
    pub fn execute(
        &mut self,
        options: &OptionSet,
        parser: Option<&dyn ResponseParser>,
    ) -> Result<Value, ApiError> {
        let merged = merge_options(options);
        let mut resolved = translate_options(&merged)?;
        self.apply_request_options(&mut resolved)?;
        debug!(call = self.kind.name(), url = %self.url, options = resolved.len(), "configuring engine");
        self.engine.configure(&resolved)?;
        self.engine_options = Some(resolved);

        let raw = self.engine.perform();
        let parts = split_response(&raw);
        self.response_raw = Some(raw);
        self.response_headers = Some(parts.headers);
        self.response_data = Some(parts.body);

        let info = self.engine.info();
        self.status = Some(info.http_code);
        self.request_headers = info.header_out.clone();
        if info.http_code == CONNECTION_FAILED {
            warn!(call = self.kind.name(), url = %self.url, "no response received");
        }

        self.response_object = None;
        let body = self.response_data.as_deref().unwrap_or_default();
        let object = match parser {
            Some(parser) => parser.parse(body)?,
            None => Value::String(body.to_string()),
        };
        self.response_object = Some(object.clone());
        Ok(object)
    }

    /// Options this call's kind sets itself. URL, method and body replace
    /// caller values; headers are appended to the caller's list.
    fn apply_request_options(&self, options: &mut EngineOptions) -> Result<(), ApiError> {
        let form = self.request_data();
        match self.kind {
            CallKind::HttpGet | CallKind::HttpGetJson => {
                options.set(EngineOption::Url, Value::String(append_query(&self.url, &form)));
                options.set(EngineOption::HttpGet, Value::Bool(true));
                if self.kind == CallKind::HttpGetJson {
                    options.append_headers(["Accept: application/json".to_string()])?;
                }
            }
            CallKind::HttpDelete => {
                options.set(EngineOption::Url, Value::String(append_query(&self.url, &form)));
                options.set(EngineOption::CustomRequest, Value::String("DELETE".to_string()));
            }
            CallKind::HttpPost | CallKind::HttpPut => {
                options.set(EngineOption::Url, Value::String(self.url.clone()));
                options.set(EngineOption::PostFields, Value::String(form));
                if self.kind == CallKind::HttpPut {
                    options.set(EngineOption::CustomRequest, Value::String("PUT".to_string()));
                } else {
                    options.set(EngineOption::Post, Value::Bool(true));
                }
            }
            CallKind::HttpPostJson | CallKind::HttpPutJson => {
                let body = serde_json::to_string(&self.request_object)
                    .map_err(|e| ApiError::SerializationError(e.to_string()))?;
                options.set(EngineOption::Url, Value::String(self.url.clone()));
                options.set(EngineOption::PostFields, Value::String(body));
                if self.kind == CallKind::HttpPutJson {
                    options.set(EngineOption::CustomRequest, Value::String("PUT".to_string()));
                } else {
                    options.set(EngineOption::Post, Value::Bool(true));
                }
                options.append_headers(["Content-Type: application/json".to_string()])?;
            }
            CallKind::XmlRpc => {
                let body = encode_method_call(&self.method, &self.request_object);
                options.set(EngineOption::Url, Value::String(self.url.clone()));
                options.set(EngineOption::Post, Value::Bool(true));
                options.set(EngineOption::PostFields, Value::String(body));
                options.append_headers(["Content-Type: text/xml".to_string()])?;
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The call kind's name, e.g. `HttpPostJson`.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request object as a query/form string.
    pub fn request_data(&self) -> String {
        build_query(&self.request_object)
    }

    pub fn request_object(&self) -> &Value {
        &self.request_object
    }

    /// The request head the engine sent, if it recorded one.
    pub fn request_headers(&self) -> Option<&str> {
        self.request_headers.as_deref()
    }

    pub fn response_raw(&self) -> Option<&[u8]> {
        self.response_raw.as_deref()
    }

    /// The response body text.
    pub fn response_data(&self) -> Option<&str> {
        self.response_data.as_deref()
    }

    pub fn response_object(&self) -> Option<&Value> {
        self.response_object.as_ref()
    }

    pub fn response_headers(&self) -> Option<&str> {
        self.response_headers.as_deref()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status
    }

    /// `"200 OK"` style status, the bare code when unknown, empty before
    /// `execute`.
    pub fn status(&self) -> String {
        self.status.map(status_line).unwrap_or_default()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Options applied to the engine by the last `execute`.
    pub fn engine_options(&self) -> Option<&EngineOptions> {
        self.engine_options.as_ref()
    }

    pub fn request_object_representation(&self) -> String {
        dump(&self.request_object)
    }

    pub fn response_object_representation(&self) -> String {
        dump(self.response_object.as_ref().unwrap_or(&Value::Null))
    }
}

impl<E: TransferEngine> CallDetails for ApiCall<E> {
    fn name(&self) -> &str {
        ApiCall::name(self)
    }

    fn url(&self) -> &str {
        ApiCall::url(self)
    }

    fn status_code(&self) -> Option<u16> {
        ApiCall::status_code(self)
    }

    fn status(&self) -> String {
        ApiCall::status(self)
    }

    fn request_headers(&self) -> Option<&str> {
        ApiCall::request_headers(self)
    }

    fn response_headers(&self) -> Option<&str> {
        ApiCall::response_headers(self)
    }

    fn request_object_representation(&self) -> String {
        ApiCall::request_object_representation(self)
    }

    fn response_object_representation(&self) -> String {
        ApiCall::response_object_representation(self)
    }
}
