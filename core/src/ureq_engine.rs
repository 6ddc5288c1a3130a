//! Default transfer engine on top of blocking `ureq`.
//!
//! # Design
//! `configure` turns the resolved options into a [`PreparedTransfer`] and
//! rejects malformed values up front. `perform` builds a fresh agent for
//! the transfer, disables ureq's status-as-error behaviour so 4xx/5xx come
//! back as data, and reassembles the response into the inline
//! `status line + headers + blank line + body` payload that
//! `split_response` expects.
//!
//! Redirects are not followed unless `followlocation` is set. Since ureq
//! follows them internally, intermediate header blocks never appear in the
//! payload.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::engine::{TransferEngine, TransferInfo};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::options::{EngineOption, EngineOptions};
use crate::query::build_query;

/// Redirect limit when `followlocation` is on and `maxredirs` is unset.
const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// A transfer ready to run, derived from engine options.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTransfer {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub max_redirects: u32,
    pub return_transfer: bool,
    pub include_headers: bool,
    pub record_header_out: bool,
}

impl PreparedTransfer {
    /// Derive a transfer from resolved options.
    pub fn from_options(options: &EngineOptions) -> Result<Self, ApiError> {
        let url = options
            .text(EngineOption::Url)?
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::InvalidOptionValue {
                option: EngineOption::Url.name(),
                reason: "no URL set".to_string(),
            })?;

        let method = match options.text(EngineOption::CustomRequest)? {
            Some(custom) if !custom.is_empty() => HttpMethod::parse(&custom),
            _ if options.flag(EngineOption::NoBody) => HttpMethod::Head,
            _ if options.flag(EngineOption::HttpGet) => HttpMethod::Get,
            _ if options.flag(EngineOption::Post) => HttpMethod::Post,
            // Setting post fields alone implies a POST.
            _ if options.contains(EngineOption::PostFields) => HttpMethod::Post,
            _ => HttpMethod::Get,
        };

        let body = match options.get(EngineOption::PostFields) {
            _ if !method.has_body() => None,
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone().into_bytes()),
            Some(fields @ (Value::Object(_) | Value::Array(_))) => Some(build_query(fields).into_bytes()),
            Some(other) => Some(other.to_string().into_bytes()),
        };

        let mut headers = Vec::new();
        for line in options.list(EngineOption::HttpHeader)? {
            let (name, value) = line.split_once(':').ok_or_else(|| ApiError::InvalidOptionValue {
                option: EngineOption::HttpHeader.name(),
                reason: format!("header line without ':': {line:?}"),
            })?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
        if let Some(agent) = options.text(EngineOption::UserAgent)? {
            headers.push(("User-Agent".to_string(), agent));
        }
        if let Some(referer) = options.text(EngineOption::Referer)? {
            headers.push(("Referer".to_string(), referer));
        }
        if let Some(cookie) = options.text(EngineOption::Cookie)? {
            headers.push(("Cookie".to_string(), cookie));
        }
        if let Some(credentials) = options.text(EngineOption::UserPwd)? {
            headers.push((
                "Authorization".to_string(),
                format!("Basic {}", STANDARD.encode(credentials)),
            ));
        }
        if body.is_some() && !has_header(&headers, "content-type") {
            headers.push((
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ));
        }

        let max_redirects = if options.flag(EngineOption::FollowLocation) {
            match options.number(EngineOption::MaxRedirs)? {
                Some(max) => u32::try_from(max).unwrap_or(u32::MAX),
                None => DEFAULT_MAX_REDIRECTS,
            }
        } else {
            0
        };

        Ok(Self {
            method,
            url,
            headers,
            body,
            timeout: options.duration(EngineOption::Timeout, EngineOption::TimeoutMs)?,
            connect_timeout: options
                .duration(EngineOption::ConnectTimeout, EngineOption::ConnectTimeoutMs)?,
            max_redirects,
            return_transfer: options.flag(EngineOption::ReturnTransfer),
            include_headers: options.flag(EngineOption::Header),
            record_header_out: options.flag(EngineOption::HeaderOut),
        })
    }

    /// The request head as it goes on the wire: request line, `Host` and
    /// the explicit headers, ending in a blank line.
    pub fn request_head(&self) -> Option<String> {
        let url = Url::parse(&self.url).ok()?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return None,
        };
        let target = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };

        let mut head = format!("{} {target} HTTP/1.1\r\nHost: {host}\r\n", self.method);
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        if let Some(body) = &self.body {
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        head.push_str("\r\n");
        Some(head)
    }
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
}

/// Blocking engine backed by `ureq`.
#[derive(Debug, Default)]
pub struct UreqEngine {
    prepared: Option<PreparedTransfer>,
    info: TransferInfo,
}

impl UreqEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The transfer derived by the last successful `configure`.
    pub fn prepared(&self) -> Option<&PreparedTransfer> {
        self.prepared.as_ref()
    }

    fn transfer(prepared: &PreparedTransfer) -> Result<(u16, Vec<u8>), ureq::Error> {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(prepared.max_redirects)
            .timeout_global(prepared.timeout)
            .timeout_connect(prepared.connect_timeout)
            .build()
            .new_agent();

        let mut request = ureq::http::Request::builder()
            .method(prepared.method.as_str())
            .uri(prepared.url.as_str());
        for (name, value) in &prepared.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let mut response = match &prepared.body {
            Some(body) => agent.run(request.body(body.clone())?)?,
            None => agent.run(request.body(())?)?,
        };

        let status = response.status();
        let mut raw = Vec::new();
        if prepared.include_headers {
            let status_line = format!(
                "{:?} {} {}\r\n",
                response.version(),
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
            raw.extend_from_slice(status_line.as_bytes());
            for (name, value) in response.headers() {
                raw.extend_from_slice(name.as_str().as_bytes());
                raw.extend_from_slice(b": ");
                raw.extend_from_slice(value.as_bytes());
                raw.extend_from_slice(b"\r\n");
            }
            raw.extend_from_slice(b"\r\n");
        }
        if prepared.method != HttpMethod::Head {
            raw.extend(response.body_mut().read_to_vec()?);
        }

        Ok((status.as_u16(), raw))
    }
}

impl TransferEngine for UreqEngine {
    fn configure(&mut self, options: &EngineOptions) -> Result<(), ApiError> {
        self.prepared = Some(PreparedTransfer::from_options(options)?);
        Ok(())
    }

    fn perform(&mut self) -> Vec<u8> {
        self.info = TransferInfo::default();
        let Some(prepared) = &self.prepared else {
            warn!("transfer performed before configure");
            return Vec::new();
        };

        debug!(method = %prepared.method, url = %prepared.url, "starting transfer");
        match Self::transfer(prepared) {
            Ok((status, raw)) => {
                debug!(status, bytes = raw.len(), "transfer finished");
                self.info.http_code = status;
                if prepared.record_header_out {
                    self.info.header_out = prepared.request_head();
                }
                if prepared.return_transfer {
                    raw
                } else {
                    Vec::new()
                }
            }
            Err(e) => {
                warn!(url = %prepared.url, error = %e, "transfer failed");
                Vec::new()
            }
        }
    }

    fn info(&self) -> &TransferInfo {
        &self.info
    }
}
