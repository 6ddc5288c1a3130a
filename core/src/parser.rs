//! Pluggable response body parsers.
//!
//! # Design
//! A parser turns the response body into a structured [`Value`]. It is
//! handed to `ApiCall::execute` per call; without one the body is returned
//! as a plain string. Parsers own their failures: `execute` passes a
//! [`ParseError`] through untouched.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::xmlrpc::XmlRpcParser;

/// A body could not be decoded by a parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{format} parse error: {message}")]
pub struct ParseError {
    pub format: &'static str,
    pub message: String,
}

impl ParseError {
    pub fn new(format: &'static str, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
        }
    }
}

/// Turns a response body into a structured object.
pub trait ResponseParser: Send + Sync {
    fn parse(&self, body: &str) -> Result<Value, ParseError>;
}

impl<F> ResponseParser for F
where
    F: Fn(&str) -> Result<Value, ParseError> + Send + Sync,
{
    fn parse(&self, body: &str) -> Result<Value, ParseError> {
        self(body)
    }
}

/// Decodes the body as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ResponseParser for JsonParser {
    fn parse(&self, body: &str) -> Result<Value, ParseError> {
        serde_json::from_str(body).map_err(|e| ParseError::new("json", e.to_string()))
    }
}

/// Returns the body as a string value.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityParser;

impl ResponseParser for IdentityParser {
    fn parse(&self, body: &str) -> Result<Value, ParseError> {
        Ok(Value::String(body.to_string()))
    }
}

/// Parser names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    Json,
    XmlRpc,
    Identity,
}

impl ParserKind {
    pub fn build(self) -> Arc<dyn ResponseParser> {
        match self {
            ParserKind::Json => Arc::new(JsonParser),
            ParserKind::XmlRpc => Arc::new(XmlRpcParser),
            ParserKind::Identity => Arc::new(IdentityParser),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParserKind::Json => "json",
            ParserKind::XmlRpc => "xmlrpc",
            ParserKind::Identity => "identity",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ParserKind::Json),
            "xmlrpc" => Ok(ParserKind::XmlRpc),
            "identity" => Ok(ParserKind::Identity),
            other => Err(format!("unknown parser: {other}")),
        }
    }
}
