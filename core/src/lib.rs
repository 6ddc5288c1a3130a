//! Synchronous HTTP API caller.
//!
//! # Overview
//! An [`ApiCall`] sends one request through a pluggable [`TransferEngine`],
//! splits the raw payload the engine returns into headers and body, records
//! the status and optionally parses the body into a structured object.
//! A [`CallerRegistry`] hands out one [`LoggingApiCaller`] per configured API,
//! which applies that API's options and parser and logs every call.
//!
//! # Design
//! - Options use curl-style names (`returntransfer`, `timeout`,
//!   `followlocation`) and are resolved against a fixed table before any
//!   network activity; an unknown name fails the call.
//! - A failed transfer is data, not an error: the call's status is
//!   `0 Connection failed`.
//! - [`UreqEngine`] is the default engine. Tests and embedders can supply
//!   their own.
//! - Everything is blocking and single-threaded; one call, one transfer.

pub mod call;
pub mod caller;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod logger;
pub mod options;
pub mod parser;
pub mod query;
pub mod registry;
pub mod representation;
pub mod status;
pub mod ureq_engine;
pub mod xmlrpc;

pub use call::{ApiCall, CallDetails, CallKind};
pub use caller::LoggingApiCaller;
pub use config::{ApiCallerConfig, ApiConfig};
pub use engine::{TransferEngine, TransferInfo};
pub use error::ApiError;
pub use http::{split_response, HttpMethod, ResponseParts};
pub use logger::{ApiCallLogger, LoggedCall, MemoryCallLogger, TracingCallLogger};
pub use options::{EngineOption, EngineOptions, OptionSet};
pub use parser::{IdentityParser, JsonParser, ParseError, ParserKind, ResponseParser};
pub use registry::{CallerRegistry, DEFAULT_API};
pub use status::status_line;
pub use ureq_engine::UreqEngine;
pub use xmlrpc::XmlRpcParser;
