//! Error types for the API caller.
//!
//! # Design
//! Only configuration and parsing problems are errors. A failed transfer
//! (refused connection, timeout, DNS) is recorded on the call as status
//! code `0` and never shows up here, so callers must check the status.

use thiserror::Error;

use crate::parser::ParseError;

/// Errors returned by `ApiCall::execute`, the registry and config loading.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An option key matched neither `CURLOPT_<KEY>` nor `<KEY>`.
    #[error("invalid option '{key}' in engine configuration; use options without prefix 'CURLOPT_'")]
    InvalidOption { key: String },

    /// A known option carried a value the engine cannot use.
    #[error("invalid value for {option}: {reason}")]
    InvalidOptionValue { option: &'static str, reason: String },

    /// The response parser rejected the body.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The registry has no configuration under this name.
    #[error("wrong API: {0}")]
    UnknownApi(String),

    /// The configuration document is malformed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The request payload could not be encoded.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}
