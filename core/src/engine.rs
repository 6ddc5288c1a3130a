//! The transfer engine seam.
//!
//! # Design
//! `ApiCall` never opens sockets itself. It resolves options, hands them
//! to a [`TransferEngine`] in one batch, asks for one blocking transfer and
//! reads the outcome back from [`TransferInfo`]. The engine owns all I/O;
//! tests substitute a scripted engine.

use crate::error::ApiError;
use crate::options::EngineOptions;
use crate::status::CONNECTION_FAILED;

/// Metadata about the last transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInfo {
    /// Status code of the final response, `0` when no response arrived.
    pub http_code: u16,
    /// Request head as sent, when `CURLINFO_HEADER_OUT` was on.
    pub header_out: Option<String>,
}

impl Default for TransferInfo {
    fn default() -> Self {
        Self {
            http_code: CONNECTION_FAILED,
            header_out: None,
        }
    }
}

/// Performs one blocking network transfer.
pub trait TransferEngine {
    /// Replace the engine's options. Fails on values the engine cannot
    /// use; nothing touches the network here.
    fn configure(&mut self, options: &EngineOptions) -> Result<(), ApiError>;

    /// Run the transfer and return the raw payload. Transport failures are
    /// not errors: they leave `info().http_code` at `0` and return whatever
    /// was received, usually nothing.
    fn perform(&mut self) -> Vec<u8>;

    /// Metadata of the most recent `perform`.
    fn info(&self) -> &TransferInfo;
}

impl<E: TransferEngine + ?Sized> TransferEngine for Box<E> {
    fn configure(&mut self, options: &EngineOptions) -> Result<(), ApiError> {
        (**self).configure(options)
    }

    fn perform(&mut self) -> Vec<u8> {
        (**self).perform()
    }

    fn info(&self) -> &TransferInfo {
        (**self).info()
    }
}
