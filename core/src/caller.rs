//! Per-API caller that runs calls with the API's options and logs them.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::call::ApiCall;
use crate::engine::TransferEngine;
use crate::error::ApiError;
use crate::logger::ApiCallLogger;
use crate::options::OptionSet;
use crate::parser::ResponseParser;

/// Runs calls for one configured API.
///
/// Every call gets the API's engine options and parser. The logger sees the
/// call before and after `execute`; the returned object is exactly what
/// `execute` produced.
#[derive(Clone)]
pub struct LoggingApiCaller {
    api: String,
    options: OptionSet,
    parser: Option<Arc<dyn ResponseParser>>,
    logger: Arc<dyn ApiCallLogger>,
}

impl LoggingApiCaller {
    pub fn new(
        api: &str,
        options: OptionSet,
        parser: Option<Arc<dyn ResponseParser>>,
        logger: Arc<dyn ApiCallLogger>,
    ) -> Self {
        Self {
            api: api.to_string(),
            options,
            parser,
            logger,
        }
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    /// Execute `call` and return its response object.
    pub fn call<E: TransferEngine>(&self, call: &mut ApiCall<E>) -> Result<Value, ApiError> {
        self.logger.start_call(&self.api, &*call);
        let started = Instant::now();
        let result = call.execute(&self.options, self.parser.as_deref());
        self.logger
            .stop_call(&self.api, &*call, started.elapsed(), result.as_ref().err());
        result
    }
}

impl fmt::Debug for LoggingApiCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingApiCaller")
            .field("api", &self.api)
            .field("options", &self.options)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}
