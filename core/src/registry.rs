//! Registry of per-API callers.
//!
//! # Design
//! The registry owns the configuration, a shared logger and one lazily
//! built [`LoggingApiCaller`] per API name. The first lookup of a name
//! constructs its caller; later lookups return the same instance. There is
//! no global: whoever needs callers is handed the registry.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::caller::LoggingApiCaller;
use crate::config::ApiCallerConfig;
use crate::error::ApiError;
use crate::logger::{ApiCallLogger, TracingCallLogger};
use crate::parser::ResponseParser;

/// Name of the default API.
pub const DEFAULT_API: &str = "_";

pub struct CallerRegistry {
    config: ApiCallerConfig,
    logger: Arc<dyn ApiCallLogger>,
    instances: HashMap<String, LoggingApiCaller>,
}

impl CallerRegistry {
    pub fn new(config: ApiCallerConfig, logger: Arc<dyn ApiCallLogger>) -> Self {
        Self {
            config,
            logger,
            instances: HashMap::new(),
        }
    }

    /// A registry whose callers log through `tracing`.
    pub fn with_tracing(config: ApiCallerConfig) -> Self {
        Self::new(config, Arc::new(TracingCallLogger))
    }

    /// The caller for `name`, built on first use with the configured parser.
    pub fn api(&mut self, name: &str) -> Result<&LoggingApiCaller, ApiError> {
        self.api_with_parser(name, None)
    }

    /// The caller for `name`. `parser` replaces the configured parser, but
    /// only when this lookup is the one that builds the caller.
    pub fn api_with_parser(
        &mut self,
        name: &str,
        parser: Option<Arc<dyn ResponseParser>>,
    ) -> Result<&LoggingApiCaller, ApiError> {
        let settings = self
            .config
            .api(name)
            .ok_or_else(|| ApiError::UnknownApi(name.to_string()))?;

        match self.instances.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let parser = parser.or_else(|| settings.parser.map(|kind| kind.build()));
                debug!(api = name, parser = parser.is_some(), "building api caller");
                let caller = LoggingApiCaller::new(
                    name,
                    settings.engine.clone(),
                    parser,
                    Arc::clone(&self.logger),
                );
                Ok(entry.insert(caller))
            }
        }
    }

    /// The caller for [`DEFAULT_API`].
    pub fn default_api(&mut self) -> Result<&LoggingApiCaller, ApiError> {
        self.api(DEFAULT_API)
    }

    /// Whether a caller for `name` has been built.
    pub fn is_built(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    pub fn config(&self) -> &ApiCallerConfig {
        &self.config
    }
}
