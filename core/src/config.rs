//! Named API configuration.
//!
//! ```json
//! {
//!   "apis": {
//!     "_":      { "engine": { "timeout": 10 } },
//!     "search": { "engine": { "followlocation": true }, "parser": "json" }
//!   }
//! }
//! ```
//!
//! Engine option names are checked when a call executes, not here.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::options::OptionSet;
use crate::parser::ParserKind;

/// Settings for one named API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Engine option overrides passed to every call.
    #[serde(default)]
    pub engine: OptionSet,
    /// Parser applied to response bodies.
    #[serde(default)]
    pub parser: Option<ParserKind>,
}

/// All configured APIs by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiCallerConfig {
    #[serde(default)]
    pub apis: BTreeMap<String, ApiConfig>,
}

impl ApiCallerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ApiError> {
        serde_json::from_str(json).map_err(|e| ApiError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Add or replace one API.
    pub fn with_api(mut self, name: &str, api: ApiConfig) -> Self {
        self.apis.insert(name.to_string(), api);
        self
    }

    pub fn api(&self, name: &str) -> Option<&ApiConfig> {
        self.apis.get(name)
    }
}
