//! Generic option names to transfer-engine options.
//!
//! # Design
//! Callers and configuration files name options the way the curl manual
//! does, minus the `CURLOPT_` prefix (`returntransfer`, `timeout`,
//! `followlocation`). Options from another family are named in full
//! (`curlinfo_header_out`). Translation probes `CURLOPT_<KEY>` first, then
//! `<KEY>`, against a fixed table, and rejects the whole set on the first
//! miss so nothing reaches the engine.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::error::ApiError;

/// Prefix tried first when resolving a generic option name.
pub const OPTION_PREFIX: &str = "CURLOPT_";

/// Generic options keyed by lower-cased name, before translation.
pub type OptionSet = BTreeMap<String, Value>;

/// Options understood by the transfer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EngineOption {
    Url,
    ReturnTransfer,
    Header,
    HeaderOut,
    CustomRequest,
    Post,
    HttpGet,
    NoBody,
    PostFields,
    HttpHeader,
    UserAgent,
    Referer,
    Cookie,
    UserPwd,
    Timeout,
    TimeoutMs,
    ConnectTimeout,
    ConnectTimeoutMs,
    FollowLocation,
    MaxRedirs,
}

const OPTION_TABLE: &[(&str, EngineOption)] = &[
    ("CURLOPT_URL", EngineOption::Url),
    ("CURLOPT_RETURNTRANSFER", EngineOption::ReturnTransfer),
    ("CURLOPT_HEADER", EngineOption::Header),
    ("CURLINFO_HEADER_OUT", EngineOption::HeaderOut),
    ("CURLOPT_CUSTOMREQUEST", EngineOption::CustomRequest),
    ("CURLOPT_POST", EngineOption::Post),
    ("CURLOPT_HTTPGET", EngineOption::HttpGet),
    ("CURLOPT_NOBODY", EngineOption::NoBody),
    ("CURLOPT_POSTFIELDS", EngineOption::PostFields),
    ("CURLOPT_HTTPHEADER", EngineOption::HttpHeader),
    ("CURLOPT_USERAGENT", EngineOption::UserAgent),
    ("CURLOPT_REFERER", EngineOption::Referer),
    ("CURLOPT_COOKIE", EngineOption::Cookie),
    ("CURLOPT_USERPWD", EngineOption::UserPwd),
    ("CURLOPT_TIMEOUT", EngineOption::Timeout),
    ("CURLOPT_TIMEOUT_MS", EngineOption::TimeoutMs),
    ("CURLOPT_CONNECTTIMEOUT", EngineOption::ConnectTimeout),
    ("CURLOPT_CONNECTTIMEOUT_MS", EngineOption::ConnectTimeoutMs),
    ("CURLOPT_FOLLOWLOCATION", EngineOption::FollowLocation),
    ("CURLOPT_MAXREDIRS", EngineOption::MaxRedirs),
];

impl EngineOption {
    /// Look up an engine option by its full constant name.
    pub fn from_name(name: &str) -> Option<Self> {
        OPTION_TABLE
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, option)| *option)
    }

    /// Full constant name, e.g. `CURLOPT_URL`.
    pub fn name(self) -> &'static str {
        OPTION_TABLE
            .iter()
            .find(|(_, option)| *option == self)
            .map(|(name, _)| *name)
            .unwrap_or("UNKNOWN")
    }
}

/// Options every call starts with: hand the payload back, include the
/// response headers in it and record the outbound request head.
pub fn default_options() -> OptionSet {
    OptionSet::from([
        ("returntransfer".to_string(), Value::Bool(true)),
        ("header".to_string(), Value::Bool(true)),
        ("curlinfo_header_out".to_string(), Value::Bool(true)),
    ])
}

/// Defaults overlaid with `overrides`; keys are lower-cased so overrides
/// collide with defaults regardless of spelling.
pub fn merge_options<'a, I>(overrides: I) -> OptionSet
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let mut merged = default_options();
    for (key, value) in overrides {
        merged.insert(key.to_ascii_lowercase(), value.clone());
    }
    merged
}

/// Resolve one generic option name.
pub fn translate_key(key: &str) -> Result<EngineOption, ApiError> {
    let upper = key.to_ascii_uppercase();
    EngineOption::from_name(&format!("{OPTION_PREFIX}{upper}"))
        .or_else(|| EngineOption::from_name(&upper))
        .ok_or_else(|| ApiError::InvalidOption {
            key: key.to_string(),
        })
}

/// Resolve a whole option set. Fails on the first unknown key.
pub fn translate_options(options: &OptionSet) -> Result<EngineOptions, ApiError> {
    let mut resolved = EngineOptions::default();
    for (key, value) in options {
        let option = translate_key(key)?;
        resolved.set(option, value.clone());
    }
    Ok(resolved)
}

/// Resolved options, applied to the engine in one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOptions {
    values: BTreeMap<EngineOption, Value>,
}

impl EngineOptions {
    pub fn set(&mut self, option: EngineOption, value: Value) {
        self.values.insert(option, value);
    }

    pub fn get(&self, option: EngineOption) -> Option<&Value> {
        self.values.get(&option)
    }

    pub fn contains(&self, option: EngineOption) -> bool {
        self.values.contains_key(&option)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EngineOption, &Value)> {
        self.values.iter().map(|(option, value)| (*option, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Truthiness of a flag option; unset flags are off.
    pub fn flag(&self, option: EngineOption) -> bool {
        match self.get(option) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty() && s != "0",
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
        }
    }

    /// A string option. Numbers and booleans are rendered as text.
    pub fn text(&self, option: EngineOption) -> Result<Option<String>, ApiError> {
        match self.get(option) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(if *b { "1" } else { "" }.to_string())),
            Some(other) => Err(invalid(option, format!("expected a string, got {other}"))),
        }
    }

    /// A non-negative integer option. Numeric strings are accepted.
    pub fn number(&self, option: EngineOption) -> Result<Option<u64>, ApiError> {
        match self.get(option) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| invalid(option, format!("expected a non-negative integer, got {n}"))),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| invalid(option, format!("expected a non-negative integer, got {s:?}"))),
            Some(other) => Err(invalid(option, format!("expected a non-negative integer, got {other}"))),
        }
    }

    /// A list of strings, e.g. `HTTPHEADER` lines. A single string is a
    /// one-element list.
    pub fn list(&self, option: EngineOption) -> Result<Vec<String>, ApiError> {
        match self.get(option) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(invalid(option, format!("expected string items, got {other}"))),
                })
                .collect(),
            Some(other) => Err(invalid(option, format!("expected a list of strings, got {other}"))),
        }
    }

    /// A timeout given in seconds by `seconds` or in milliseconds by
    /// `millis`. Milliseconds win when both are set.
    pub fn duration(
        &self,
        seconds: EngineOption,
        millis: EngineOption,
    ) -> Result<Option<Duration>, ApiError> {
        if let Some(ms) = self.number(millis)? {
            return Ok(Some(Duration::from_millis(ms)));
        }
        Ok(self.number(seconds)?.map(Duration::from_secs))
    }

    /// Append lines to the `HTTPHEADER` list, keeping any lines already set.
    pub fn append_headers<I>(&mut self, lines: I) -> Result<(), ApiError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut headers = self.list(EngineOption::HttpHeader)?;
        headers.extend(lines);
        self.set(
            EngineOption::HttpHeader,
            Value::Array(headers.into_iter().map(Value::String).collect()),
        );
        Ok(())
    }
}

fn invalid(option: EngineOption, reason: String) -> ApiError {
    ApiError::InvalidOptionValue {
        option: option.name(),
        reason,
    }
}
