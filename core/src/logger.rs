//! Call loggers: observe a call before and after it runs.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::call::CallDetails;
use crate::error::ApiError;

/// Receives every call made through a `LoggingApiCaller`.
pub trait ApiCallLogger: Send + Sync {
    fn start_call(&self, api: &str, call: &dyn CallDetails);

    /// `error` is set when `execute` returned an error.
    fn stop_call(&self, api: &str, call: &dyn CallDetails, elapsed: Duration, error: Option<&ApiError>);
}

/// Emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCallLogger;

impl ApiCallLogger for TracingCallLogger {
    fn start_call(&self, api: &str, call: &dyn CallDetails) {
        debug!(
            api,
            call = call.name(),
            url = call.url(),
            request = %call.request_object_representation(),
            "api call started"
        );
    }

    fn stop_call(&self, api: &str, call: &dyn CallDetails, elapsed: Duration, error: Option<&ApiError>) {
        let elapsed_ms = elapsed.as_millis() as u64;
        if let Some(error) = error {
            warn!(api, call = call.name(), url = call.url(), elapsed_ms, %error, "api call failed");
            return;
        }
        info!(
            api,
            call = call.name(),
            url = call.url(),
            status = %call.status(),
            elapsed_ms,
            "api call finished"
        );
        debug!(
            api,
            request_headers = call.request_headers().unwrap_or_default(),
            response_headers = call.response_headers().unwrap_or_default(),
            response = %call.response_object_representation(),
            "api call response"
        );
    }
}

/// One finished call as seen by [`MemoryCallLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedCall {
    pub api: String,
    pub name: String,
    pub url: String,
    pub status: String,
    pub status_code: Option<u16>,
    pub elapsed: Duration,
    pub request_headers: Option<String>,
    pub response_headers: Option<String>,
    pub request_representation: String,
    pub response_representation: String,
    pub error: Option<String>,
}

/// Keeps finished calls in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemoryCallLogger {
    started: Mutex<usize>,
    calls: Mutex<Vec<LoggedCall>>,
}

impl MemoryCallLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls started so far, finished or not.
    pub fn started(&self) -> usize {
        *lock(&self.started)
    }

    pub fn calls(&self) -> Vec<LoggedCall> {
        lock(&self.calls).clone()
    }

    /// Total time spent in finished calls.
    pub fn total_time(&self) -> Duration {
        lock(&self.calls).iter().map(|c| c.elapsed).sum()
    }
}

impl ApiCallLogger for MemoryCallLogger {
    fn start_call(&self, _api: &str, _call: &dyn CallDetails) {
        *lock(&self.started) += 1;
    }

    fn stop_call(&self, api: &str, call: &dyn CallDetails, elapsed: Duration, error: Option<&ApiError>) {
        lock(&self.calls).push(LoggedCall {
            api: api.to_string(),
            name: call.name().to_string(),
            url: call.url().to_string(),
            status: call.status(),
            status_code: call.status_code(),
            elapsed,
            request_headers: call.request_headers().map(str::to_string),
            response_headers: call.response_headers().map(str::to_string),
            request_representation: call.request_object_representation(),
            response_representation: call.response_object_representation(),
            error: error.map(ToString::to_string),
        });
    }
}

// A panicking logger must not take later calls down with it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
