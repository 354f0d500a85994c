//! Request/response logging for outbound API calls
//!
//! Keeps secrets out of the log: authorization and credential-looking
//! headers are redacted before anything is printed.

use super::config::MonitoringConfig;
use crate::api::models::{ApiOutcome, ApiRequest, Authorization};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::time::Duration;

/// Structured logger for API calls
#[derive(Debug, Clone)]
pub struct RequestLogger {
    config: MonitoringConfig,
}

impl RequestLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    /// Log an outgoing request with sanitized headers
    pub fn log_request(&self, request: &ApiRequest) {
        if !self.config.request_logging {
            return;
        }

        let mut headers: BTreeMap<String, String> = request.headers.iter().cloned().collect();
        match &request.authorization {
            Some(Authorization::Bearer(_)) => {
                headers.insert("Authorization".to_string(), "Bearer".to_string());
            }
            Some(Authorization::Basic { .. }) => {
                headers.insert("Authorization".to_string(), "Basic".to_string());
            }
            None => {}
        }

        debug!(
            "HTTP Request: {} {} headers={:?}",
            request.method,
            request.url,
            sanitize_headers(&headers)
        );
    }

    /// Log the final outcome of a transport call
    pub fn log_outcome(&self, request: &ApiRequest, outcome: &ApiOutcome, duration: Duration) {
        if !self.config.request_logging {
            return;
        }

        match outcome {
            ApiOutcome::Completed(response) if response.is_success() => {
                debug!(
                    "HTTP Response: {} {} -> {} in {}ms",
                    request.method,
                    request.url,
                    response.status,
                    duration.as_millis()
                );
            }
            ApiOutcome::Completed(response) => {
                warn!(
                    "{} request for '{}' failed with status '{}': {}",
                    request.method, request.url, response.status, response.body
                );
            }
            ApiOutcome::TransportFailure(error) => {
                warn!("{} request for '{}' failed: {}", request.method, request.url, error);
            }
            ApiOutcome::NotAttempted(reason) => {
                debug!("{} request for '{}' not sent: {}", request.method, request.url, reason);
            }
        }

        if duration > self.config.slow_request_threshold {
            warn!(
                "Slow request detected: {} {} took {}ms (threshold {}ms)",
                request.method,
                request.url,
                duration.as_millis(),
                self.config.slow_request_threshold.as_millis()
            );
        }
    }
}

/// Redact headers that may carry credentials
pub fn sanitize_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| {
            let key_lower = key.to_lowercase();
            let sensitive = key_lower.contains("authorization")
                || key_lower.contains("token")
                || key_lower.contains("secret")
                || key_lower.contains("key");
            let value = if sensitive { "[REDACTED]".to_string() } else { value.clone() };
            (key.clone(), value)
        })
        .collect()
}
