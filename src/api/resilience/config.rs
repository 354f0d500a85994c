//! Resilience configuration with builder pattern
//!
//! Bundles the two retry layers, transport timeouts, certificate handling
//! and request logging into one value shared by every client.

use super::retry::RetryConfig;
use crate::api::constants::retry as defaults;
use crate::config::AppSettings;
use std::time::Duration;

/// Global resilience configuration for API calls
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// Transport-level retry of transient failures
    pub retry: RetryConfig,
    /// Caller-level retry of any failure
    pub caller_retry: RetryConfig,
    pub transport: TransportConfig,
    pub monitoring: MonitoringConfig,
}

/// Settings for the underlying HTTP client
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub accept_invalid_certs: bool,
}

/// Request/response logging configuration
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub request_logging: bool,
    pub slow_request_threshold: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            caller_retry: RetryConfig::immediate(defaults::ANY_FAILURE_ATTEMPTS),
            transport: TransportConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(10),
            accept_invalid_certs: false,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            request_logging: true,
            slow_request_threshold: Duration::from_secs(30),
        }
    }
}

impl ResilienceConfig {
    /// Create a new builder for ResilienceConfig
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::new()
    }

    /// Derive the transport policy from the `[app]` settings section
    pub fn from_app_settings(settings: &AppSettings) -> Self {
        Self::builder()
            .max_retries(settings.max_retry_attempts)
            .starting_delay(Duration::from_millis(settings.retry_starting_delay_ms))
            .jitter(settings.retry_jitter)
            .request_timeout(Duration::from_secs(settings.timeout_secs))
            .accept_invalid_certs(settings.ignores_certificate_errors)
            .build()
    }

    /// Single attempts everywhere, no waiting (for testing)
    pub fn disabled() -> Self {
        Self {
            retry: RetryConfig::immediate(1),
            caller_retry: RetryConfig::immediate(1),
            transport: TransportConfig::default(),
            monitoring: MonitoringConfig {
                request_logging: false,
                ..MonitoringConfig::default()
            },
        }
    }
}

/// Builder for ResilienceConfig
#[derive(Debug)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ResilienceConfig::default(),
        }
    }

    /// Set transient retries made after the first attempt
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_attempts = retries.saturating_add(1);
        self
    }

    /// Set the first backoff delay
    pub fn starting_delay(mut self, delay: Duration) -> Self {
        self.config.retry.base_delay = delay;
        self
    }

    /// Randomize each backoff delay between 0.5x and 1.5x
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.config.retry.jitter = enabled;
        self
    }

    /// Set total caller-level attempts
    pub fn caller_attempts(mut self, attempts: u32) -> Self {
        self.config.caller_retry = RetryConfig::immediate(attempts);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.transport.request_timeout = timeout;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.transport.accept_invalid_certs = accept;
        self
    }

    /// Enable/disable request logging
    pub fn request_logging(mut self, enabled: bool) -> Self {
        self.config.monitoring.request_logging = enabled;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}

impl Default for ResilienceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
