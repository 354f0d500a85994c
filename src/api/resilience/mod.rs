//! Resilience features for outbound API calls
//!
//! Provides retry policies, transport configuration and request logging.

pub mod config;
pub mod logging;
pub mod retry;

pub use config::{MonitoringConfig, ResilienceConfig, ResilienceConfigBuilder, TransportConfig};
pub use logging::RequestLogger;
pub use retry::{RetryConfig, RetryPolicy, RetryStrategy, is_transient_status};
