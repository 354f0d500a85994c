//! Authenticated, resilient HTTP layer
//!
//! Token sessions, the retrying invoker and the request/response types
//! shared by the admin directory client and the instance aggregator.

pub mod auth;
pub mod client;
pub mod constants;
pub mod error;
pub mod models;
pub mod resilience;

pub use auth::TokenSession;
pub use client::ApiClient;
pub use error::AuthError;
pub use models::{AccessToken, ApiOutcome, ApiRequest, ApiResponse, CredentialSet};
pub use resilience::{ResilienceConfig, RetryConfig, RetryPolicy, RetryStrategy};
