use super::constants::headers;
use super::models::{ApiOutcome, ApiRequest, ApiResponse, Authorization, RequestBody};
use super::resilience::{RequestLogger, ResilienceConfig, RetryPolicy};
use anyhow::Context;
use std::time::{Duration, Instant};

/// HTTP invoker shared by the directory and instance clients.
///
/// `send` retries transient failures with backoff. The caller-level
/// any-failure policy is exposed through `caller_retry` so call sites stack
/// the two layers explicitly.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    transient_retry: RetryPolicy,
    caller_retry: RetryPolicy,
    logger: RequestLogger,
}

impl ApiClient {
    pub fn new(config: &ResilienceConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.transport.request_timeout)
            .connect_timeout(config.transport.connect_timeout)
            .danger_accept_invalid_certs(config.transport.accept_invalid_certs)
            .user_agent(concat!("instance-healthcheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_custom_client(http_client, config))
    }

    /// Create a client around an already configured reqwest client
    pub fn with_custom_client(http_client: reqwest::Client, config: &ResilienceConfig) -> Self {
        Self {
            http_client,
            transient_retry: RetryPolicy::transient_only(config.retry.clone()),
            caller_retry: RetryPolicy::any_failure(config.caller_retry.clone()),
            logger: RequestLogger::new(config.monitoring.clone()),
        }
    }

    /// Policy callers wrap around `send` to retry on any failure
    pub fn caller_retry(&self) -> &RetryPolicy {
        &self.caller_retry
    }

    /// Send with transient-failure retry and exponential backoff
    pub async fn send(&self, request: &ApiRequest) -> ApiOutcome {
        self.transient_retry
            .execute(&request.method, &request.url, || self.send_once(request))
            .await
    }

    /// Send exactly once
    pub async fn send_once(&self, request: &ApiRequest) -> ApiOutcome {
        self.logger.log_request(request);
        let started = Instant::now();

        let mut builder = self
            .http_client
            .request(request.method.clone(), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.authorization {
            Some(Authorization::Bearer(token)) => builder.bearer_auth(token.as_str()),
            Some(Authorization::Basic { username, password }) => {
                builder.basic_auth(username, Some(password))
            }
            None => builder,
        };

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder
                .header(reqwest::header::CONTENT_TYPE, headers::CONTENT_TYPE_JSON)
                .body(body.clone()),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let outcome = match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let headers = response.headers().clone();
                match response.text().await {
                    Ok(body) => ApiOutcome::Completed(ApiResponse { status, body, headers }),
                    Err(e) => {
                        ApiOutcome::TransportFailure(format!("failed to read response body: {}", e))
                    }
                }
            }
            Err(e) => ApiOutcome::TransportFailure(e.to_string()),
        };

        self.logger.log_outcome(request, &outcome, started.elapsed());
        outcome
    }
}
