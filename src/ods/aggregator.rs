use super::models::EndpointCount;
use crate::admin::Instance;
use crate::api::constants::{TENANT_HEADER, resource_count_url};
use crate::api::{ApiClient, ApiOutcome, ApiRequest, CredentialSet, TokenSession};
use log::{debug, error, info, warn};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Collects one total-count per monitored endpoint of an instance.
///
/// Each instance gets its own token session against its own OAuth URL.
/// Probes run concurrently and the aggregator waits for all of them; a
/// failing probe only marks its own endpoint.
#[derive(Clone)]
pub struct EndpointHealthAggregator {
    api: ApiClient,
    instance_timeout: Option<Duration>,
}

/// Per-instance state shared by that instance's probes
struct InstanceProbe {
    api: ApiClient,
    session: TokenSession,
    resource_url: String,
    tenant_name: String,
}

impl EndpointHealthAggregator {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            instance_timeout: None,
        }
    }

    /// Bound the time spent on one instance; unfinished probes are marked as errors
    pub fn with_instance_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.instance_timeout = timeout;
        self
    }

    /// One result per input endpoint, in input order
    pub async fn aggregate(
        &self,
        instance: &Instance,
        endpoints: &[String],
        cancel: &CancellationToken,
    ) -> Vec<EndpointCount> {
        if endpoints.is_empty() {
            return Vec::new();
        }

        let scope = cancel.child_token();
        let timer = self.instance_timeout.map(|timeout| {
            let scope = scope.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                scope.cancel();
            })
        });

        let results = self.probe_all(instance, endpoints, &scope).await;

        if let Some(timer) = timer {
            timer.abort();
        }
        scope.cancel();

        results
    }

    async fn probe_all(
        &self,
        instance: &Instance,
        endpoints: &[String],
        scope: &CancellationToken,
    ) -> Vec<EndpointCount> {
        let probe = Arc::new(InstanceProbe::new(self.api.clone(), instance));

        let authenticated = tokio::select! {
            biased;
            _ = scope.cancelled() => {
                warn!("Cancelled before authenticating instance '{}'", instance.display_name());
                false
            }
            result = probe.session.acquire() => match result {
                Ok(_) => true,
                Err(e) => {
                    error!(
                        "Not able to authenticate against instance '{}': {}",
                        instance.display_name(),
                        e
                    );
                    false
                }
            },
        };
        if !authenticated {
            return endpoints.iter().map(|name| EndpointCount::failed(name.as_str())).collect();
        }

        let mut tasks = JoinSet::new();
        for (index, endpoint) in endpoints.iter().enumerate() {
            let probe = Arc::clone(&probe);
            let endpoint = endpoint.clone();
            let scope = scope.clone();
            tasks.spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = scope.cancelled() => {
                        warn!("Probe for endpoint '{}' cancelled", endpoint);
                        EndpointCount::failed(endpoint.as_str())
                    }
                    result = probe.count(&endpoint) => result,
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<EndpointCount>> = vec![None; endpoints.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => error!("Endpoint probe task failed: {}", e),
            }
        }

        let results: Vec<EndpointCount> = slots
            .into_iter()
            .zip(endpoints)
            .map(|(slot, name)| slot.unwrap_or_else(|| EndpointCount::failed(name.as_str())))
            .collect();

        info!(
            "Instance '{}': {} of {} endpoints counted",
            instance.display_name(),
            results.iter().filter(|result| !result.error).count(),
            results.len()
        );
        results
    }
}

impl InstanceProbe {
    fn new(api: ApiClient, instance: &Instance) -> Self {
        let credentials = CredentialSet::ClientCredentials {
            token_url: instance.oauth_url.clone(),
            client_id: instance.client_id.clone(),
            client_secret: instance.client_secret.clone(),
            tenant: instance.tenant_name.clone(),
        };

        Self {
            session: TokenSession::new(api.clone(), credentials),
            api,
            resource_url: instance.resource_url.clone(),
            tenant_name: instance.tenant_name.clone(),
        }
    }

    async fn count(&self, endpoint: &str) -> EndpointCount {
        let url = resource_count_url(&self.resource_url, endpoint);
        debug!("Probing {}", url);

        let outcome = self
            .api
            .caller_retry()
            .execute(&Method::GET, &url, || self.attempt(&url))
            .await;

        EndpointCount::from_outcome(endpoint, &outcome)
    }

    /// One outer attempt. A 401 drops the token it was sent with so the
    /// next attempt authenticates again.
    async fn attempt(&self, url: &str) -> ApiOutcome {
        let token = match self.session.acquire().await {
            Ok(token) => token,
            Err(e) => return ApiOutcome::NotAttempted(format!("no access token: {}", e)),
        };

        let request = ApiRequest::get(url)
            .optional_header(TENANT_HEADER, Some(self.tenant_name.as_str()))
            .bearer(&token);
        let outcome = self.api.send(&request).await;

        if outcome.status() == Some(401) && self.session.invalidate_if_current(&token).await {
            warn!("Access token rejected by {}, re-authenticating", url);
        }

        outcome
    }
}
