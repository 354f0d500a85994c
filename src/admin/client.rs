use super::models::{HealthCheckReport, Instance, Tenant};
use crate::api::constants::{TENANT_HEADER, completed_instances_url};
use crate::api::{ApiClient, ApiOutcome, ApiRequest, TokenSession};
use crate::config::AdminApiSettings;
use log::{debug, error, info};
use serde::de::DeserializeOwned;

/// Result of posting one health check report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Accepted,
    Failed(String),
}

impl ReportOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ReportOutcome::Accepted)
    }
}

/// Client for the admin directory service.
///
/// Every call checks the settings first and fails soft when they are
/// incomplete. Calls are wrapped in the caller-level any-failure retry on
/// top of the transport's transient retry.
pub struct DirectoryClient {
    settings: AdminApiSettings,
    api: ApiClient,
    session: TokenSession,
}

impl DirectoryClient {
    pub fn new(api: ApiClient, settings: AdminApiSettings) -> Self {
        let session = TokenSession::new(api.clone(), settings.credentials());
        Self {
            settings,
            api,
            session,
        }
    }

    pub fn session(&self) -> &TokenSession {
        &self.session
    }

    pub async fn list_tenants(&self) -> Vec<Tenant> {
        if !self.settings_valid() {
            return Vec::new();
        }

        debug!("Getting tenants from {}", self.settings.tenants_url);
        let request = ApiRequest::get(self.settings.tenants_url.clone());
        let outcome = self.authorized(request).await;
        read_items(&outcome, "tenant")
    }

    pub async fn list_instances(&self, tenant_name: &str) -> Vec<Instance> {
        if !self.settings_valid() {
            return Vec::new();
        }

        let url = completed_instances_url(&self.settings.instances_url);
        debug!("Getting instances for tenant '{}' from {}", tenant_name, url);
        let request = ApiRequest::get(url).optional_header(TENANT_HEADER, Some(tenant_name));
        let outcome = self.authorized(request).await;
        read_items(&outcome, "instance")
    }

    /// Post one report. 200 and 201 are both accepted.
    pub async fn post_health_check(
        &self,
        report: &HealthCheckReport,
        tenant_name: &str,
    ) -> ReportOutcome {
        let body = match serde_json::to_string(report) {
            Ok(body) => body,
            Err(e) => {
                error!(
                    "Not able to serialize health check for tenant {}: {}",
                    report.tenant_id, e
                );
                return ReportOutcome::Failed(e.to_string());
            }
        };

        let request = ApiRequest::post_json(self.settings.health_check_url.clone(), body)
            .optional_header(TENANT_HEADER, Some(tenant_name));

        let outcome = self.authorized(request).await;
        match outcome.status() {
            Some(200) | Some(201) => {
                info!(
                    "Health check posted for tenant {} instance {}",
                    report.tenant_id, report.instance_id
                );
                ReportOutcome::Accepted
            }
            _ => {
                error!(
                    "Not able to post health check data. Tenant Id: {}. Instance Id: {}. Returned {}",
                    report.tenant_id,
                    report.instance_id,
                    outcome.describe()
                );
                ReportOutcome::Failed(outcome.describe())
            }
        }
    }

    fn settings_valid(&self) -> bool {
        let missing = self.settings.missing_fields();
        if missing.is_empty() {
            true
        } else {
            error!(
                "Admin API settings have not been set properly. Missing: {}",
                missing.join(", ")
            );
            false
        }
    }

    /// Attach the directory token and send with both retry layers
    async fn authorized(&self, request: ApiRequest) -> ApiOutcome {
        let token = match self.session.acquire().await {
            Ok(token) => token,
            Err(e) => return ApiOutcome::NotAttempted(format!("no access token: {}", e)),
        };

        let request = request.bearer(&token);
        self.api
            .caller_retry()
            .execute(&request.method, &request.url, || self.api.send(&request))
            .await
    }
}

/// Decode a 200 listing response element by element
fn read_items<T: DeserializeOwned>(outcome: &ApiOutcome, kind: &str) -> Vec<T> {
    match outcome.response() {
        Some(response) if response.status == 200 && !response.body.is_empty() => {
            parse_items(&response.body, kind)
        }
        _ => {
            error!("Not able to list {}s: {}", kind, outcome.describe());
            Vec::new()
        }
    }
}

/// Parse a JSON array, skipping (and logging) elements that fail to decode
pub fn parse_items<T: DeserializeOwned>(body: &str, kind: &str) -> Vec<T> {
    let elements: Vec<serde_json::Value> = match serde_json::from_str(body) {
        Ok(elements) => elements,
        Err(e) => {
            error!("Not able to read {} list: {}", kind, e);
            return Vec::new();
        }
    };

    elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| match serde_json::from_value(element) {
            Ok(item) => Some(item),
            Err(e) => {
                error!("Not able to process {} at position {}: {}", kind, index, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_items_skips_malformed_elements() {
        let body = r#"[
            {"TenantId": 1, "Document": {"EdfiApiDiscoveryUrl": "u1", "Name": "tenant1"}},
            {"TenantId": "not a number", "Document": {}},
            {"TenantId": 2, "Document": {"EdfiApiDiscoveryUrl": "u2", "Name": "tenant2"}}
        ]"#;

        let tenants: Vec<Tenant> = parse_items(body, "tenant");
        assert_eq!(tenants.len(), 2);
        assert_eq!(tenants[0].name(), "tenant1");
        assert_eq!(tenants[1].name(), "tenant2");
    }

    #[test]
    fn test_parse_items_rejects_non_array() {
        let tenants: Vec<Tenant> = parse_items(r#"{"TenantId": 1}"#, "tenant");
        assert!(tenants.is_empty());
    }

    #[test]
    fn test_report_outcome() {
        assert!(ReportOutcome::Accepted.is_accepted());
        assert!(!ReportOutcome::Failed("status 500".into()).is_accepted());
    }
}
