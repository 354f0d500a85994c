//! Health check run: tenants, then instances, then probes and reports
//!
//! The runner walks the directory sequentially and isolates every failure
//! to the tenant or instance it happened on. Directory access and instance
//! probing sit behind traits so the walk can be driven by fakes.

use crate::admin::{DirectoryClient, HealthCheckReport, Instance, ReportOutcome, Tenant};
use crate::api::{ApiClient, ResilienceConfig};
use crate::config::Config;
use crate::ods::{EndpointCount, EndpointHealthAggregator, health_check_document, is_empty_result};
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[async_trait]
pub trait Directory: Send + Sync {
    async fn list_tenants(&self) -> Vec<Tenant>;
    async fn list_instances(&self, tenant_name: &str) -> Vec<Instance>;
    async fn post_health_check(&self, report: &HealthCheckReport, tenant_name: &str) -> ReportOutcome;
}

#[async_trait]
pub trait InstanceProber: Send + Sync {
    async fn aggregate(
        &self,
        instance: &Instance,
        endpoints: &[String],
        cancel: &CancellationToken,
    ) -> Vec<EndpointCount>;
}

#[async_trait]
impl Directory for DirectoryClient {
    async fn list_tenants(&self) -> Vec<Tenant> {
        DirectoryClient::list_tenants(self).await
    }

    async fn list_instances(&self, tenant_name: &str) -> Vec<Instance> {
        DirectoryClient::list_instances(self, tenant_name).await
    }

    async fn post_health_check(&self, report: &HealthCheckReport, tenant_name: &str) -> ReportOutcome {
        DirectoryClient::post_health_check(self, report, tenant_name).await
    }
}

#[async_trait]
impl InstanceProber for EndpointHealthAggregator {
    async fn aggregate(
        &self,
        instance: &Instance,
        endpoints: &[String],
        cancel: &CancellationToken,
    ) -> Vec<EndpointCount> {
        EndpointHealthAggregator::aggregate(self, instance, endpoints, cancel).await
    }
}

/// When an instance's results are posted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportPolicy {
    /// Skip instances with no results or only errored endpoints
    #[default]
    SkipEmpty,
    /// Post whenever at least one endpoint was probed
    Always,
}

impl ReportPolicy {
    pub fn should_report(&self, results: &[EndpointCount]) -> bool {
        match self {
            ReportPolicy::SkipEmpty => !is_empty_result(results),
            ReportPolicy::Always => !results.is_empty(),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown report policy '{0}', expected 'skip-empty' or 'always'")]
pub struct UnknownReportPolicy(String);

impl FromStr for ReportPolicy {
    type Err = UnknownReportPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip-empty" => Ok(ReportPolicy::SkipEmpty),
            "always" => Ok(ReportPolicy::Always),
            other => Err(UnknownReportPolicy(other.to_string())),
        }
    }
}

/// Counters for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub tenants: usize,
    pub instances: usize,
    pub ineligible: usize,
    pub empty: usize,
    pub reported: usize,
    pub report_failures: usize,
    pub cancelled: bool,
}

impl RunSummary {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            tenants: 0,
            instances: 0,
            ineligible: 0,
            empty: 0,
            reported: 0,
            report_failures: 0,
            cancelled: false,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {}: {} tenants, {} instances, {} ineligible, {} without data, {} reported, {} report failures{}",
            self.run_id,
            self.tenants,
            self.instances,
            self.ineligible,
            self.empty,
            self.reported,
            self.report_failures,
            if self.cancelled { " (cancelled)" } else { "" }
        )
    }
}

pub struct HealthCheckRunner<D, P> {
    directory: D,
    prober: P,
    endpoints: Vec<String>,
    report_policy: ReportPolicy,
}

impl<D: Directory, P: InstanceProber> HealthCheckRunner<D, P> {
    pub fn new(directory: D, prober: P, endpoints: Vec<String>) -> Self {
        Self {
            directory,
            prober,
            endpoints,
            report_policy: ReportPolicy::default(),
        }
    }

    pub fn with_report_policy(mut self, report_policy: ReportPolicy) -> Self {
        self.report_policy = report_policy;
        self
    }

    pub async fn run(&self, cancel: &CancellationToken) -> RunSummary {
        let mut summary = RunSummary::new(Uuid::new_v4());
        info!("Starting health check run {}", summary.run_id);

        info!("Get tenants on Admin Api");
        let tenants = self.directory.list_tenants().await;
        summary.tenants = tenants.len();

        if tenants.is_empty() {
            info!("No tenants returned from Admin Api");
        }

        'tenants: for tenant in &tenants {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let tenant_name = tenant.name();
            let instances = self.directory.list_instances(tenant_name).await;
            if instances.is_empty() {
                info!("No instances found on Admin Api for tenant '{}'", tenant_name);
                continue;
            }

            for instance in &instances {
                if cancel.is_cancelled() {
                    summary.cancelled = true;
                    break 'tenants;
                }
                summary.instances += 1;
                self.process_instance(instance, tenant_name, cancel, &mut summary)
                    .await;
            }
        }

        info!("Process completed: {}", summary);
        summary
    }

    async fn process_instance(
        &self,
        instance: &Instance,
        tenant_name: &str,
        cancel: &CancellationToken,
        summary: &mut RunSummary,
    ) {
        info!("Processing instance with name: {}", instance.display_name());

        let missing = instance.missing_fields();
        if !missing.is_empty() {
            warn!(
                "Instance '{}' skipped. Missing: {}",
                instance.display_name(),
                missing.join(", ")
            );
            summary.ineligible += 1;
            return;
        }

        let results = self.prober.aggregate(instance, &self.endpoints, cancel).await;

        // Partial results from a shutdown are not reported
        if cancel.is_cancelled() {
            summary.cancelled = true;
            return;
        }

        if !self.report_policy.should_report(&results) {
            info!(
                "No health check data has been collected for instance with name: {}",
                instance.display_name()
            );
            summary.empty += 1;
            return;
        }

        let report = HealthCheckReport {
            tenant_id: instance.tenant_id,
            instance_id: instance.id,
            document: health_check_document(&results).to_string(),
        };

        info!("Posting health check data to Admin Api");
        match self.directory.post_health_check(&report, tenant_name).await {
            ReportOutcome::Accepted => summary.reported += 1,
            ReportOutcome::Failed(_) => summary.report_failures += 1,
        }
    }
}

/// Wire the HTTP-backed runner from configuration. Each call builds fresh
/// clients, so tokens live for one run.
pub fn build_runner(
    config: &Config,
) -> anyhow::Result<HealthCheckRunner<DirectoryClient, EndpointHealthAggregator>> {
    let resilience = ResilienceConfig::from_app_settings(&config.app);
    let api = ApiClient::new(&resilience)?;

    let directory = DirectoryClient::new(api.clone(), config.admin_api.clone());
    let prober = EndpointHealthAggregator::new(api).with_instance_timeout(config.app.instance_timeout());

    Ok(
        HealthCheckRunner::new(directory, prober, config.ods_api.endpoints.clone())
            .with_report_policy(config.app.report_policy),
    )
}
