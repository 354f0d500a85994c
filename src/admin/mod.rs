//! Admin directory service: tenant and instance listings, report posting

pub mod client;
pub mod models;

pub use client::{DirectoryClient, ReportOutcome};
pub use models::{HealthCheckReport, Instance, Tenant, TenantDocument};
