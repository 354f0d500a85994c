//! Instance resource API: concurrent total-count probes

pub mod aggregator;
pub mod models;

pub use aggregator::EndpointHealthAggregator;
pub use models::{EndpointCount, health_check_document, is_empty_result};
