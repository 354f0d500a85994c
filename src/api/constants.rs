//! API Constants for the admin directory and instance resource APIs

/// Path segment in front of every instance resource endpoint
pub const EDFI_URI: &str = "/ed-fi";

/// Zero-row query that only asks the resource server for its total count
pub const TOTAL_COUNT_QUERY: &str = "?offset=0&limit=0&totalCount=true";

/// Response header carrying the total row count of a resource query
pub const TOTAL_COUNT_HEADER: &str = "Total-Count";

/// Query suffix selecting only instances whose provisioning has completed
pub const COMPLETED_INSTANCES: &str = "?status=Completed";

/// Request header naming the tenant a directory call applies to
pub const TENANT_HEADER: &str = "tenant";

/// Grant type used against instance token endpoints
pub const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";

/// Grant type that authenticates with username and password
pub const PASSWORD_GRANT: &str = "password";

/// Standard headers for API requests
pub mod headers {
    /// Content type for JSON requests
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

/// Retry defaults for the transport layer
pub mod retry {
    /// First backoff delay for transient failures
    pub const STARTING_DELAY_MS: u64 = 500;

    /// Transient retries after the first attempt
    pub const MAX_RETRY_ATTEMPTS: u32 = 3;

    /// Total attempts made by the caller-level retry on any failure
    pub const ANY_FAILURE_ATTEMPTS: u32 = 3;

    /// Per-request timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 500;
}

/// Build the total-count probe URL for one resource endpoint
pub fn resource_count_url(resource_url: &str, endpoint: &str) -> String {
    format!(
        "{}{}/{}{}",
        resource_url.trim_end_matches('/'),
        EDFI_URI,
        endpoint.trim_start_matches('/'),
        TOTAL_COUNT_QUERY
    )
}

/// Build the instances listing URL restricted to completed instances
pub fn completed_instances_url(instances_url: &str) -> String {
    format!("{}{}", instances_url, COMPLETED_INSTANCES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_count_url() {
        assert_eq!(
            resource_count_url("http://www.myserver.com/data/v3", "students"),
            "http://www.myserver.com/data/v3/ed-fi/students?offset=0&limit=0&totalCount=true"
        );
        // Trailing and leading slashes do not double up
        assert_eq!(
            resource_count_url("http://host/data/v3/", "/schools"),
            "http://host/data/v3/ed-fi/schools?offset=0&limit=0&totalCount=true"
        );
    }

    #[test]
    fn test_completed_instances_url() {
        assert_eq!(
            completed_instances_url("http://host/adminconsole/instances"),
            "http://host/adminconsole/instances?status=Completed"
        );
    }
}
