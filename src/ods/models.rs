use crate::api::ApiOutcome;
use crate::api::constants::TOTAL_COUNT_HEADER;
use log::warn;
use serde_json::{Map, Value};

/// Probe result for one endpoint of one instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCount {
    pub name: String,
    pub count: u64,
    pub error: bool,
}

impl EndpointCount {
    pub fn failed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            error: true,
        }
    }

    /// A 200 carrying a numeric total-count header is a count; anything
    /// else is an error with count 0.
    pub fn from_outcome(name: &str, outcome: &ApiOutcome) -> Self {
        let response = match outcome.response() {
            Some(response) if response.status == 200 => response,
            _ => {
                warn!("Endpoint '{}' probe failed: {}", name, outcome.describe());
                return Self::failed(name);
            }
        };

        match response
            .header(TOTAL_COUNT_HEADER)
            .map(|value| value.trim().parse::<u64>())
        {
            Some(Ok(count)) => Self {
                name: name.to_string(),
                count,
                error: false,
            },
            Some(Err(e)) => {
                warn!(
                    "Endpoint '{}' returned an unreadable {} header: {}",
                    name, TOTAL_COUNT_HEADER, e
                );
                Self::failed(name)
            }
            None => {
                warn!("Endpoint '{}' returned no {} header", name, TOTAL_COUNT_HEADER);
                Self::failed(name)
            }
        }
    }
}

/// Build the report document: endpoint name to `{count, error}`
pub fn health_check_document(results: &[EndpointCount]) -> Value {
    let mut document = Map::new();
    for result in results {
        document.insert(
            result.name.clone(),
            serde_json::json!({ "count": result.count, "error": result.error }),
        );
    }
    Value::Object(document)
}

/// True when there is nothing worth reporting: no results, or only errors
pub fn is_empty_result(results: &[EndpointCount]) -> bool {
    results.iter().all(|result| result.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResponse;
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

    fn outcome(status: u16, total: Option<&'static str>) -> ApiOutcome {
        let mut headers = HeaderMap::new();
        if let Some(total) = total {
            headers.insert(
                HeaderName::from_static("total-count"),
                HeaderValue::from_static(total),
            );
        }
        ApiOutcome::Completed(ApiResponse {
            status,
            body: String::new(),
            headers,
        })
    }

    #[test]
    fn test_count_from_header() {
        let result = EndpointCount::from_outcome("students", &outcome(200, Some("42")));
        assert_eq!(
            result,
            EndpointCount {
                name: "students".to_string(),
                count: 42,
                error: false
            }
        );
    }

    #[test]
    fn test_error_cases() {
        assert!(EndpointCount::from_outcome("a", &outcome(200, None)).error);
        assert!(EndpointCount::from_outcome("a", &outcome(200, Some("many"))).error);
        assert!(EndpointCount::from_outcome("a", &outcome(404, Some("3"))).error);
        assert!(EndpointCount::from_outcome("a", &ApiOutcome::TransportFailure("reset".into())).error);

        let failed = EndpointCount::from_outcome("a", &outcome(500, None));
        assert_eq!(failed.count, 0);
        assert_eq!(failed.name, "a");
    }

    #[test]
    fn test_document() {
        let results = vec![
            EndpointCount {
                name: "students".to_string(),
                count: 3,
                error: false,
            },
            EndpointCount::failed("schools"),
        ];

        let document = health_check_document(&results);
        assert_eq!(
            document,
            serde_json::json!({
                "students": { "count": 3, "error": false },
                "schools": { "count": 0, "error": true }
            })
        );
    }

    #[test]
    fn test_empty_result() {
        assert!(is_empty_result(&[]));
        assert!(is_empty_result(&[EndpointCount::failed("a")]));
        assert!(!is_empty_result(&[
            EndpointCount::failed("a"),
            EndpointCount {
                name: "b".to_string(),
                count: 0,
                error: false
            }
        ]));
    }
}
