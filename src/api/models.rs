use reqwest::Method;
use reqwest::header::HeaderMap;
use std::fmt;

/// Credentials exchanged for a bearer token
#[derive(Debug, Clone)]
pub enum CredentialSet {
    /// Admin directory credentials; every field is posted in the form body,
    /// empty ones included, because the token endpoint expects the full form
    Form {
        token_url: String,
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
        grant_type: String,
        scope: String,
    },
    /// Instance client credentials, sent as HTTP Basic with a
    /// `client_credentials` grant in the body. A non-empty `tenant` goes
    /// out as the `tenant` header.
    ClientCredentials {
        token_url: String,
        client_id: String,
        client_secret: String,
        tenant: String,
    },
}

impl CredentialSet {
    pub fn token_url(&self) -> &str {
        match self {
            CredentialSet::Form { token_url, .. } => token_url,
            CredentialSet::ClientCredentials { token_url, .. } => token_url,
        }
    }
}

/// Opaque bearer token. Debug output never shows the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Authorization attached to a single request
#[derive(Debug, Clone)]
pub enum Authorization {
    Bearer(AccessToken),
    Basic { username: String, password: String },
}

/// Request body variants used by this agent
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(String),
    Form(Vec<(String, String)>),
}

/// A fully described HTTP request that can be replayed on retry
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub authorization: Option<Authorization>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            authorization: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post_json(url: impl Into<String>, body: impl Into<String>) -> Self {
        let mut request = Self::new(Method::POST, url);
        request.body = RequestBody::Json(body.into());
        request
    }

    pub fn post_form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        let mut request = Self::new(Method::POST, url);
        request.body = RequestBody::Form(fields);
        request
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a header only when the value is non-empty
    pub fn optional_header(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) if !value.is_empty() => self.header(name, value),
            _ => self,
        }
    }

    pub fn bearer(mut self, token: &AccessToken) -> Self {
        self.authorization = Some(Authorization::Bearer(token.clone()));
        self
    }

    pub fn basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.authorization = Some(Authorization::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }
}

/// A response that arrived from the remote side, whatever its status
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Result of invoking the HTTP layer.
///
/// `Completed` means a response was received; callers still inspect the
/// status. `TransportFailure` means the request was sent but no response
/// came back. `NotAttempted` means nothing was sent, e.g. no token.
#[derive(Debug, Clone)]
pub enum ApiOutcome {
    Completed(ApiResponse),
    TransportFailure(String),
    NotAttempted(String),
}

impl ApiOutcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiOutcome::Completed(response) => Some(response.status),
            _ => None,
        }
    }

    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            ApiOutcome::Completed(response) => Some(response),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.response().is_some_and(ApiResponse::is_success)
    }

    /// Short human description for log lines
    pub fn describe(&self) -> String {
        match self {
            ApiOutcome::Completed(response) => format!("status {}", response.status),
            ApiOutcome::TransportFailure(error) => format!("transport failure: {}", error),
            ApiOutcome::NotAttempted(reason) => format!("not attempted: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> ApiResponse {
        ApiResponse {
            status,
            body: String::new(),
            headers: HeaderMap::new(),
        }
    }

    #[test]
    fn test_outcome_success_classification() {
        assert!(ApiOutcome::Completed(response(200)).is_success());
        assert!(ApiOutcome::Completed(response(201)).is_success());
        assert!(!ApiOutcome::Completed(response(404)).is_success());
        assert!(!ApiOutcome::TransportFailure("reset".into()).is_success());
        assert!(!ApiOutcome::NotAttempted("no token".into()).is_success());
        assert_eq!(ApiOutcome::NotAttempted("no token".into()).status(), None);
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("super-secret");
        assert!(!format!("{:?}", token).contains("super-secret"));
        assert_eq!(token.as_str(), "super-secret");
    }

    #[test]
    fn test_optional_header_skips_empty_values() {
        let request = ApiRequest::get("http://host")
            .optional_header("tenant", Some(""))
            .optional_header("tenant", None);
        assert!(request.headers.is_empty());

        let request = ApiRequest::get("http://host").optional_header("tenant", Some("tenant1"));
        assert_eq!(request.headers, vec![("tenant".to_string(), "tenant1".to_string())]);
    }
}
