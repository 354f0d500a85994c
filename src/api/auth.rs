use super::client::ApiClient;
use super::constants::{CLIENT_CREDENTIALS_GRANT, TENANT_HEADER};
use super::error::AuthError;
use super::models::{AccessToken, ApiOutcome, ApiRequest, CredentialSet};
use log::{debug, error, info};
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Bearer token session owned by one client.
///
/// The token is fetched lazily on first use and kept for the life of the
/// session; there is no expiry tracking. Acquisition is single-flight:
/// concurrent callers wait on the same lock and share the outcome of one
/// token request. A failed request is remembered too, so at most one request
/// is made between invalidations.
pub struct TokenSession {
    api: ApiClient,
    credentials: CredentialSet,
    state: Mutex<TokenState>,
    acquisitions: AtomicU32,
}

#[derive(Default)]
struct TokenState {
    token: Option<AccessToken>,
    failure: Option<String>,
}

impl TokenSession {
    pub fn new(api: ApiClient, credentials: CredentialSet) -> Self {
        Self {
            api,
            credentials,
            state: Mutex::new(TokenState::default()),
            acquisitions: AtomicU32::new(0),
        }
    }

    /// Return the cached token, fetching it if none is held and no fetch
    /// has failed since the last invalidation
    pub async fn acquire(&self) -> Result<AccessToken, AuthError> {
        let mut state = self.state.lock().await;
        if let Some(token) = state.token.as_ref() {
            return Ok(token.clone());
        }
        if let Some(reason) = state.failure.as_ref() {
            return Err(AuthError::Unavailable(reason.clone()));
        }

        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        match self.request_token().await {
            Ok(token) => {
                state.token = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                state.failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop the cached token or remembered failure unconditionally
    pub async fn invalidate(&self) {
        *self.state.lock().await = TokenState::default();
    }

    /// Drop the cached token only if it is still `rejected`. Several probes
    /// can see the same 401; only the first one allows a new fetch.
    pub async fn invalidate_if_current(&self, rejected: &AccessToken) -> bool {
        let mut state = self.state.lock().await;
        if state.token.as_ref() == Some(rejected) {
            *state = TokenState::default();
            debug!("Invalidated token for {}", self.credentials.token_url());
            true
        } else {
            false
        }
    }

    /// Number of token requests made so far
    pub fn acquisition_attempts(&self) -> u32 {
        self.acquisitions.load(Ordering::SeqCst)
    }

    async fn request_token(&self) -> Result<AccessToken, AuthError> {
        let token_url = self.credentials.token_url();
        info!("Requesting access token from {}", token_url);

        match self.api.send(&self.token_request()).await {
            ApiOutcome::Completed(response) if response.status == 200 => {
                let token = parse_token_response(&response.body)?;
                debug!("Access token obtained from {}", token_url);
                Ok(token)
            }
            ApiOutcome::Completed(response) => {
                error!(
                    "Not able to get access token from {}. Status Code returned is: {}",
                    token_url, response.status
                );
                Err(AuthError::Rejected {
                    status: response.status,
                    body: response.body,
                })
            }
            ApiOutcome::TransportFailure(reason) | ApiOutcome::NotAttempted(reason) => {
                error!("Not able to get access token from {}: {}", token_url, reason);
                Err(AuthError::Transport(reason))
            }
        }
    }

    fn token_request(&self) -> ApiRequest {
        match &self.credentials {
            CredentialSet::Form {
                token_url,
                client_id,
                client_secret,
                username,
                password,
                grant_type,
                scope,
            } => ApiRequest::post_form(
                token_url.clone(),
                vec![
                    ("username".to_string(), username.clone()),
                    ("client_id".to_string(), client_id.clone()),
                    ("client_secret".to_string(), client_secret.clone()),
                    ("password".to_string(), password.clone()),
                    ("grant_type".to_string(), grant_type.clone()),
                    ("scope".to_string(), scope.clone()),
                ],
            ),
            CredentialSet::ClientCredentials {
                token_url,
                client_id,
                client_secret,
                tenant,
            } => ApiRequest::post_form(
                token_url.clone(),
                vec![("grant_type".to_string(), CLIENT_CREDENTIALS_GRANT.to_string())],
            )
            .optional_header(TENANT_HEADER, Some(tenant.as_str()))
            .basic(client_id.clone(), client_secret.clone()),
        }
    }
}

/// Decode a token endpoint response body into a bearer token
pub fn parse_token_response(body: &str) -> Result<AccessToken, AuthError> {
    let response: TokenResponse = serde_json::from_str(body)?;
    if response.access_token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(AccessToken::new(response.access_token))
}
