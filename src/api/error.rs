use thiserror::Error;

/// Why a bearer token could not be obtained
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint returned status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("token response could not be decoded: {0}")]
    TokenParse(#[from] serde_json::Error),

    #[error("token response carried an empty access_token")]
    EmptyToken,

    #[error("token request failed: {0}")]
    Transport(String),

    /// An earlier request since the last invalidation failed
    #[error("no token available, earlier request failed: {0}")]
    Unavailable(String),
}
