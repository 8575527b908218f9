use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Callback validation. These never reach the network.
    #[error("Authorization failed: missing code")]
    MissingCode,

    #[error("Authorization failed: state mismatch")]
    StateMismatch,

    #[error("Authorization failed: missing PKCE verifier")]
    MissingVerifier,

    #[error("Authorization failed: provider returned {0}")]
    Provider(String),

    // Upstream responses
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Token response missing access_token")]
    MissingAccessToken,

    #[error("{context} failed: {status} {body}")]
    Upstream {
        context: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Refresh failed: {0}")]
    RefreshFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Account lookups
    #[error("User not found: {0}")]
    UnknownAccount(String),

    #[error("No refresh_token. Please /login again and approve offline.access scope.")]
    NoRefreshToken,

    // Persistence
    #[error("Token storage error: {0}")]
    TokenStorage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by the UI layer to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Protocol,
    Upstream,
    Data,
    Storage,
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Configuration(_) => ErrorKind::Configuration,
            AuthError::MissingCode
            | AuthError::StateMismatch
            | AuthError::MissingVerifier
            | AuthError::Provider(_) => ErrorKind::Protocol,
            AuthError::TokenExchange(_)
            | AuthError::MissingAccessToken
            | AuthError::Upstream { .. }
            | AuthError::RefreshFailed(_)
            | AuthError::Http(_) => ErrorKind::Upstream,
            AuthError::UnknownAccount(_) | AuthError::NoRefreshToken => ErrorKind::Data,
            AuthError::TokenStorage(_) | AuthError::Json(_) => ErrorKind::Storage,
        }
    }
}
