use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaapiError {
    #[error(
        "Amazon API credentials missing. Set AMAZON access_key / secret_key / partner_tag ({0} is empty)"
    )]
    MissingCredentials(&'static str),

    #[error("ASIN is required")]
    EmptyItemId,

    #[error("Amazon API error {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("No item returned for ASIN {0}")]
    NoItems(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed Amazon API response: {0}")]
    Json(#[from] serde_json::Error),
}

impl PaapiError {
    /// True when the call was rejected before anything was sent over the network.
    pub fn is_configuration(&self) -> bool {
        matches!(self, PaapiError::MissingCredentials(_))
    }
}
