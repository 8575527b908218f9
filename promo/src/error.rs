use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use paapi::PaapiError;
use promo_auth::{AuthError, ErrorKind};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Data(String),

    #[error("{0}")]
    Protocol(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "ok": false,
            "error": self.to_string(),
        }));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

impl From<PaapiError> for AppError {
    fn from(err: PaapiError) -> Self {
        match err {
            PaapiError::MissingCredentials(_) => AppError::Configuration(err.to_string()),
            PaapiError::EmptyItemId => AppError::Data(err.to_string()),
            _ => AppError::Upstream(err.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Configuration => AppError::Configuration(message),
            ErrorKind::Protocol => AppError::Protocol(message),
            ErrorKind::Upstream => AppError::Upstream(message),
            ErrorKind::Data => AppError::Data(message),
            ErrorKind::Storage => AppError::Internal(message),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(format!("Configuration error: {}", err))
    }
}
