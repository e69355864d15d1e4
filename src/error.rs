use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::token_introspection::DecodeError;

#[derive(Error, Debug, Serialize, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serde JSON error: {0}")]
    SerdeError(String),

    #[error("HTTP client error: {0}")]
    HttpError(String),

    #[error("Keyring error: {0}")]
    KeyringError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Token decode error: {0}")]
    TokenDecodeError(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Too many attempts: {0}")]
    TooManyAttempts(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AppError {
    /// Stable machine-readable code, used by the CLI's JSON error output.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::IoError(_) => "IO_ERROR",
            Self::SerdeError(_) => "SERDE_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::KeyringError(_) => "KEYRING_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::NotFoundError(_) => "NOT_FOUND_ERROR",
            Self::AuthError(_) => "AUTH_ERROR",
            Self::TokenDecodeError(_) => "TOKEN_DECODE_ERROR",
            Self::SessionExpired(_) => "SESSION_EXPIRED",
            Self::AccessDenied(_) => "ACCESS_DENIED_ERROR",
            Self::TooManyAttempts(_) => "TOO_MANY_ATTEMPTS",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT_ERROR",
            Self::NetworkError(_) => "NETWORK_ERROR",
            Self::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            Self::InvalidResponse(_) => "INVALID_RESPONSE_ERROR",
            Self::StorageError(_) => "STORAGE_ERROR",
        }
    }

    /// Errors that mean the user has to sign in again.
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::AuthError(_) | Self::TokenDecodeError(_) | Self::SessionExpired(_)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::NetworkError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<keyring::Error> for AppError {
    fn from(err: keyring::Error) -> Self {
        Self::KeyringError(err.to_string())
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        Self::TokenDecodeError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("Invalid URL: {err}"))
    }
}

// Shape printed by the CLI when `--json` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<&AppError> for SerializableError {
    fn from(error: &AppError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
            details: error
                .requires_login()
                .then(|| "Sign in again with `indhive login`".to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AppError::AuthError("x".into()).code(), "AUTH_ERROR");
        assert_eq!(AppError::SessionExpired("x".into()).code(), "SESSION_EXPIRED");
        assert_eq!(AppError::AccessDenied("x".into()).code(), "ACCESS_DENIED_ERROR");
    }

    #[test]
    fn test_serializable_error_carries_login_hint() {
        let err = AppError::TokenDecodeError("bad segment".into());
        let serializable = SerializableError::from(&err);
        assert_eq!(serializable.code, "TOKEN_DECODE_ERROR");
        assert!(serializable.details.is_some());

        let err = AppError::NotFoundError("project 4".into());
        assert!(SerializableError::from(&err).details.is_none());
    }

    #[tokio::test]
    async fn test_request_errors_split_by_kind() {
        let malformed = reqwest::Client::new().get("not a url").send().await.unwrap_err();
        assert!(matches!(AppError::from(malformed), AppError::HttpError(_)));
    }

    #[test]
    fn test_decode_error_maps_to_login_required() {
        let err = AppError::from(DecodeError::SegmentCount(1));
        assert_eq!(err.code(), "TOKEN_DECODE_ERROR");
        assert!(err.requires_login());
    }
}
