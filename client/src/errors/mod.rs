//! Global client error types.
//!
//! Every failure a caller can observe is an [`ApiError`]. Transport and
//! protocol failures are classified here once, so domain services and the
//! binary only ever match on this enum.

use std::collections::BTreeMap;
use thiserror::Error;

/// Message shown when the session can not be recovered.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action";
pub const NOT_FOUND_MESSAGE: &str = "Resource not found";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to reach the server. Please check your network connection.";

/// Errors surfaced by the API client and the domain services.
///
/// Variants only carry owned strings so the same error can be handed to
/// every request waiting on a failed token refresh.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The access token could not be refreshed; the session has been cleared.
    #[error("Session expired: {message}")]
    SessionExpired { message: String },

    /// 401 that was not (or could no longer be) recovered by a refresh.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// 400 carrying field-level errors from the backend.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    /// No response was received (connect failure, timeout).
    #[error("Network error: {message}")]
    Network { message: String },

    /// `success: false` envelope delivered with a 2xx status.
    #[error("{message}")]
    Business {
        message: String,
        error_code: Option<String>,
    },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    // Helper constructors for common patterns

    pub fn session_expired() -> Self {
        Self::SessionExpired {
            message: SESSION_EXPIRED_MESSAGE.to_string(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn business(message: impl Into<String>, error_code: Option<String>) -> Self {
        Self::Business {
            message: message.into(),
            error_code,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status this error was derived from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Validation { .. } => Some(400),
            ApiError::Server { status, .. } | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Business-rule rejections are left to the caller to render inline;
    /// everything else is reported centrally by the client.
    pub fn is_business(&self) -> bool {
        matches!(self, ApiError::Business { .. })
    }

    /// Text suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::SessionExpired { .. } => SESSION_EXPIRED_MESSAGE.to_string(),
            ApiError::Forbidden { .. } => FORBIDDEN_MESSAGE.to_string(),
            ApiError::NotFound { .. } => NOT_FOUND_MESSAGE.to_string(),
            ApiError::Server { .. } => SERVER_ERROR_MESSAGE.to_string(),
            ApiError::Network { .. } => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Validation {
                message,
                field_errors,
            } => {
                if field_errors.is_empty() {
                    message.clone()
                } else {
                    let details: Vec<String> = field_errors
                        .iter()
                        .map(|(field, error)| format!("{}: {}", field, error))
                        .collect();
                    format!("{} ({})", message, details.join(", "))
                }
            }
            ApiError::Unauthorized { message }
            | ApiError::Business { message, .. }
            | ApiError::Http { message, .. }
            | ApiError::InvalidResponse { message }
            | ApiError::Storage { message }
            | ApiError::Config { message }
            | ApiError::Internal { message } => message.clone(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::invalid_response(error.to_string())
    }
}

/// Flattens `validator` errors into a single message, sorted by field name.
pub fn validation_errors_to_api_error(errors: validator::ValidationErrors) -> ApiError {
    let field_errors: BTreeMap<String, String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let message = errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string())
                })
                .collect::<Vec<_>>()
                .join(", ");
            (field.to_string(), message)
        })
        .collect();

    ApiError::Validation {
        message: "Validation failed".to_string(),
        field_errors,
    }
}
