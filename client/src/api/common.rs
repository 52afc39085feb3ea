//! Response envelope handling shared by every API call.
//!
//! The backend answers either with a `{success, message, data}` envelope or
//! with a bare payload. Both are normalised into [`ApiResponse`] here, so
//! downstream services always read `response.data`. Includes:
//! - Envelope normalisation for success responses
//! - Status code to [`ApiError`] classification for failures
//! - Pagination request and page types for list endpoints
//!
//! # Normalisation Rules
//! 1. A JSON object with a `success` key is an envelope and is parsed as is
//! 2. Anything else (object, array, scalar, empty body) is wrapped as
//!    `{success: true, message: "OK", data: <payload>}`
//! 3. An envelope with `success: false` becomes [`ApiError::Business`]

use crate::errors::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Message synthesised for wrapped bare payloads.
pub const WRAPPED_MESSAGE: &str = "OK";

/// Standard response wrapper every service reads from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Response data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Machine-readable error code (present on failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Field-specific validation errors when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<BTreeMap<String, String>>,
    /// Pagination metadata (present for paginated responses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
}

/// Pagination metadata attached to some envelopes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
}

/// One page of a paginated list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub size: u32,
    /// Zero-based page index
    #[serde(default)]
    pub number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Pagination parameters for paged endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (0-indexed)
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub direction: SortDirection,
}

/// Error body the backend sends with non-2xx statuses
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub validation_errors: Option<BTreeMap<String, String>>,
}

// ============================================================================
// Implementation Details
// ============================================================================

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error_code: None,
            validation_errors: None,
            page_info: None,
        }
    }

    /// Wrap a bare payload with the default message
    pub fn wrap(data: T) -> Self {
        Self::success(data, WRAPPED_MESSAGE)
    }
}

impl ApiResponse<Value> {
    /// Normalises a decoded response body into an envelope.
    pub fn from_body(body: Value) -> ApiResult<Self> {
        let is_envelope = body
            .as_object()
            .map(|object| object.contains_key("success"))
            .unwrap_or(false);

        if is_envelope {
            serde_json::from_value(body).map_err(|e| {
                ApiError::invalid_response(format!("Malformed response envelope: {}", e))
            })
        } else {
            Ok(Self::wrap(body))
        }
    }

    /// Normalises a raw response text; an empty body is a `null` payload.
    pub fn from_text(text: &str) -> ApiResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::wrap(Value::Null));
        }

        let body: Value = serde_json::from_str(text)
            .map_err(|e| ApiError::invalid_response(format!("Response is not JSON: {}", e)))?;
        Self::from_body(body)
    }

    /// Converts a `success: false` envelope into a rejected outcome.
    pub fn into_result(self) -> ApiResult<Self> {
        if self.success {
            return Ok(self);
        }

        let message = if self.message.is_empty() {
            "Unknown error".to_string()
        } else {
            self.message
        };
        Err(ApiError::business(message, self.error_code))
    }

    /// Deserialises the payload into the caller's type. `null` becomes `None`.
    pub fn into_typed<T: DeserializeOwned>(self) -> ApiResult<ApiResponse<T>> {
        let data = match self.data {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value(value).map_err(|e| {
                ApiError::invalid_response(format!("Unexpected response payload: {}", e))
            })?),
        };

        Ok(ApiResponse {
            success: self.success,
            message: self.message,
            data,
            error_code: self.error_code,
            validation_errors: self.validation_errors,
            page_info: self.page_info,
        })
    }
}

impl<T> Page<T> {
    /// An empty page for the requested position.
    pub fn empty(page: u32, size: u32) -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            size,
            number: page,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sorted_by(mut self, sort_by: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = sort_by.into();
        self.direction = direction;
        self
    }

    /// Query parameters understood by the paged endpoints.
    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
            ("sortBy".to_string(), self.sort_by.clone()),
            (
                "direction".to_string(),
                match self.direction {
                    SortDirection::Asc => "asc".to_string(),
                    SortDirection::Desc => "desc".to_string(),
                },
            ),
        ]
    }

    pub fn empty_page<T>(&self) -> Page<T> {
        Page::empty(self.page, self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort_by: "dueDate".to_string(),
            direction: SortDirection::Asc,
        }
    }
}

/// Converts a non-2xx status and its body into the matching [`ApiError`].
pub fn classify_failure(status: u16, body: &str) -> ApiError {
    let error_body: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = error_body.message.clone().filter(|m| !m.is_empty());

    match status {
        400 if error_body.validation_errors.is_some() => ApiError::Validation {
            message: message.unwrap_or_else(|| "Validation failed".to_string()),
            field_errors: error_body.validation_errors.unwrap_or_default(),
        },
        401 => ApiError::unauthorized(message.unwrap_or_else(|| "Authentication required".to_string())),
        403 => ApiError::Forbidden {
            message: message.unwrap_or_else(|| "Forbidden".to_string()),
        },
        404 => ApiError::NotFound {
            message: message.unwrap_or_else(|| "Not found".to_string()),
        },
        500..=599 => ApiError::Server {
            status,
            message: message.unwrap_or_else(|| "Internal server error".to_string()),
        },
        _ => ApiError::Http {
            status,
            message: message.unwrap_or_else(|| format!("Request failed with status {}", status)),
        },
    }
}
