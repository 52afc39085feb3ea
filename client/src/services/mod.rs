//! Domain services over the shared [`ApiClient`](crate::api::ApiClient).
//!
//! Each service issues exactly one REST call per operation and hands back
//! the envelope's payload. Read-only list fetches degrade to an empty value
//! when the call fails; everything else propagates the error.

pub mod assistant_service;
pub mod dashboard_service;
pub mod notification_service;
pub mod project_service;
pub mod tag_service;
pub mod task_service;

use crate::api::common::ApiResponse;
use crate::errors::{ApiError, ApiResult};
use serde_json::Value;
use tracing::warn;

pub use assistant_service::AssistantService;
pub use dashboard_service::{DashboardService, DashboardSummary};
pub use notification_service::NotificationService;
pub use project_service::ProjectService;
pub use tag_service::TagService;
pub use task_service::TaskService;

/// Unwraps a list-style payload, substituting the empty value on failure.
pub(crate) fn degrade<T: Default>(operation: &str, result: ApiResult<ApiResponse<T>>) -> T {
    match result {
        Ok(response) => response.data.unwrap_or_default(),
        Err(e) => {
            warn!("{} failed, showing empty result: {}", operation, e);
            T::default()
        }
    }
}

/// Reads a delete call: a business rejection means nothing was deleted,
/// transport and HTTP failures still propagate.
pub(crate) fn deleted(result: ApiResult<ApiResponse<Value>>) -> ApiResult<bool> {
    match result {
        Ok(response) => Ok(response.success),
        Err(ApiError::Business { message, .. }) => {
            warn!("Delete rejected: {}", message);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrade_substitutes_empty_value() {
        let failed: ApiResult<ApiResponse<Vec<i64>>> = Err(ApiError::network("down"));
        assert!(degrade("list", failed).is_empty());

        let missing: ApiResult<ApiResponse<Vec<i64>>> = Ok(ApiResponse {
            data: None,
            ..ApiResponse::wrap(Vec::new())
        });
        assert!(degrade("list", missing).is_empty());

        assert_eq!(degrade("list", Ok(ApiResponse::wrap(vec![1, 2]))), vec![1, 2]);
    }

    #[test]
    fn test_deleted_maps_business_rejection() {
        assert_eq!(deleted(Ok(ApiResponse::wrap(Value::Null))), Ok(true));
        assert_eq!(deleted(Err(ApiError::business("In use", None))), Ok(false));
        assert!(deleted(Err(ApiError::network("down"))).is_err());
    }
}
