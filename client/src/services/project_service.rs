//! Project business operations.

use crate::api::ApiClient;
use crate::errors::{ApiResult, validation_errors_to_api_error};
use crate::models::{Project, ProjectPayload};
use crate::services::deleted;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

/// Service layer for project operations.
pub struct ProjectService {
    client: Arc<ApiClient>,
}

impl ProjectService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Lists the projects of the current user.
    ///
    /// # Errors
    /// Propagates transport and HTTP failures; a missing payload is an empty list.
    pub async fn get_projects(&self) -> ApiResult<Vec<Project>> {
        debug!("Fetching projects");
        let response = self.client.get::<Vec<Project>>("/projects").await?;
        Ok(response.data.unwrap_or_default())
    }

    pub async fn get_project(&self, project_id: i64) -> ApiResult<Option<Project>> {
        debug!("Fetching project {}", project_id);
        let response = self
            .client
            .get::<Project>(&format!("/projects/{}", project_id))
            .await?;
        Ok(response.data)
    }

    /// Creates a project.
    ///
    /// # Arguments
    /// * `payload` - Name and optional description of the new project
    ///
    /// # Errors
    /// Returns `ApiError::Validation` before any call when the payload is invalid.
    pub async fn create_project(&self, payload: &ProjectPayload) -> ApiResult<Option<Project>> {
        payload.validate().map_err(validation_errors_to_api_error)?;

        debug!("Creating project {}", payload.name);
        let response = self.client.post::<Project, _>("/projects", payload).await?;
        Ok(response.data)
    }

    pub async fn update_project(
        &self,
        project_id: i64,
        payload: &ProjectPayload,
    ) -> ApiResult<Option<Project>> {
        payload.validate().map_err(validation_errors_to_api_error)?;

        debug!("Updating project {}", project_id);
        let response = self
            .client
            .put::<Project, _>(&format!("/projects/{}", project_id), payload)
            .await?;
        Ok(response.data)
    }

    /// Deletes a project. `Ok(false)` when the backend refused the deletion.
    pub async fn delete_project(&self, project_id: i64) -> ApiResult<bool> {
        debug!("Deleting project {}", project_id);
        deleted(
            self.client
                .delete::<Value>(&format!("/projects/{}", project_id))
                .await,
        )
    }

    pub async fn get_projects_by_status(&self, status: &str) -> ApiResult<Vec<Project>> {
        debug!("Fetching projects with status {}", status);
        let response = self
            .client
            .get::<Vec<Project>>(&format!("/projects/status/{}", status))
            .await?;
        Ok(response.data.unwrap_or_default())
    }
}
