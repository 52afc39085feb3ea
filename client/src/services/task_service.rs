//! Task business operations.
//!
//! List queries degrade to an empty list or page so a failing backend
//! leaves views empty instead of broken. Single-task reads and every
//! mutation propagate their errors.

use crate::api::common::{Page, PageRequest};
use crate::api::ApiClient;
use crate::errors::{ApiError, ApiResult, validation_errors_to_api_error};
use crate::models::{Task, TaskFilter, TaskPayload, TaskPriority, TaskStatus};
use crate::services::{degrade, deleted};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};
use validator::Validate;

pub struct TaskService {
    client: Arc<ApiClient>,
}

impl TaskService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Tasks matching `filter`.
    pub async fn get_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        debug!("Fetching tasks with {:?}", filter);
        degrade(
            "Fetching tasks",
            self.client
                .get_query::<Vec<Task>>("/tasks", filter.to_query())
                .await,
        )
    }

    pub async fn get_tasks_paged(&self, page_request: &PageRequest) -> Page<Task> {
        debug!("Fetching task page {}", page_request.page);
        self.paged("/tasks/paged", page_request).await
    }

    pub async fn get_all_tasks(&self) -> Vec<Task> {
        debug!("Fetching all tasks");
        degrade("Fetching all tasks", self.client.get::<Vec<Task>>("/tasks").await)
    }

    pub async fn get_task(&self, task_id: i64) -> ApiResult<Option<Task>> {
        let response = self.client.get::<Task>(&format!("/tasks/{}", task_id)).await?;
        Ok(response.data)
    }

    pub async fn get_tasks_by_project(&self, project_id: i64) -> Vec<Task> {
        debug!("Fetching tasks of project {}", project_id);
        degrade(
            "Fetching project tasks",
            self.client
                .get::<Vec<Task>>(&format!("/tasks/project/{}", project_id))
                .await,
        )
    }

    pub async fn get_tasks_by_project_paged(
        &self,
        project_id: i64,
        page_request: &PageRequest,
    ) -> Page<Task> {
        debug!(
            "Fetching task page {} of project {}",
            page_request.page, project_id
        );
        self.paged(&format!("/tasks/project/{}/paged", project_id), page_request)
            .await
    }

    pub async fn get_tasks_by_status(&self, status: TaskStatus) -> Vec<Task> {
        degrade(
            "Fetching tasks by status",
            self.client
                .get::<Vec<Task>>(&format!("/tasks/status/{}", status))
                .await,
        )
    }

    pub async fn get_tasks_by_priority(&self, priority: TaskPriority) -> Vec<Task> {
        degrade(
            "Fetching tasks by priority",
            self.client
                .get::<Vec<Task>>(&format!("/tasks/priority/{}", priority))
                .await,
        )
    }

    /// Open tasks due within the next `days` days.
    pub async fn get_tasks_due_within(&self, days: u32) -> Vec<Task> {
        degrade(
            "Fetching tasks due soon",
            self.client
                .get::<Vec<Task>>(&format!("/tasks/due-within/{}", days))
                .await,
        )
    }

    pub async fn create_task(&self, payload: &TaskPayload) -> ApiResult<Option<Task>> {
        payload.validate().map_err(validation_errors_to_api_error)?;

        debug!("Creating task {}", payload.title);
        let response = self.client.post::<Task, _>("/tasks", payload).await?;
        Ok(response.data)
    }

    pub async fn update_task(&self, task_id: i64, payload: &TaskPayload) -> ApiResult<Option<Task>> {
        payload.validate().map_err(validation_errors_to_api_error)?;

        debug!("Updating task {}", task_id);
        let response = self
            .client
            .put::<Task, _>(&format!("/tasks/{}", task_id), payload)
            .await?;
        Ok(response.data)
    }

    pub async fn update_task_status(
        &self,
        task_id: i64,
        status: TaskStatus,
    ) -> ApiResult<Option<Task>> {
        debug!("Setting task {} to {}", task_id, status);
        let response = self
            .client
            .patch::<Task, _>(
                &format!("/tasks/{}/status", task_id),
                &json!({ "status": status }),
            )
            .await?;
        Ok(response.data)
    }

    /// Sets the completion percentage, which must lie in `0..=100`.
    pub async fn update_task_progress(&self, task_id: i64, progress: i32) -> ApiResult<Option<Task>> {
        if !(0..=100).contains(&progress) {
            return Err(ApiError::validation("Progress must be between 0 and 100"));
        }

        debug!("Setting task {} progress to {}%", task_id, progress);
        let response = self
            .client
            .patch::<Task, _>(
                &format!("/tasks/{}/progress", task_id),
                &json!({ "progress": progress }),
            )
            .await?;
        Ok(response.data)
    }

    /// Deletes a task. `Ok(false)` when the backend refused the deletion.
    pub async fn delete_task(&self, task_id: i64) -> ApiResult<bool> {
        debug!("Deleting task {}", task_id);
        deleted(self.client.delete::<Value>(&format!("/tasks/{}", task_id)).await)
    }

    pub async fn add_tag_to_task(&self, task_id: i64, tag_id: i64) -> ApiResult<Option<Task>> {
        let response = self
            .client
            .post_empty::<Task>(&format!("/tasks/{}/tags/{}", task_id, tag_id))
            .await?;
        Ok(response.data)
    }

    pub async fn remove_tag_from_task(&self, task_id: i64, tag_id: i64) -> ApiResult<Option<Task>> {
        let response = self
            .client
            .delete::<Task>(&format!("/tasks/{}/tags/{}", task_id, tag_id))
            .await?;
        Ok(response.data)
    }

    async fn paged(&self, path: &str, page_request: &PageRequest) -> Page<Task> {
        match self
            .client
            .get_query::<Page<Task>>(path, page_request.to_query())
            .await
        {
            Ok(response) => response
                .data
                .unwrap_or_else(|| page_request.empty_page()),
            Err(e) => {
                warn!("Fetching {} failed, showing empty page: {}", path, e);
                page_request.empty_page()
            }
        }
    }
}
