//! Notification inbox operations.

use crate::api::ApiClient;
use crate::errors::{ApiResult, validation_errors_to_api_error};
use crate::models::{Notification, NotificationPayload};
use crate::services::degrade;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

pub struct NotificationService {
    client: Arc<ApiClient>,
}

impl NotificationService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn get_notifications(&self) -> Vec<Notification> {
        debug!("Fetching notifications");
        degrade(
            "Fetching notifications",
            self.client.get::<Vec<Notification>>("/notifications").await,
        )
    }

    pub async fn get_unread_notifications(&self) -> Vec<Notification> {
        degrade(
            "Fetching unread notifications",
            self.client
                .get::<Vec<Notification>>("/notifications/unread")
                .await,
        )
    }

    /// Number of unread notifications, 0 when the call fails.
    pub async fn get_unread_count(&self) -> usize {
        self.get_unread_notifications().await.len()
    }

    pub async fn get_notification(&self, notification_id: i64) -> ApiResult<Option<Notification>> {
        let response = self
            .client
            .get::<Notification>(&format!("/notifications/{}", notification_id))
            .await?;
        Ok(response.data)
    }

    pub async fn get_notifications_by_task(&self, task_id: i64) -> ApiResult<Vec<Notification>> {
        let response = self
            .client
            .get::<Vec<Notification>>(&format!("/notifications/task/{}", task_id))
            .await?;
        Ok(response.data.unwrap_or_default())
    }

    /// Notifications created during the last `days` days.
    pub async fn get_recent_notifications(&self, days: u32) -> ApiResult<Vec<Notification>> {
        let response = self
            .client
            .get::<Vec<Notification>>(&format!("/notifications/recent/{}", days))
            .await?;
        Ok(response.data.unwrap_or_default())
    }

    pub async fn create_notification(
        &self,
        payload: &NotificationPayload,
    ) -> ApiResult<Option<Notification>> {
        payload.validate().map_err(validation_errors_to_api_error)?;

        let response = self
            .client
            .post::<Notification, _>("/notifications", payload)
            .await?;
        Ok(response.data)
    }

    pub async fn mark_as_read(&self, notification_id: i64) -> ApiResult<Option<Notification>> {
        debug!("Marking notification {} as read", notification_id);
        let response = self
            .client
            .patch_empty::<Notification>(&format!("/notifications/{}/read", notification_id))
            .await?;
        Ok(response.data)
    }

    pub async fn mark_all_as_read(&self) -> ApiResult<()> {
        debug!("Marking all notifications as read");
        self.client
            .patch_empty::<Value>("/notifications/read-all")
            .await?;
        Ok(())
    }

    pub async fn delete_notification(&self, notification_id: i64) -> ApiResult<()> {
        debug!("Deleting notification {}", notification_id);
        self.client
            .delete::<Value>(&format!("/notifications/{}", notification_id))
            .await?;
        Ok(())
    }

    pub async fn delete_all_notifications(&self) -> ApiResult<()> {
        debug!("Deleting all notifications");
        self.client.delete::<Value>("/notifications").await?;
        Ok(())
    }

    /// Asks the backend to create deadline notifications for tasks due soon.
    pub async fn check_deadlines(&self) -> ApiResult<String> {
        let response = self
            .client
            .post_empty::<Value>("/notifications/check-deadlines")
            .await?;
        info!("Deadline check requested: {}", response.message);
        Ok(response.message)
    }
}
