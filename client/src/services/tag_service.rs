use crate::api::ApiClient;
use crate::errors::{ApiResult, validation_errors_to_api_error};
use crate::models::{Tag, TagPayload};
use crate::services::{degrade, deleted};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

pub struct TagService {
    client: Arc<ApiClient>,
}

impl TagService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// All tags; empty when the call fails.
    pub async fn get_tags(&self) -> Vec<Tag> {
        debug!("Fetching tags");
        degrade("Fetching tags", self.client.get::<Vec<Tag>>("/tags").await)
    }

    pub async fn get_tag(&self, tag_id: i64) -> ApiResult<Option<Tag>> {
        let response = self.client.get::<Tag>(&format!("/tags/{}", tag_id)).await?;
        Ok(response.data)
    }

    pub async fn create_tag(&self, payload: &TagPayload) -> ApiResult<Option<Tag>> {
        payload.validate().map_err(validation_errors_to_api_error)?;

        debug!("Creating tag {}", payload.name);
        let response = self.client.post::<Tag, _>("/tags", payload).await?;
        Ok(response.data)
    }

    pub async fn update_tag(&self, tag_id: i64, payload: &TagPayload) -> ApiResult<Option<Tag>> {
        payload.validate().map_err(validation_errors_to_api_error)?;

        debug!("Updating tag {}", tag_id);
        let response = self
            .client
            .put::<Tag, _>(&format!("/tags/{}", tag_id), payload)
            .await?;
        Ok(response.data)
    }

    pub async fn delete_tag(&self, tag_id: i64) -> ApiResult<bool> {
        debug!("Deleting tag {}", tag_id);
        deleted(self.client.delete::<Value>(&format!("/tags/{}", tag_id)).await)
    }
}
