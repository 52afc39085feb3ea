use crate::api::ApiClient;
use crate::models::OptimizedTaskPlan;
use std::sync::Arc;
use tracing::{debug, warn};

pub const ASSISTANT_UNAVAILABLE_MESSAGE: &str = "Unable to load suggestions. Please try again later.";

/// Client of the task-ordering assistant endpoint.
pub struct AssistantService {
    client: Arc<ApiClient>,
}

impl AssistantService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Suggested order for the open tasks. The endpoint answers with a bare
    /// `{optimizedTasks, explanation}` object; failures yield an empty plan
    /// whose explanation says suggestions are unavailable.
    pub async fn get_optimized_task_order(&self) -> OptimizedTaskPlan {
        debug!("Fetching optimized task order");
        match self
            .client
            .get::<OptimizedTaskPlan>("/ai-assistant/optimize-tasks")
            .await
        {
            Ok(response) => response.data.unwrap_or_default(),
            Err(e) => {
                warn!("Fetching optimized task order failed: {}", e);
                OptimizedTaskPlan {
                    optimized_tasks: Vec::new(),
                    explanation: ASSISTANT_UNAVAILABLE_MESSAGE.to_string(),
                }
            }
        }
    }
}
