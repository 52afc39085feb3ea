//! Wire representations of the backend's projects, tasks, tags and
//! notifications.
//!
//! All types use camelCase JSON and ISO-8601 local date-times. Payload
//! structs carry `validator` rules so malformed input is rejected locally.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DueStatus {
    Normal,
    DueSoon,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    DeadlineApproaching,
    DeadlineOverdue,
    TaskAssigned,
    TaskCompleted,
    PriorityChanged,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
            TaskPriority::Urgent => "URGENT",
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "NOT_STARTED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::OnHold => "ON_HOLD",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub tasks: Vec<TaskSummary>,
}

/// Task as listed inside a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub progress: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Project name must be between 1-100 characters"
    ))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub progress: Option<i32>,
    #[serde(default)]
    pub due_status: Option<DueStatus>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == Some(TaskStatus::Completed)
    }
}

/// Body of task creation and update calls
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Task title must be between 1-200 characters"
    ))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

/// Query filter for the task list endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub project_id: Option<i64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(project_id) = self.project_id {
            query.push(("projectId".to_string(), project_id.to_string()));
        }
        if let Some(status) = self.status {
            query.push(("status".to_string(), status.to_string()));
        }
        if let Some(priority) = self.priority {
            query.push(("priority".to_string(), priority.to_string()));
        }
        query
    }
}

/// Suggested working order for open tasks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedTaskPlan {
    #[serde(default)]
    pub optimized_tasks: Vec<Task>,
    #[serde(default)]
    pub explanation: String,
}

// ============================================================================
// Tags
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TagPayload {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Tag name must be between 1-50 characters"
    ))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub message: String,
    #[serde(rename = "type", default)]
    pub notification_type: Option<NotificationType>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub notify_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub expire_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub task_id: Option<i64>,
    #[serde(default)]
    pub task_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[validate(length(min = 1, message = "Notification message is required"))]
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_from_backend_json() {
        let task: Task = serde_json::from_value(json!({
            "id": 7,
            "title": "Write report",
            "dueDate": "2024-05-01T17:00:00",
            "priority": "URGENT",
            "status": "IN_PROGRESS",
            "progress": 40,
            "dueStatus": "DUE_SOON",
            "projectId": 2,
            "tags": [{"id": 1, "name": "work", "color": "#ff0000"}]
        }))
        .unwrap();

        assert_eq!(task.priority, Some(TaskPriority::Urgent));
        assert_eq!(task.due_status, Some(DueStatus::DueSoon));
        assert_eq!(task.tags[0].name, "work");
        assert!(!task.is_completed());
        assert_eq!(
            task.due_date.unwrap().to_string(),
            "2024-05-01 17:00:00"
        );
    }

    #[test]
    fn test_task_payload_progress_range() {
        let payload = TaskPayload {
            title: "Write report".into(),
            progress: Some(120),
            ..TaskPayload::default()
        };
        assert!(payload.validate().is_err());

        let payload = TaskPayload {
            progress: Some(100),
            ..payload
        };
        assert!(payload.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"title": "Write report", "progress": 100, "tagIds": []})
        );
    }

    #[test]
    fn test_filter_query() {
        let filter = TaskFilter {
            project_id: Some(3),
            status: Some(TaskStatus::OnHold),
            priority: None,
        };
        assert_eq!(
            filter.to_query(),
            vec![
                ("projectId".to_string(), "3".to_string()),
                ("status".to_string(), "ON_HOLD".to_string()),
            ]
        );
    }

    #[test]
    fn test_notification_type_field() {
        let notification: Notification = serde_json::from_value(json!({
            "id": 1,
            "message": "Task due tomorrow",
            "type": "DEADLINE_APPROACHING",
            "read": false
        }))
        .unwrap();
        assert_eq!(
            notification.notification_type,
            Some(NotificationType::DeadlineApproaching)
        );
    }
}
