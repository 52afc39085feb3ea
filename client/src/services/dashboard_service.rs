//! Dashboard figures computed from the project and task lists.

use crate::api::ApiClient;
use crate::errors::ApiResult;
use crate::models::{DueStatus, Project, Task, TaskPriority, TaskStatus};
use crate::services::{ProjectService, TaskService};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Length of the short lists shown on the dashboard.
pub const DASHBOARD_LIST_LEN: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_projects: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Rounded share of completed tasks, 0 without tasks
    pub completion_percent: u32,
    /// Open tasks that are due soon or overdue
    pub upcoming_deadlines: usize,
    pub tasks_by_status: BTreeMap<String, usize>,
    pub recent_projects: Vec<Project>,
    pub upcoming_tasks: Vec<Task>,
    /// Open tasks to work on first
    pub focus_tasks: Vec<Task>,
}

pub struct DashboardService {
    projects: ProjectService,
    tasks: TaskService,
}

impl DashboardService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            projects: ProjectService::new(client.clone()),
            tasks: TaskService::new(client),
        }
    }

    /// Fetches projects and tasks concurrently and summarises them.
    pub async fn load_summary(&self) -> ApiResult<DashboardSummary> {
        let (projects, tasks) =
            futures::join!(self.projects.get_projects(), self.tasks.get_all_tasks());
        let projects = projects?;

        debug!(
            "Summarising {} project(s) and {} task(s)",
            projects.len(),
            tasks.len()
        );
        Ok(DashboardSummary::from_data(projects, tasks))
    }
}

impl DashboardSummary {
    pub fn from_data(projects: Vec<Project>, tasks: Vec<Task>) -> Self {
        let completed_tasks = tasks.iter().filter(|t| t.is_completed()).count();
        let completion_percent = if tasks.is_empty() {
            0
        } else {
            (completed_tasks as f64 * 100.0 / tasks.len() as f64).round() as u32
        };

        let mut tasks_by_status = BTreeMap::new();
        for task in &tasks {
            let status = task.status.map(|s| s.as_str()).unwrap_or("UNKNOWN");
            *tasks_by_status.entry(status.to_string()).or_insert(0) += 1;
        }

        let mut upcoming: Vec<Task> = tasks
            .iter()
            .filter(|t| is_pressing(t))
            .cloned()
            .collect();
        let upcoming_deadlines = upcoming.len();
        upcoming.sort_by(|a, b| compare_due_dates(a, b));
        upcoming.truncate(DASHBOARD_LIST_LEN);

        let mut focus: Vec<Task> = tasks
            .iter()
            .filter(|t| !t.is_completed() && t.due_date.is_some())
            .cloned()
            .collect();
        focus.sort_by(compare_urgency);
        focus.truncate(DASHBOARD_LIST_LEN);

        let total_projects = projects.len();
        let mut recent_projects = projects;
        recent_projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_projects.truncate(DASHBOARD_LIST_LEN);

        Self {
            total_projects,
            total_tasks: tasks.len(),
            completed_tasks,
            completion_percent,
            upcoming_deadlines,
            tasks_by_status,
            recent_projects,
            upcoming_tasks: upcoming,
            focus_tasks: focus,
        }
    }
}

fn is_pressing(task: &Task) -> bool {
    matches!(task.due_status, Some(DueStatus::DueSoon | DueStatus::Overdue))
        && task.status != Some(TaskStatus::Completed)
}

/// Earliest due date first; tasks without one go last.
fn compare_due_dates(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn due_rank(task: &Task) -> u8 {
    match task.due_status {
        Some(DueStatus::Overdue) => 0,
        Some(DueStatus::DueSoon) => 1,
        _ => 2,
    }
}

fn priority_rank(task: &Task) -> u8 {
    match task.priority {
        Some(TaskPriority::Urgent) => 0,
        Some(TaskPriority::High) => 1,
        Some(TaskPriority::Medium) => 2,
        Some(TaskPriority::Low) => 3,
        None => 4,
    }
}

/// Overdue before due soon, then higher priority, then earlier due date.
fn compare_urgency(a: &Task, b: &Task) -> Ordering {
    due_rank(a)
        .cmp(&due_rank(b))
        .then_with(|| priority_rank(a).cmp(&priority_rank(b)))
        .then_with(|| compare_due_dates(a, b))
}
