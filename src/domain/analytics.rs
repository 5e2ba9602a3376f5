//! Aggregates shown on dashboards and the project analytics tab.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Project, ProjectStatus, TaskPriority, TaskStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusBreakdown {
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriorityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectAnalytics {
    pub total_tasks: usize,
    pub by_status: StatusBreakdown,
    pub by_priority: PriorityBreakdown,
    /// Percentage of done tasks, one decimal place.
    pub completion_rate: f64,
    pub progress: u8,
}

impl ProjectAnalytics {
    pub fn for_project(project: &Project) -> Self {
        let mut by_status = StatusBreakdown::default();
        let mut by_priority = PriorityBreakdown::default();

        for task in &project.tasks {
            match task.status {
                TaskStatus::Todo => by_status.todo += 1,
                TaskStatus::InProgress => by_status.in_progress += 1,
                TaskStatus::Done => by_status.done += 1,
            }
            match task.priority {
                TaskPriority::High => by_priority.high += 1,
                TaskPriority::Medium => by_priority.medium += 1,
                TaskPriority::Low => by_priority.low += 1,
            }
        }

        let total_tasks = project.tasks.len();
        let completion_rate = if total_tasks > 0 {
            let rate = by_status.done as f64 / total_tasks as f64 * 100.0;
            (rate * 10.0).round() / 10.0
        } else {
            0.0
        };

        Self {
            total_tasks,
            by_status,
            by_priority,
            completion_rate,
            progress: project.progress,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub active: usize,
    pub submitted: usize,
    pub completed: usize,
    pub submissions: usize,
    pub overdue: usize,
}

impl DashboardStats {
    pub fn collect<'a, I>(projects: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Project>,
    {
        projects
            .into_iter()
            .fold(DashboardStats::default(), |mut stats, project| {
                stats.total += 1;
                match project.status {
                    ProjectStatus::Active => stats.active += 1,
                    ProjectStatus::Submitted => stats.submitted += 1,
                    ProjectStatus::Completed => stats.completed += 1,
                }
                stats.submissions += project.submissions.len();
                if project.is_overdue_at(now) {
                    stats.overdue += 1;
                }
                stats
            })
    }
}
