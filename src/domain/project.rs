use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{DomainError, DomainResult, Submission, SubmissionId, Task, TaskId, TaskStatus, UserId};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        ProjectId(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        ProjectId(s.to_string())
    }
}

/// `active → submitted → completed`. Nothing guards other transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Submitted,
    Completed,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "active"),
            ProjectStatus::Submitted => write!(f, "submitted"),
            ProjectStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProjectStatus::Active),
            "submitted" => Ok(ProjectStatus::Submitted),
            "completed" => Ok(ProjectStatus::Completed),
            other => Err(DomainError::InvalidValue {
                field: "project status",
                value: other.to_string(),
            }),
        }
    }
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_due_date(raw: &str) -> DomainResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| DomainError::InvalidDate(raw.to_string()))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date(&raw).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "deserialize_due_date")]
    pub due_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub assigned_students: Vec<UserId>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
    /// Cached percentage, refreshed by an explicit progress sync.
    #[serde(default)]
    pub progress: u8,
}

impl Project {
    pub fn done_task_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_done()).count()
    }

    /// Share of done tasks as a rounded percentage; 0 when there are no tasks.
    pub fn computed_progress(&self) -> u8 {
        if self.tasks.is_empty() {
            return 0;
        }
        let ratio = self.done_task_count() as f64 / self.tasks.len() as f64;
        (ratio * 100.0).round() as u8
    }

    /// Business rule: an active project past its due date is overdue
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && self.status == ProjectStatus::Active
    }

    /// Whole days left until the due date, rounded up; negative once past due.
    pub fn days_remaining_at(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.due_date - now).num_milliseconds() as f64;
        (millis / MILLIS_PER_DAY).ceil() as i64
    }

    pub fn is_assigned_to(&self, user_id: &UserId) -> bool {
        self.assigned_students.contains(user_id)
    }

    pub fn tasks_by_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|task| task.status == status).collect()
    }

    pub fn task(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| &task.id == task_id)
    }

    pub fn submission_mut(&mut self, submission_id: &SubmissionId) -> Option<&mut Submission> {
        self.submissions
            .iter_mut()
            .find(|submission| &submission.id == submission_id)
    }

    /// Shallow merge: only the fields set on `update` change.
    pub fn apply(&mut self, update: ProjectUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(assigned_students) = update.assigned_students {
            self.assigned_students = assigned_students;
        }
        if let Some(progress) = update.progress {
            self.progress = progress.min(100);
        }
    }
}

/// Teacher-supplied fields of a new project; the store stamps the rest.
#[derive(Debug, Clone)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub assigned_students: Vec<UserId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<ProjectStatus>,
    pub assigned_students: Option<Vec<UserId>>,
    pub progress: Option<u8>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskPriority;
    use chrono::TimeZone;

    fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.into(),
            title: format!("task {id}"),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            assigned_to: None,
            created_at: Utc::now(),
            comments: Vec::new(),
        }
    }

    fn project(due_date: DateTime<Utc>) -> Project {
        Project {
            id: "p1".into(),
            title: "Water quality study".to_string(),
            description: "Sample the river".to_string(),
            due_date,
            created_by: Some("t1".into()),
            created_at: Utc::now(),
            status: ProjectStatus::Active,
            assigned_students: vec!["s1".into(), "s2".into()],
            tasks: Vec::new(),
            submissions: Vec::new(),
            progress: 0,
        }
    }

    #[test]
    fn test_computed_progress_rounds() {
        let mut p = project(Utc::now());
        assert_eq!(p.computed_progress(), 0);

        p.tasks = vec![
            task("1", TaskStatus::Done),
            task("2", TaskStatus::Todo),
            task("3", TaskStatus::InProgress),
        ];
        assert_eq!(p.computed_progress(), 33);

        p.tasks[1].status = TaskStatus::Done;
        assert_eq!(p.computed_progress(), 67);
    }

    #[test]
    fn test_overdue_only_while_active() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut p = project(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert!(p.is_overdue_at(now));

        p.status = ProjectStatus::Submitted;
        assert!(!p.is_overdue_at(now));
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let p = project(Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap());
        assert_eq!(p.days_remaining_at(now), 2);
    }

    #[test]
    fn test_parse_due_date_accepts_plain_dates() {
        let parsed = parse_due_date("2024-05-01").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        let parsed = parse_due_date("2024-05-01T08:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap());

        assert!(matches!(
            parse_due_date("next friday"),
            Err(DomainError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_apply_is_shallow() {
        let mut p = project(Utc::now());
        p.apply(ProjectUpdate {
            status: Some(ProjectStatus::Completed),
            progress: Some(150),
            ..Default::default()
        });

        assert_eq!(p.status, ProjectStatus::Completed);
        assert_eq!(p.progress, 100);
        assert_eq!(p.title, "Water quality study");
        assert_eq!(p.assigned_students.len(), 2);
    }

    #[test]
    fn test_loads_browser_shaped_json() {
        let json = r#"{
            "id": "1717000000000",
            "title": "Robotics",
            "description": "Line follower",
            "dueDate": "2024-06-30",
            "createdBy": "t1",
            "createdAt": "2024-05-01T09:00:00.000Z",
            "status": "active",
            "assignedStudents": ["s1"],
            "tasks": [{
                "id": "1717000000001",
                "title": "Buy sensors",
                "description": "",
                "status": "in-progress",
                "priority": "high",
                "assignedTo": "s1",
                "createdAt": "2024-05-02T09:00:00.000Z",
                "comments": []
            }],
            "submissions": [],
            "progress": 0
        }"#;

        let p: Project = serde_json::from_str(json).unwrap();
        assert_eq!(p.tasks_by_status(TaskStatus::InProgress).len(), 1);
        assert!(p.is_assigned_to(&"s1".into()));
        assert_eq!(p.due_date, Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap());
    }
}
