use crate::domain::{DomainError, ProjectId, SubmissionId, TaskId};
use crate::ports::{ConfigError, StorageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Stored projects could not be read: {0}")]
    CorruptSnapshot(String),

    #[error("Failed to serialize projects: {0}")]
    Serialization(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Task {task_id} not found in project {project_id}")]
    TaskNotFound { project_id: ProjectId, task_id: TaskId },

    #[error("Submission {submission_id} not found in project {project_id}")]
    SubmissionNotFound {
        project_id: ProjectId,
        submission_id: SubmissionId,
    },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Application error: {0}")]
    Application(String),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::ProjectNotFound(_)
                | AppError::TaskNotFound { .. }
                | AppError::SubmissionNotFound { .. }
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
