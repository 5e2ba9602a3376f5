use crate::domain::{CommentId, Project, ProjectId, SubmissionId, SubmissionStatus, TaskId};

/// What changed in the store. Sent after the snapshot has been persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ProjectCreated(ProjectId),
    ProjectUpdated(ProjectId),
    ProjectDeleted(ProjectId),
    ProgressSynced { project_id: ProjectId, progress: u8 },
    TaskAdded { project_id: ProjectId, task_id: TaskId },
    TaskUpdated { project_id: ProjectId, task_id: TaskId },
    TaskDeleted { project_id: ProjectId, task_id: TaskId },
    CommentAdded { project_id: ProjectId, task_id: TaskId, comment_id: CommentId },
    ProjectSubmitted { project_id: ProjectId, submission_id: SubmissionId },
    SubmissionReviewed {
        project_id: ProjectId,
        submission_id: SubmissionId,
        status: SubmissionStatus,
    },
}

impl StoreEvent {
    pub fn project_id(&self) -> &ProjectId {
        match self {
            StoreEvent::ProjectCreated(id)
            | StoreEvent::ProjectUpdated(id)
            | StoreEvent::ProjectDeleted(id) => id,
            StoreEvent::ProgressSynced { project_id, .. }
            | StoreEvent::TaskAdded { project_id, .. }
            | StoreEvent::TaskUpdated { project_id, .. }
            | StoreEvent::TaskDeleted { project_id, .. }
            | StoreEvent::CommentAdded { project_id, .. }
            | StoreEvent::ProjectSubmitted { project_id, .. }
            | StoreEvent::SubmissionReviewed { project_id, .. } => project_id,
        }
    }
}

/// Receives every committed change together with the latest snapshot.
pub trait StoreObserver {
    fn on_change(&self, event: &StoreEvent, projects: &[Project]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);
