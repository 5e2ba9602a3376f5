use chrono::Utc;

use super::{AppError, AppResult};
use crate::domain::*;
use crate::ports::{SnapshotStorage, StoreEvent, StoreObserver, SubscriptionId};

/// Owns every project and mirrors the whole collection to storage after
/// each change.
///
/// Mutations work on a copy of the collection: the copy is persisted first
/// and only then becomes the live state, so a failed write leaves the store
/// exactly as it was. Unknown ids fail with a not-found error before
/// anything is written.
///
/// Writers sharing one storage location follow last-writer-wins on the full
/// snapshot; nothing detects or merges concurrent edits.
pub struct ProjectStore {
    storage: Box<dyn SnapshotStorage>,
    projects: Vec<Project>,
    current_user: Option<User>,
    ids: IdGenerator,
    observers: Vec<(SubscriptionId, Box<dyn StoreObserver>)>,
    next_subscription: u64,
}

impl ProjectStore {
    /// Hydrate the store from whatever `storage` currently holds.
    pub fn open(storage: Box<dyn SnapshotStorage>) -> AppResult<Self> {
        let projects: Vec<Project> = match storage.read()? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .map_err(|e| AppError::CorruptSnapshot(e.to_string()))?,
            _ => Vec::new(),
        };

        let mut ids = IdGenerator::new();
        for project in &projects {
            ids.observe(&project.id.0);
            for task in &project.tasks {
                ids.observe(&task.id.0);
                for comment in &task.comments {
                    ids.observe(&comment.id.0);
                }
            }
            for submission in &project.submissions {
                ids.observe(&submission.id.0);
            }
        }

        tracing::debug!("Hydrated {} projects from storage", projects.len());

        Ok(Self {
            storage,
            projects,
            current_user: None,
            ids,
            observers: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn set_current_user(&mut self, user: Option<User>) {
        self.current_user = user;
    }

    pub fn subscribe(&mut self, observer: Box<dyn StoreObserver>) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, observer));
        id
    }

    #[allow(dead_code)] // The CLI keeps its observer for the whole run
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(subscription, _)| *subscription != id);
        self.observers.len() != before
    }

    pub fn create_project(&mut self, draft: ProjectDraft) -> AppResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: ProjectId(self.ids.next_at(now)),
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            created_by: self.current_user.as_ref().map(|user| user.id.clone()),
            created_at: now,
            status: ProjectStatus::Active,
            assigned_students: draft.assigned_students,
            tasks: Vec::new(),
            submissions: Vec::new(),
            progress: 0,
        };

        let mut next = self.projects.clone();
        next.push(project.clone());
        self.commit(next, StoreEvent::ProjectCreated(project.id.clone()))?;

        tracing::info!("Created project {} ({})", project.id, project.title);
        Ok(project)
    }

    pub fn update_project(&mut self, project_id: &ProjectId, update: ProjectUpdate) -> AppResult<()> {
        self.modify_project(project_id, |project| {
            project.apply(update);
            Ok(((), StoreEvent::ProjectUpdated(project.id.clone())))
        })
    }

    pub fn delete_project(&mut self, project_id: &ProjectId) -> AppResult<()> {
        let position = self
            .projects
            .iter()
            .position(|project| &project.id == project_id)
            .ok_or_else(|| AppError::ProjectNotFound(project_id.clone()))?;

        let mut next = self.projects.clone();
        next.remove(position);
        self.commit(next, StoreEvent::ProjectDeleted(project_id.clone()))?;

        tracing::info!("Deleted project {}", project_id);
        Ok(())
    }

    pub fn get_project_by_id(&self, project_id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| &project.id == project_id)
    }

    /// Teachers see the projects they created, students the ones they are
    /// assigned to. Nobody logged in sees nothing.
    pub fn get_projects_by_user(&self) -> Vec<&Project> {
        let Some(user) = &self.current_user else {
            return Vec::new();
        };

        match user.role {
            Role::Teacher => self
                .projects
                .iter()
                .filter(|project| project.created_by.as_ref() == Some(&user.id))
                .collect(),
            Role::Student => self
                .projects
                .iter()
                .filter(|project| project.is_assigned_to(&user.id))
                .collect(),
        }
    }

    pub fn add_task(&mut self, project_id: &ProjectId, draft: TaskDraft) -> AppResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: TaskId(self.ids.next_at(now)),
            title: draft.title,
            description: draft.description,
            status: TaskStatus::Todo,
            priority: draft.priority,
            assigned_to: draft.assigned_to,
            created_at: now,
            comments: Vec::new(),
        };

        let added = task.clone();
        self.modify_project(project_id, move |project| {
            project.tasks.push(added);
            let event = StoreEvent::TaskAdded {
                project_id: project.id.clone(),
                task_id: task.id.clone(),
            };
            Ok((task, event))
        })
    }

    pub fn update_task(
        &mut self,
        project_id: &ProjectId,
        task_id: &TaskId,
        update: TaskUpdate,
    ) -> AppResult<()> {
        self.modify_project(project_id, |project| {
            let task = project
                .task_mut(task_id)
                .ok_or_else(|| AppError::TaskNotFound {
                    project_id: project_id.clone(),
                    task_id: task_id.clone(),
                })?;
            task.apply(update);

            let event = StoreEvent::TaskUpdated {
                project_id: project_id.clone(),
                task_id: task_id.clone(),
            };
            Ok(((), event))
        })
    }

    pub fn delete_task(&mut self, project_id: &ProjectId, task_id: &TaskId) -> AppResult<()> {
        self.modify_project(project_id, |project| {
            let position = project
                .tasks
                .iter()
                .position(|task| &task.id == task_id)
                .ok_or_else(|| AppError::TaskNotFound {
                    project_id: project_id.clone(),
                    task_id: task_id.clone(),
                })?;
            project.tasks.remove(position);

            let event = StoreEvent::TaskDeleted {
                project_id: project_id.clone(),
                task_id: task_id.clone(),
            };
            Ok(((), event))
        })
    }

    pub fn add_comment(
        &mut self,
        project_id: &ProjectId,
        task_id: &TaskId,
        draft: CommentDraft,
    ) -> AppResult<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: CommentId(self.ids.next_at(now)),
            text: draft.text,
            user_id: self.current_user.as_ref().map(|user| user.id.clone()),
            user_name: self.current_user.as_ref().map(|user| user.name.clone()),
            created_at: now,
        };

        self.modify_project(project_id, |project| {
            let task = project
                .task_mut(task_id)
                .ok_or_else(|| AppError::TaskNotFound {
                    project_id: project_id.clone(),
                    task_id: task_id.clone(),
                })?;
            task.comments.push(comment.clone());

            let event = StoreEvent::CommentAdded {
                project_id: project_id.clone(),
                task_id: task_id.clone(),
                comment_id: comment.id.clone(),
            };
            Ok((comment, event))
        })
    }

    /// Record a pending submission and mark the project submitted.
    pub fn submit_project(
        &mut self,
        project_id: &ProjectId,
        draft: SubmissionDraft,
    ) -> AppResult<Submission> {
        let now = Utc::now();
        let submission = Submission {
            id: SubmissionId(self.ids.next_at(now)),
            title: draft.title,
            description: draft.description,
            file_url: draft.file_url,
            submitted_by: self.current_user.as_ref().map(|user| user.id.clone()),
            submitted_by_name: self.current_user.as_ref().map(|user| user.name.clone()),
            submitted_at: now,
            status: SubmissionStatus::Pending,
        };

        let submitted = self.modify_project(project_id, |project| {
            project.submissions.push(submission.clone());
            project.status = ProjectStatus::Submitted;

            let event = StoreEvent::ProjectSubmitted {
                project_id: project_id.clone(),
                submission_id: submission.id.clone(),
            };
            Ok((submission, event))
        })?;

        tracing::info!("Project {} submitted as {}", project_id, submitted.id);
        Ok(submitted)
    }

    /// Approve or reject a submission. The project's own status is left alone.
    pub fn review_submission(
        &mut self,
        project_id: &ProjectId,
        submission_id: &SubmissionId,
        status: SubmissionStatus,
    ) -> AppResult<()> {
        self.modify_project(project_id, |project| {
            let submission =
                project
                    .submission_mut(submission_id)
                    .ok_or_else(|| AppError::SubmissionNotFound {
                        project_id: project_id.clone(),
                        submission_id: submission_id.clone(),
                    })?;
            submission.status = status;

            let event = StoreEvent::SubmissionReviewed {
                project_id: project_id.clone(),
                submission_id: submission_id.clone(),
                status,
            };
            Ok(((), event))
        })
    }

    /// Write the derived task-completion percentage into `progress`.
    ///
    /// Nothing is persisted when the cached value is already current.
    pub fn sync_progress(&mut self, project_id: &ProjectId) -> AppResult<u8> {
        let project = self
            .get_project_by_id(project_id)
            .ok_or_else(|| AppError::ProjectNotFound(project_id.clone()))?;

        let progress = project.computed_progress();
        if progress == project.progress {
            return Ok(progress);
        }

        self.modify_project(project_id, |project| {
            project.progress = progress;
            let event = StoreEvent::ProgressSynced {
                project_id: project_id.clone(),
                progress,
            };
            Ok((progress, event))
        })
    }

    fn modify_project<R>(
        &mut self,
        project_id: &ProjectId,
        change: impl FnOnce(&mut Project) -> AppResult<(R, StoreEvent)>,
    ) -> AppResult<R> {
        let mut next = self.projects.clone();
        let project = next
            .iter_mut()
            .find(|project| &project.id == project_id)
            .ok_or_else(|| AppError::ProjectNotFound(project_id.clone()))?;

        let (result, event) = change(project)?;
        self.commit(next, event)?;
        Ok(result)
    }

    fn commit(&mut self, next: Vec<Project>, event: StoreEvent) -> AppResult<()> {
        let snapshot =
            serde_json::to_string(&next).map_err(|e| AppError::Serialization(e.to_string()))?;

        if let Err(e) = self.storage.write(&snapshot) {
            tracing::warn!("Snapshot write failed, keeping previous state: {}", e);
            return Err(e.into());
        }

        self.projects = next;
        tracing::debug!("Persisted {} projects after {:?}", self.projects.len(), event);

        for (_, observer) in &self.observers {
            observer.on_change(&event, &self.projects);
        }
        Ok(())
    }
}
