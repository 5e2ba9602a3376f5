use crate::domain::Project;
use crate::ports::{StoreEvent, StoreObserver};

/// Writes every committed store change to the log.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl StoreObserver for TracingObserver {
    fn on_change(&self, event: &StoreEvent, projects: &[Project]) {
        tracing::info!(
            project = %event.project_id(),
            total_projects = projects.len(),
            "store change: {:?}",
            event
        );
    }
}
