//! Mutex-guarded in-memory repository for single-process deployments.

use super::{RepositoryResult, VerificationUpdate, WorkflowRepository};
use crate::constants::metadata;
use crate::error::RepositoryError;
use crate::models::Workflow;
use crate::state_machine::WorkflowEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    active: HashMap<Uuid, Workflow>,
    history: HashMap<Uuid, Workflow>,
    /// Finalization order, oldest first, for eviction
    order: VecDeque<Uuid>,
}

#[derive(Debug)]
pub struct InMemoryWorkflowRepository {
    inner: RwLock<Inner>,
    history_capacity: usize,
}

impl InMemoryWorkflowRepository {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            history_capacity: history_capacity.max(1),
        }
    }

    pub fn history_len(&self) -> usize {
        self.inner.read().history.len()
    }

    pub fn active_len(&self) -> usize {
        self.inner.read().active.len()
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn put(&self, workflow: Workflow) -> RepositoryResult<()> {
        let mut inner = self.inner.write();
        if inner.history.contains_key(&workflow.workflow_id) {
            return Err(RepositoryError::AlreadyFinalized(workflow.workflow_id));
        }
        inner.active.insert(workflow.workflow_id, workflow);
        Ok(())
    }

    async fn get(&self, workflow_id: Uuid) -> RepositoryResult<Option<Workflow>> {
        let inner = self.inner.read();
        Ok(inner
            .history
            .get(&workflow_id)
            .or_else(|| inner.active.get(&workflow_id))
            .cloned())
    }

    async fn finalize(&self, workflow: Workflow) -> RepositoryResult<()> {
        let workflow_id = workflow.workflow_id;
        let mut inner = self.inner.write();
        if inner.history.contains_key(&workflow_id) {
            return Err(RepositoryError::AlreadyFinalized(workflow_id));
        }
        if inner.active.remove(&workflow_id).is_none() {
            return Err(RepositoryError::NotActive(workflow_id));
        }

        inner.history.insert(workflow_id, workflow);
        inner.order.push_back(workflow_id);

        while inner.history.len() > self.history_capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.history.remove(&oldest);
            debug!(workflow_id = %oldest, "Evicted workflow from history");
        }

        Ok(())
    }

    async fn record_verification(
        &self,
        workflow_id: Uuid,
        update: VerificationUpdate,
    ) -> RepositoryResult<Workflow> {
        let mut inner = self.inner.write();
        let workflow = inner
            .history
            .get_mut(&workflow_id)
            .ok_or(RepositoryError::NotFound(workflow_id))?;

        if let Some(accessible) = update.url_accessible {
            workflow.url_accessible = accessible;
        }
        workflow
            .search_engine_indexed
            .extend(update.search_engine_indexed);
        if let Some(warning) = update.warning {
            workflow.set_metadata(metadata::VERIFICATION_WARNING, warning);
        }
        if update.complete && workflow.status.is_success() && !workflow.status.is_terminal() {
            if let Err(e) = workflow.apply(WorkflowEvent::Complete) {
                warn!(workflow_id = %workflow_id, error = %e, "Could not complete verified workflow");
            }
        }

        Ok(workflow.clone())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> RepositoryResult<Vec<Workflow>> {
        let inner = self.inner.read();
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.history.get(id))
            .filter(|w| w.completed_at.is_some_and(|at| at >= since))
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> RepositoryResult<Vec<Workflow>> {
        Ok(self.inner.read().active.values().cloned().collect())
    }
}
