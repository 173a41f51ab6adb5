//! # Workflow Repository
//!
//! Storage seam for workflow records. Active workflows are upserted while an
//! orchestration run owns them; `finalize` moves a workflow into history
//! exactly once, after which only verification results may be attached.

pub mod memory;

use crate::error::RepositoryError;
use crate::models::{SearchEngine, Workflow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

pub use memory::InMemoryWorkflowRepository;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Verification output attached to a finalized workflow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationUpdate {
    pub url_accessible: Option<bool>,
    pub search_engine_indexed: HashMap<SearchEngine, bool>,
    /// Stored under `metadata.verification_warning`
    pub warning: Option<String>,
    /// Advance a success status to `Completed`
    pub complete: bool,
}

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Insert or replace an active workflow
    async fn put(&self, workflow: Workflow) -> RepositoryResult<()>;

    /// Look up a workflow in either the active set or history
    async fn get(&self, workflow_id: Uuid) -> RepositoryResult<Option<Workflow>>;

    /// Move a workflow from the active set into history
    async fn finalize(&self, workflow: Workflow) -> RepositoryResult<()>;

    /// Attach verification output to a finalized workflow
    async fn record_verification(
        &self,
        workflow_id: Uuid,
        update: VerificationUpdate,
    ) -> RepositoryResult<Workflow>;

    /// Finalized workflows whose `completed_at` is at or after `since`
    async fn list_since(&self, since: DateTime<Utc>) -> RepositoryResult<Vec<Workflow>>;

    async fn list_active(&self) -> RepositoryResult<Vec<Workflow>>;
}
