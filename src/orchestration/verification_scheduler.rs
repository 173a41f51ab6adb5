//! # Verification Scheduler
//!
//! After a workflow finishes in a success state, schedules a delayed re-check
//! of the real-world outcome: whether the URL is still reachable (via the
//! takedown processor) and whether search engines still index it.
//!
//! Verification is advisory. Findings are written onto the finalized workflow
//! and logged, but never revoke `overall_success`. Once at least one check
//! ran, a success status advances to `Completed`.
//!
//! Each check is bounded by `check_timeout` and a collaborator panic is
//! reported as a failed check, so a job always leaves the pending set.
//!
//! Jobs run as detached tokio tasks and never block the caller. Each job is
//! described by a [`VerificationJob`] value carrying its due time, so a
//! durable delayed-work queue can persist and replay jobs across restarts.

use super::channel_executor::panic_message;
use crate::collaborators::{SearchEngineDelistingService, TakedownProcessor, TakedownStatus};
use crate::constants::{events, services};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::models::{SearchEngine, Workflow};
use crate::repository::{VerificationUpdate, WorkflowRepository};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A pending outcome re-check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationJob {
    pub workflow_id: Uuid,
    pub url: String,
    pub takedown_id: Option<String>,
    pub due_at: DateTime<Utc>,
}

impl VerificationJob {
    pub fn for_workflow(workflow: &Workflow, delay: Duration) -> Self {
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::zero());
        Self {
            workflow_id: workflow.workflow_id,
            url: workflow.url.clone(),
            takedown_id: workflow.dmca_result.takedown_id.clone(),
            due_at: Utc::now() + delay,
        }
    }
}

/// What a verification run found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    pub url_accessible: Option<bool>,
    pub search_engine_indexed: HashMap<SearchEngine, bool>,
    pub takedown_check_error: Option<String>,
    pub index_check_error: Option<String>,
}

impl VerificationReport {
    /// At least one of the two checks produced an answer
    pub fn any_check_ran(&self) -> bool {
        self.url_accessible.is_some() || self.index_check_error.is_none()
    }

    /// Content still reachable or still listed somewhere
    pub fn warning(&self) -> Option<String> {
        let mut findings = Vec::new();
        if self.url_accessible == Some(true) {
            findings.push("content still accessible".to_string());
        }
        let mut still_indexed: Vec<&str> = self
            .search_engine_indexed
            .iter()
            .filter(|(_, indexed)| **indexed)
            .map(|(engine, _)| engine.as_str())
            .collect();
        still_indexed.sort_unstable();
        if !still_indexed.is_empty() {
            findings.push(format!("still indexed by {}", still_indexed.join(", ")));
        }
        (!findings.is_empty()).then(|| findings.join("; "))
    }
}

struct ScheduledJob {
    job: VerificationJob,
    handle: JoinHandle<()>,
}

#[derive(Clone)]
pub struct VerificationScheduler {
    takedown_processor: Arc<dyn TakedownProcessor>,
    search_service: Arc<dyn SearchEngineDelistingService>,
    repository: Arc<dyn WorkflowRepository>,
    delay: Duration,
    check_timeout: Duration,
    enabled: bool,
    jobs: Arc<DashMap<Uuid, ScheduledJob>>,
}

impl VerificationScheduler {
    pub fn new(
        takedown_processor: Arc<dyn TakedownProcessor>,
        search_service: Arc<dyn SearchEngineDelistingService>,
        repository: Arc<dyn WorkflowRepository>,
        delay: Duration,
        check_timeout: Duration,
        enabled: bool,
    ) -> Self {
        Self {
            takedown_processor,
            search_service,
            repository,
            delay,
            check_timeout,
            enabled,
            jobs: Arc::new(DashMap::new()),
        }
    }

    /// Schedule a re-check for a successful workflow; returns the job, if any
    pub fn schedule(&self, workflow: &Workflow) -> Option<VerificationJob> {
        if !self.enabled {
            debug!(workflow_id = %workflow.workflow_id, "Verification disabled, not scheduling");
            return None;
        }
        if !workflow.status.is_success() {
            debug!(
                workflow_id = %workflow.workflow_id,
                status = %workflow.status,
                "Verification only runs for successful workflows"
            );
            return None;
        }

        let job = VerificationJob::for_workflow(workflow, self.delay);
        let (registered_tx, registered_rx) = oneshot::channel::<()>();
        let scheduler = self.clone();
        let task_job = job.clone();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            // Wait until the job is in the registry so removal below cannot race it
            let _ = registered_rx.await;
            tokio::time::sleep(delay).await;
            if let Err(panic) = AssertUnwindSafe(scheduler.run(&task_job)).catch_unwind().await {
                error!(
                    workflow_id = %task_job.workflow_id,
                    error = %panic_message(panic.as_ref()),
                    "Verification job panicked"
                );
            }
            scheduler.jobs.remove(&task_job.workflow_id);
        });

        if let Some(previous) = self.jobs.insert(
            job.workflow_id,
            ScheduledJob {
                job: job.clone(),
                handle,
            },
        ) {
            previous.handle.abort();
        }
        let _ = registered_tx.send(());

        info!(
            event = events::VERIFICATION_SCHEDULED,
            workflow_id = %job.workflow_id,
            due_at = %job.due_at,
            "Verification scheduled"
        );
        Some(job)
    }

    /// Run both checks for a job and record the findings
    pub async fn run(&self, job: &VerificationJob) -> VerificationReport {
        let report = self.check(job).await;

        if let Some(warning) = report.warning() {
            warn!(
                workflow_id = %job.workflow_id,
                url = %job.url,
                finding = %warning,
                "Verification found content not fully removed"
            );
        }

        let update = VerificationUpdate {
            url_accessible: report.url_accessible,
            search_engine_indexed: report.search_engine_indexed.clone(),
            warning: report.warning(),
            complete: report.any_check_ran(),
        };
        match self.repository.record_verification(job.workflow_id, update).await {
            Ok(workflow) => info!(
                event = events::VERIFICATION_COMPLETED,
                workflow_id = %job.workflow_id,
                status = %workflow.status,
                url_accessible = workflow.url_accessible,
                "Verification recorded"
            ),
            Err(e) => error!(
                workflow_id = %job.workflow_id,
                error = %e,
                "Failed to record verification"
            ),
        }

        report
    }

    async fn check(&self, job: &VerificationJob) -> VerificationReport {
        let mut report = VerificationReport::default();

        if let Some(takedown_id) = job.takedown_id.as_deref() {
            let status = bounded(
                services::TAKEDOWN_PROCESSOR,
                self.check_timeout,
                self.takedown_processor.check_status(takedown_id),
            );
            match status.await {
                Ok(status) => report.url_accessible = Some(status != TakedownStatus::ContentRemoved),
                Err(e) => report.takedown_check_error = Some(log_check_failure(job, "takedown_status", &e)),
            }
        }

        let indexed = bounded(
            services::SEARCH_ENGINE_SERVICE,
            self.check_timeout,
            self.search_service.verify_url_removal(&job.url),
        );
        match indexed.await {
            Ok(indexed) => report.search_engine_indexed = indexed,
            Err(e) => report.index_check_error = Some(log_check_failure(job, "index_status", &e)),
        }

        report
    }

    /// Cancel a pending job; returns whether one was pending
    pub fn cancel(&self, workflow_id: Uuid) -> bool {
        match self.jobs.remove(&workflow_id) {
            Some((_, scheduled)) => {
                scheduled.handle.abort();
                debug!(workflow_id = %workflow_id, "Verification cancelled");
                true
            }
            None => false,
        }
    }

    pub fn pending_jobs(&self) -> Vec<VerificationJob> {
        let mut jobs: Vec<VerificationJob> =
            self.jobs.iter().map(|entry| entry.job.clone()).collect();
        jobs.sort_by_key(|job| job.due_at);
        jobs
    }

    /// Abort every pending job
    pub fn shutdown(&self) {
        let ids: Vec<Uuid> = self.jobs.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            self.cancel(id);
        }
    }
}

/// Await one check under `budget`; a timeout or panic becomes an error
async fn bounded<T, F>(service: &str, budget: Duration, call: F) -> CollaboratorResult<T>
where
    F: Future<Output = CollaboratorResult<T>>,
{
    match tokio::time::timeout(budget, AssertUnwindSafe(call).catch_unwind()).await {
        Err(_elapsed) => Err(CollaboratorError::timeout(service, budget)),
        Ok(Err(panic)) => Err(CollaboratorError::unavailable(
            service,
            format!("panicked: {}", panic_message(panic.as_ref())),
        )),
        Ok(Ok(result)) => result,
    }
}

fn log_check_failure(job: &VerificationJob, check: &str, error: &CollaboratorError) -> String {
    warn!(
        workflow_id = %job.workflow_id,
        check = check,
        error = %error,
        retryable = error.is_retryable(),
        "Verification check failed"
    );
    error.to_string()
}
