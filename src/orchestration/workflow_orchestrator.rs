//! # Workflow Orchestrator
//!
//! Drives a workflow through `Pending -> InProgress -> <outcome>` by executing
//! its strategy against the DMCA and delisting channels.
//!
//! ## Strategies
//!
//! - **Parallel**: both channels run concurrently; outcome from the truth table.
//! - **Sequential**: DMCA first. On success the status is fixed at
//!   `DmcaSuccessful` and delisting still runs as follow-up without affecting
//!   it. On failure delisting runs as the fallback.
//! - **DelistingOnly** / **DmcaOnly**: one channel; the other collaborator is
//!   never called.
//!
//! Channel failures are already absorbed by [`ChannelExecutor`]. A failure in
//! the orchestration itself marks the workflow `Failed` with `metadata.error`
//! instead of escaping.

use super::channel_executor::ChannelExecutor;
use super::result_aggregator::ResultAggregator;
use crate::constants::{events, metadata};
use crate::error::{TakedownError, TakedownResult};
use crate::logging::log_workflow_operation;
use crate::models::{ProfileData, SearchEngine, Strategy, Workflow};
use crate::state_machine::{WorkflowEvent, WorkflowStatus};
use tracing::{debug, error};

#[derive(Clone)]
pub struct WorkflowOrchestrator {
    channels: ChannelExecutor,
}

impl WorkflowOrchestrator {
    pub fn new(channels: ChannelExecutor) -> Self {
        Self { channels }
    }

    /// Execute the workflow's strategy and return it in an outcome state
    pub async fn execute(
        &self,
        mut workflow: Workflow,
        profile: &ProfileData,
        original_content_url: Option<&str>,
        search_engines: &[SearchEngine],
    ) -> Workflow {
        if let Err(e) = self
            .try_execute(&mut workflow, profile, original_content_url, search_engines)
            .await
        {
            error!(
                workflow_id = %workflow.workflow_id,
                url = %workflow.url,
                strategy = %workflow.strategy,
                error = %e,
                "Workflow execution failed"
            );
            mark_failed(&mut workflow, &e.to_string());
        }
        workflow
    }

    async fn try_execute(
        &self,
        workflow: &mut Workflow,
        profile: &ProfileData,
        original_content_url: Option<&str>,
        search_engines: &[SearchEngine],
    ) -> TakedownResult<()> {
        workflow.apply(WorkflowEvent::Start)?;
        log_workflow_operation(events::WORKFLOW_STARTED, workflow, None);

        let url = workflow.url.clone();
        let host_provider_id = workflow
            .metadata_str(metadata::HOST_PROVIDER)
            .map(str::to_string);

        let status = match workflow.strategy {
            Strategy::Parallel => {
                let (mut dmca, delisting) = tokio::join!(
                    self.channels.run_dmca(&url, profile, original_content_url),
                    self.channels
                        .run_delisting(&url, search_engines, original_content_url),
                );
                dmca.host_provider_id = host_provider_id;
                let (status, _) = ResultAggregator::aggregate(dmca.successful, delisting.successful);
                workflow.dmca_result = dmca;
                workflow.delisting_result = delisting;
                status
            }
            Strategy::Sequential => {
                let mut dmca = self
                    .channels
                    .run_dmca(&url, profile, original_content_url)
                    .await;
                dmca.host_provider_id = host_provider_id;
                let dmca_successful = dmca.successful;
                workflow.dmca_result = dmca;

                let delisting = self
                    .channels
                    .run_delisting(&url, search_engines, original_content_url)
                    .await;
                let status = if dmca_successful {
                    debug!(
                        workflow_id = %workflow.workflow_id,
                        follow_up_successful = delisting.successful,
                        "Follow-up delisting after DMCA success"
                    );
                    WorkflowStatus::DmcaSuccessful
                } else {
                    ResultAggregator::aggregate(false, delisting.successful).0
                };
                workflow.delisting_result = delisting;
                status
            }
            Strategy::DelistingOnly => {
                let delisting = self
                    .channels
                    .run_delisting(&url, search_engines, original_content_url)
                    .await;
                let (status, _) = ResultAggregator::aggregate(false, delisting.successful);
                workflow.delisting_result = delisting;
                status
            }
            Strategy::DmcaOnly => {
                let mut dmca = self
                    .channels
                    .run_dmca(&url, profile, original_content_url)
                    .await;
                dmca.host_provider_id = host_provider_id;
                let (status, _) = ResultAggregator::aggregate(dmca.successful, false);
                workflow.dmca_result = dmca;
                status
            }
        };

        let summary = ResultAggregator::message(&workflow.dmca_result, &workflow.delisting_result);
        let event = ResultAggregator::event_for(status, &summary).ok_or_else(|| {
            TakedownError::Internal(format!("aggregation produced non-outcome status {status}"))
        })?;
        workflow.apply(event)?;
        if status == WorkflowStatus::Failed {
            workflow.set_metadata(metadata::ERROR, summary.clone());
        }
        workflow.set_metadata(metadata::SUMMARY, summary);

        Ok(())
    }
}

/// Move a workflow to `Failed` if it has not reached an outcome, recording why
pub(crate) fn mark_failed(workflow: &mut Workflow, error: &str) {
    workflow.set_metadata(metadata::ERROR, error);
    if workflow.status.is_active() {
        if let Err(e) = workflow.apply(WorkflowEvent::fail_with_error(error)) {
            error!(workflow_id = %workflow.workflow_id, error = %e, "Could not mark workflow failed");
        }
    }
    log_workflow_operation(events::WORKFLOW_FAILED, workflow, Some(error));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::TakedownStatus;
    use crate::error::CollaboratorError;
    use crate::test_utils::{FakeDelistingManager, FakeTakedownProcessor};
    use std::sync::Arc;
    use std::time::Duration;

    struct Harness {
        orchestrator: WorkflowOrchestrator,
        processor: Arc<FakeTakedownProcessor>,
        manager: Arc<FakeDelistingManager>,
    }

    fn harness(processor: FakeTakedownProcessor, manager: FakeDelistingManager) -> Harness {
        let processor = Arc::new(processor);
        let manager = Arc::new(manager);
        let channels = ChannelExecutor::new(
            processor.clone(),
            manager.clone(),
            Duration::from_secs(60),
            Duration::from_secs(60),
        );
        Harness {
            orchestrator: WorkflowOrchestrator::new(channels),
            processor,
            manager,
        }
    }

    async fn run(h: &Harness, strategy: Strategy) -> Workflow {
        let workflow = Workflow::new("https://pirate.example/film", strategy);
        h.orchestrator
            .execute(
                workflow,
                &ProfileData::new("creator-1", "Creator One"),
                Some("https://creator.example/film"),
                &SearchEngine::defaults(),
            )
            .await
    }

    #[tokio::test]
    async fn test_parallel_both_successful() {
        let h = harness(
            FakeTakedownProcessor::new(),
            FakeDelistingManager::new().succeeding_on(&SearchEngine::defaults()),
        );
        let workflow = run(&h, Strategy::Parallel).await;
        assert_eq!(workflow.status, WorkflowStatus::BothSuccessful);
        assert!(workflow.overall_success);
        assert_eq!(h.processor.submit_calls(), 1);
        assert_eq!(h.manager.submit_calls(), 1);
        assert!(workflow.metadata_str(metadata::SUMMARY).is_some());
    }

    #[tokio::test]
    async fn test_parallel_dmca_error_isolated() {
        let h = harness(
            FakeTakedownProcessor::new()
                .with_submit_error(CollaboratorError::unavailable("takedown_processor", "smtp down")),
            FakeDelistingManager::new().succeeding_on(&[SearchEngine::Bing]),
        );
        let workflow = run(&h, Strategy::Parallel).await;
        assert_eq!(workflow.status, WorkflowStatus::DelistingSuccessful);
        assert!(!workflow.dmca_result.successful);
        assert!(workflow.dmca_result.message.contains("smtp down"));
    }

    #[tokio::test]
    async fn test_parallel_neither_successful() {
        let h = harness(
            FakeTakedownProcessor::new().with_status(TakedownStatus::Failed),
            FakeDelistingManager::new(),
        );
        let workflow = run(&h, Strategy::Parallel).await;
        assert_eq!(workflow.status, WorkflowStatus::Failed);
        assert!(!workflow.overall_success);
        assert!(workflow
            .metadata_str(metadata::ERROR)
            .is_some_and(|e| e.starts_with("DMCA:")));
    }

    #[tokio::test]
    async fn test_sequential_dmca_success_ignores_follow_up() {
        let h = harness(
            FakeTakedownProcessor::new().with_status(TakedownStatus::Acknowledged),
            FakeDelistingManager::new()
                .with_submit_error(CollaboratorError::unavailable("delisting_manager", "down")),
        );
        let workflow = run(&h, Strategy::Sequential).await;
        assert_eq!(workflow.status, WorkflowStatus::DmcaSuccessful);
        assert!(workflow.overall_success);
        assert_eq!(h.manager.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_sequential_dmca_success_with_delisting_success_stays_dmca() {
        let h = harness(
            FakeTakedownProcessor::new(),
            FakeDelistingManager::new().succeeding_on(&SearchEngine::defaults()),
        );
        let workflow = run(&h, Strategy::Sequential).await;
        assert_eq!(workflow.status, WorkflowStatus::DmcaSuccessful);
        assert!(workflow.delisting_result.successful);
    }

    #[tokio::test]
    async fn test_sequential_falls_back_to_delisting() {
        let h = harness(
            FakeTakedownProcessor::new().with_status(TakedownStatus::Rejected),
            FakeDelistingManager::new().succeeding_on(&[SearchEngine::Google]),
        );
        let workflow = run(&h, Strategy::Sequential).await;
        assert_eq!(workflow.status, WorkflowStatus::DelistingSuccessful);
    }

    #[tokio::test]
    async fn test_delisting_only_never_calls_dmca() {
        let h = harness(
            FakeTakedownProcessor::new(),
            FakeDelistingManager::new().succeeding_on(&[SearchEngine::Google]),
        );
        let workflow = run(&h, Strategy::DelistingOnly).await;
        assert_eq!(workflow.status, WorkflowStatus::DelistingSuccessful);
        assert_eq!(h.processor.submit_calls(), 0);
        assert!(!workflow.dmca_result.invoked);
    }

    #[tokio::test]
    async fn test_dmca_only_never_calls_delisting() {
        let h = harness(
            FakeTakedownProcessor::new().with_status(TakedownStatus::Rejected),
            FakeDelistingManager::new().succeeding_on(&SearchEngine::defaults()),
        );
        let workflow = run(&h, Strategy::DmcaOnly).await;
        assert_eq!(workflow.status, WorkflowStatus::Failed);
        assert_eq!(h.manager.submit_calls(), 0);
        assert_eq!(h.manager.status_calls(), 0);
        assert!(!workflow.delisting_result.invoked);
    }

    #[tokio::test]
    async fn test_already_started_workflow_is_marked_failed() {
        let h = harness(FakeTakedownProcessor::new(), FakeDelistingManager::new());
        let mut workflow = Workflow::new("https://pirate.example/film", Strategy::Parallel);
        workflow.apply(WorkflowEvent::Start).unwrap();

        let workflow = h
            .orchestrator
            .execute(
                workflow,
                &ProfileData::new("creator-1", "Creator One"),
                None,
                &SearchEngine::defaults(),
            )
            .await;
        assert_eq!(workflow.status, WorkflowStatus::Failed);
        assert!(workflow.metadata_str(metadata::ERROR).is_some());
        assert_eq!(h.processor.submit_calls(), 0);
    }
}
