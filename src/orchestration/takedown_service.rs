//! # Takedown Service
//!
//! Public entry point of the orchestration core. Wires strategy selection,
//! channel execution, finalization, statistics and verification together for
//! each infringement request, and exposes the query surface over stored
//! workflows.
//!
//! `process_infringement` always returns a [`Workflow`]. Every failure below
//! it is reported through `status`, `overall_success` and `metadata.error`.

use super::channel_executor::{panic_message, ChannelExecutor};
use super::rates::HistoricalRateStore;
use super::statistics_engine::StatisticsEngine;
use super::strategy_selector::{StrategyDecision, StrategySelector};
use super::url_locks::UrlLockRegistry;
use super::verification_scheduler::VerificationScheduler;
use super::workflow_orchestrator::{mark_failed, WorkflowOrchestrator};
use crate::collaborators::{
    DelistingManager, DelistingMonitor, OutcomeMetrics, SearchEngineDelistingService,
    TakedownProcessor,
};
use crate::config::TakedownConfig;
use crate::constants::{events, metadata};
use crate::error::{TakedownError, TakedownResult};
use crate::logging::{log_error, log_workflow_operation};
use crate::metrics::orchestration::workflows_started_total;
use crate::models::{
    Priority, ProfileData, SearchEngine, StatisticsReport, StatisticsWindow, Strategy, Workflow,
};
use crate::repository::{InMemoryWorkflowRepository, WorkflowRepository};
use crate::state_machine::WorkflowStatus;
use futures::FutureExt;
use opentelemetry::KeyValue;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// External services the core drives
#[derive(Clone)]
pub struct Collaborators {
    pub takedown_processor: Arc<dyn TakedownProcessor>,
    pub delisting_manager: Arc<dyn DelistingManager>,
    pub delisting_monitor: Arc<dyn DelistingMonitor>,
    pub search_service: Arc<dyn SearchEngineDelistingService>,
    pub outcome_metrics: Arc<dyn OutcomeMetrics>,
}

/// One request to remediate an infringing URL
#[derive(Debug, Clone, PartialEq)]
pub struct InfringementRequest {
    pub url: String,
    pub profile: ProfileData,
    pub original_content_url: Option<String>,
    /// Skip selection and run this strategy
    pub strategy: Option<Strategy>,
    pub priority: Priority,
    /// Engines to delist from; configured defaults when absent or empty
    pub search_engines: Option<Vec<SearchEngine>>,
}

impl InfringementRequest {
    pub fn new(url: impl Into<String>, profile: ProfileData) -> Self {
        Self {
            url: url.into(),
            profile,
            original_content_url: None,
            strategy: None,
            priority: Priority::default(),
            search_engines: None,
        }
    }

    pub fn with_original_content_url(mut self, url: impl Into<String>) -> Self {
        self.original_content_url = Some(url.into());
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_search_engines(mut self, engines: impl Into<Vec<SearchEngine>>) -> Self {
        self.search_engines = Some(engines.into());
        self
    }
}

#[derive(Clone)]
pub struct TakedownService {
    selector: StrategySelector,
    orchestrator: WorkflowOrchestrator,
    verification: VerificationScheduler,
    statistics: StatisticsEngine,
    repository: Arc<dyn WorkflowRepository>,
    url_locks: UrlLockRegistry,
    default_search_engines: Vec<SearchEngine>,
    serialize_same_url: bool,
}

impl std::fmt::Debug for TakedownService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TakedownService")
            .field("default_search_engines", &self.default_search_engines)
            .field("serialize_same_url", &self.serialize_same_url)
            .field("urls_in_flight", &self.url_locks.in_flight())
            .finish()
    }
}

impl TakedownService {
    pub fn new(
        config: &TakedownConfig,
        collaborators: Collaborators,
        repository: Arc<dyn WorkflowRepository>,
    ) -> TakedownResult<Self> {
        config.validate()?;

        let rates = HistoricalRateStore::new(
            collaborators.outcome_metrics.clone(),
            collaborators.delisting_monitor.clone(),
            config.strategy.delisting_metrics_window(),
        );
        let selector = StrategySelector::new(
            collaborators.takedown_processor.clone(),
            rates,
            config.strategy.clone(),
        );
        let channels = ChannelExecutor::new(
            collaborators.takedown_processor.clone(),
            collaborators.delisting_manager.clone(),
            config.orchestration.dmca_timeout(),
            config.orchestration.delisting_timeout(),
        );
        let verification = VerificationScheduler::new(
            collaborators.takedown_processor.clone(),
            collaborators.search_service.clone(),
            repository.clone(),
            config.verification.delay(),
            config.verification.check_timeout(),
            config.verification.enabled,
        );
        let statistics = StatisticsEngine::new(repository.clone(), collaborators.outcome_metrics);

        info!(
            dmca_timeout_seconds = config.orchestration.dmca_timeout_seconds,
            delisting_timeout_seconds = config.orchestration.delisting_timeout_seconds,
            verification_enabled = config.verification.enabled,
            "Takedown service initialized"
        );

        Ok(Self {
            selector,
            orchestrator: WorkflowOrchestrator::new(channels),
            verification,
            statistics,
            repository,
            url_locks: UrlLockRegistry::new(),
            default_search_engines: config.orchestration.default_search_engines.clone(),
            serialize_same_url: config.orchestration.serialize_same_url,
        })
    }

    /// Service backed by the bounded in-memory repository
    pub fn in_memory(config: &TakedownConfig, collaborators: Collaborators) -> TakedownResult<Self> {
        let repository = Arc::new(InMemoryWorkflowRepository::new(
            config.repository.history_capacity,
        ));
        Self::new(config, collaborators, repository)
    }

    /// Remediate one infringing URL and return the finalized workflow
    pub async fn process_infringement(&self, request: InfringementRequest) -> Workflow {
        self.run(request, None).await
    }

    async fn run(&self, request: InfringementRequest, retry_of: Option<Uuid>) -> Workflow {
        let _url_guard = if self.serialize_same_url {
            Some(self.url_locks.acquire(&request.url).await)
        } else {
            None
        };

        let engines = request
            .search_engines
            .clone()
            .filter(|engines| !engines.is_empty())
            .unwrap_or_else(|| self.default_search_engines.clone());

        let decision = match request.strategy {
            Some(strategy) => StrategyDecision::requested(strategy),
            None => self.selector.decide(&request.url, &request.profile).await,
        };

        let mut workflow = Workflow::new(request.url.clone(), decision.strategy);
        annotate(&mut workflow, &request, &decision, &engines, retry_of);
        log_workflow_operation(events::WORKFLOW_CREATED, &workflow, None);
        workflows_started_total().add(
            1,
            &[KeyValue::new("strategy", workflow.strategy.as_str())],
        );

        if let Err(e) = self.repository.put(workflow.clone()).await {
            log_error(
                "takedown_service",
                "register_workflow",
                &e.to_string(),
                Some(&request.url),
            );
            mark_failed(&mut workflow, &format!("workflow could not be registered: {e}"));
            workflow.mark_finished();
            return workflow;
        }

        let execution = self.orchestrator.execute(
            workflow.clone(),
            &request.profile,
            request.original_content_url.as_deref(),
            &engines,
        );
        let mut workflow = match AssertUnwindSafe(execution).catch_unwind().await {
            Ok(executed) => executed,
            Err(panic) => {
                let reason = format!("orchestration panicked: {}", panic_message(panic.as_ref()));
                mark_failed(&mut workflow, &reason);
                workflow
            }
        };

        self.finish(&mut workflow).await;
        workflow
    }

    async fn finish(&self, workflow: &mut Workflow) {
        workflow.mark_finished();

        if let Err(e) = self.repository.finalize(workflow.clone()).await {
            log_error(
                "takedown_service",
                "finalize_workflow",
                &e.to_string(),
                Some(&workflow.workflow_id.to_string()),
            );
        }
        self.statistics.record(workflow).await;
        log_workflow_operation(events::WORKFLOW_FINALIZED, workflow, None);

        if workflow.overall_success {
            self.verification.schedule(workflow);
        }
    }

    pub async fn get_workflow_status(&self, workflow_id: Uuid) -> TakedownResult<Workflow> {
        self.repository
            .get(workflow_id)
            .await?
            .ok_or(TakedownError::WorkflowNotFound(workflow_id))
    }

    pub async fn get_workflow_statistics(
        &self,
        window: StatisticsWindow,
    ) -> TakedownResult<StatisticsReport> {
        self.statistics.report(window).await
    }

    pub async fn list_active_workflows(&self) -> TakedownResult<Vec<Workflow>> {
        let mut active = self.repository.list_active().await?;
        active.sort_by_key(|w| w.started_at);
        Ok(active)
    }

    /// Start a fresh workflow for a finalized `Failed` one.
    ///
    /// The original record is left untouched; the new workflow carries
    /// `metadata.retry_of` and goes through strategy selection again.
    pub async fn retry_workflow(&self, workflow_id: Uuid) -> TakedownResult<Workflow> {
        let original = self.get_workflow_status(workflow_id).await?;
        if !original.is_finished() || original.status != WorkflowStatus::Failed {
            return Err(TakedownError::InvalidRetry {
                workflow_id,
                reason: format!("status is {}, only finished failed workflows retry", original.status),
            });
        }

        let request = request_from(&original)?;
        info!(
            event = events::WORKFLOW_RETRY_REQUESTED,
            workflow_id = %workflow_id,
            url = %original.url,
            "Retrying failed workflow"
        );
        Ok(self.run(request, Some(workflow_id)).await)
    }

    pub fn verification(&self) -> &VerificationScheduler {
        &self.verification
    }

    /// Cancel pending verification jobs
    pub fn shutdown(&self) {
        let pending = self.verification.pending_jobs().len();
        self.verification.shutdown();
        debug!(cancelled_jobs = pending, "Takedown service shut down");
    }
}

fn annotate(
    workflow: &mut Workflow,
    request: &InfringementRequest,
    decision: &StrategyDecision,
    engines: &[SearchEngine],
    retry_of: Option<Uuid>,
) {
    workflow.set_metadata(
        metadata::PROFILE,
        serde_json::to_value(&request.profile).unwrap_or_default(),
    );
    workflow.set_metadata(
        metadata::PRIORITY,
        serde_json::to_value(request.priority).unwrap_or_default(),
    );
    if let Some(original) = &request.original_content_url {
        workflow.set_metadata(metadata::ORIGINAL_CONTENT_URL, original.as_str());
    }
    if let Some(host) = &decision.host_provider {
        workflow.set_metadata(metadata::HOST_PROVIDER, host.host_provider_id.as_str());
    }
    workflow.set_metadata(metadata::STRATEGY_SOURCE, decision.source.as_str());
    if let Some(error) = &decision.error {
        workflow.set_metadata(metadata::STRATEGY_ERROR, error.as_str());
    }
    workflow.set_metadata(
        metadata::SEARCH_ENGINES,
        Value::from(engines.iter().map(|e| e.as_str()).collect::<Vec<_>>()),
    );
    if let Some(previous) = retry_of {
        workflow.set_metadata(metadata::RETRY_OF, previous.to_string());
    }
}

/// Rebuild the caller's request from a stored workflow's metadata
fn request_from(workflow: &Workflow) -> TakedownResult<InfringementRequest> {
    let invalid = |reason: &str| TakedownError::InvalidRetry {
        workflow_id: workflow.workflow_id,
        reason: reason.to_string(),
    };

    let profile: ProfileData = workflow
        .metadata
        .get(metadata::PROFILE)
        .cloned()
        .ok_or_else(|| invalid("profile missing from metadata"))
        .and_then(|value| {
            serde_json::from_value(value).map_err(|_| invalid("profile metadata is malformed"))
        })?;

    let mut request = InfringementRequest::new(workflow.url.clone(), profile);
    if let Some(original) = workflow.metadata_str(metadata::ORIGINAL_CONTENT_URL) {
        request = request.with_original_content_url(original);
    }
    if let Some(priority) = workflow
        .metadata
        .get(metadata::PRIORITY)
        .and_then(|value| serde_json::from_value::<Priority>(value.clone()).ok())
    {
        request = request.with_priority(priority);
    }
    let engines: Vec<SearchEngine> = workflow
        .metadata
        .get(metadata::SEARCH_ENGINES)
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|name| name.parse().ok())
                .collect()
        })
        .unwrap_or_default();
    if !engines.is_empty() {
        request = request.with_search_engines(engines);
    }
    Ok(request)
}
