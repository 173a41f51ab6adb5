//! # Workflow
//!
//! The record of one remediation attempt for one URL. Created at the public
//! entry point, mutated only by the orchestration run that owns it, and
//! treated as an immutable historical record once finalized.

use crate::models::{SearchEngine, Strategy};
use crate::state_machine::{
    StateMachineResult, WorkflowEvent, WorkflowStateMachine, WorkflowStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of the DMCA notice channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DmcaResult {
    pub invoked: bool,
    pub successful: bool,
    pub message: String,
    /// Reference returned by the takedown processor, used for status checks
    pub takedown_id: Option<String>,
    pub host_provider_id: Option<String>,
}

/// Per-engine delisting state as reported by the delisting manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineRequestStatus {
    Pending,
    Submitted,
    Removed,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutcome {
    pub status: EngineRequestStatus,
    pub message: Option<String>,
}

impl EngineOutcome {
    pub fn new(status: EngineRequestStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    /// Accepted by the engine, whether or not removal has happened yet
    pub fn is_successful(&self) -> bool {
        matches!(
            self.status,
            EngineRequestStatus::Submitted | EngineRequestStatus::Removed
        )
    }
}

/// Outcome of the search-engine delisting channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelistingResult {
    pub invoked: bool,
    pub request_id: Option<String>,
    pub per_engine_results: HashMap<SearchEngine, EngineOutcome>,
    pub successful: bool,
    pub message: String,
}

impl DelistingResult {
    pub fn successful_engines(&self) -> Vec<SearchEngine> {
        let mut engines: Vec<SearchEngine> = self
            .per_engine_results
            .iter()
            .filter(|(_, outcome)| outcome.is_successful())
            .map(|(engine, _)| *engine)
            .collect();
        engines.sort();
        engines
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub workflow_id: Uuid,
    pub url: String,
    pub strategy: Strategy,
    pub status: WorkflowStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub processing_time: Option<Duration>,
    pub dmca_result: DmcaResult,
    pub delisting_result: DelistingResult,
    /// Set by verification; assumed reachable until checked
    pub url_accessible: bool,
    /// Set by verification; `true` means the engine still lists the URL
    pub search_engine_indexed: HashMap<SearchEngine, bool>,
    pub overall_success: bool,
    pub metadata: HashMap<String, Value>,
}

impl Workflow {
    pub fn new(url: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            workflow_id: Uuid::new_v4(),
            url: url.into(),
            strategy,
            status: WorkflowStatus::default(),
            started_at: Utc::now(),
            completed_at: None,
            processing_time: None,
            dmca_result: DmcaResult::default(),
            delisting_result: DelistingResult::default(),
            url_accessible: true,
            search_engine_indexed: HashMap::new(),
            overall_success: false,
            metadata: HashMap::new(),
        }
    }

    /// Apply a lifecycle event, keeping `overall_success` in step with `status`
    pub fn apply(&mut self, event: WorkflowEvent) -> StateMachineResult<WorkflowStatus> {
        let target = WorkflowStateMachine::determine_target_state(self.status, &event)?;
        self.status = target;
        self.overall_success = target.is_success();
        Ok(target)
    }

    /// Stamp completion time; idempotent so a workflow is timed once
    pub fn mark_finished(&mut self) {
        if self.completed_at.is_some() {
            return;
        }
        let now = Utc::now();
        self.processing_time = (now - self.started_at).to_std().ok();
        self.completed_at = Some(now);
    }

    pub fn is_finished(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn set_metadata(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}
