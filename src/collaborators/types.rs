//! Typed results exchanged with remediation collaborators.

use crate::models::{EngineOutcome, SearchEngine, Strategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Host provider resolved for a URL, with its abuse contact if one is known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProvider {
    pub host_provider_id: String,
    pub abuse_email: Option<String>,
}

impl HostProvider {
    pub fn has_contact(&self) -> bool {
        self.abuse_email
            .as_deref()
            .is_some_and(|email| !email.trim().is_empty())
    }
}

/// State of a DMCA notice as reported by the takedown processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakedownStatus {
    Pending,
    Sent,
    Acknowledged,
    ContentRemoved,
    Rejected,
    Failed,
    NoContact,
}

impl TakedownStatus {
    /// Notice reached the provider and was not refused
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Sent | Self::Acknowledged | Self::ContentRemoved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Acknowledged => "acknowledged",
            Self::ContentRemoved => "content_removed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
            Self::NoContact => "no_contact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakedownOutcome {
    pub takedown_id: Option<String>,
    pub status: TakedownStatus,
    pub message: String,
}

/// Legal basis given to search engines for a delisting request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelistingReason {
    CopyrightInfringement,
    TrademarkInfringement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelistingRequestState {
    Pending,
    Processing,
    Completed,
    PartiallyCompleted,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelistingRequestStatus {
    pub status: DelistingRequestState,
    pub results: HashMap<SearchEngine, EngineOutcome>,
}

/// Aggregate delisting performance over a look-back window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// `None` when the monitor has no completed requests in the window
    pub success_rate: Option<f64>,
    pub avg_processing_time_seconds: f64,
}

/// One finished workflow, as written to the outcome metrics sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub workflow_id: Uuid,
    pub strategy: Strategy,
    pub host_provider_id: Option<String>,
    pub dmca_invoked: bool,
    pub dmca_successful: bool,
    pub delisting_invoked: bool,
    pub delisting_successful: bool,
    pub overall_success: bool,
    pub processing_time_ms: u64,
    pub recorded_at: DateTime<Utc>,
}
