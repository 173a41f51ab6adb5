//! # Collaborators
//!
//! Async seams to the external systems the orchestration core drives. Every
//! call returns a [`CollaboratorResult`] so expected refusals and transport
//! failures are both values, never panics.

pub mod types;

use crate::error::CollaboratorResult;
use crate::models::{ProfileData, SearchEngine};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

pub use types::{
    DelistingReason, DelistingRequestState, DelistingRequestStatus, HostProvider, OutcomeRecord,
    PerformanceMetrics, TakedownOutcome, TakedownStatus,
};

/// Sends legal notices to hosting providers
#[async_trait]
pub trait TakedownProcessor: Send + Sync {
    async fn identify_host_provider(&self, url: &str) -> CollaboratorResult<HostProvider>;

    async fn submit_takedown(
        &self,
        url: &str,
        profile: &ProfileData,
        original_content_url: Option<&str>,
    ) -> CollaboratorResult<TakedownOutcome>;

    async fn check_status(&self, takedown_id: &str) -> CollaboratorResult<TakedownStatus>;
}

/// Files delisting requests with search engines
#[async_trait]
pub trait DelistingManager: Send + Sync {
    /// Returns the request id used for later status reads
    async fn submit_url_removal(
        &self,
        url: &str,
        engines: &[SearchEngine],
        reason: DelistingReason,
        evidence_url: Option<&str>,
    ) -> CollaboratorResult<String>;

    async fn get_request_status(&self, request_id: &str)
        -> CollaboratorResult<DelistingRequestStatus>;
}

/// Read side of delisting performance history
#[async_trait]
pub trait DelistingMonitor: Send + Sync {
    async fn get_performance_metrics(
        &self,
        window: Option<Duration>,
    ) -> CollaboratorResult<PerformanceMetrics>;
}

/// Checks whether search engines still list a URL
#[async_trait]
pub trait SearchEngineDelistingService: Send + Sync {
    /// Map of engine to "still indexed"
    async fn verify_url_removal(&self, url: &str) -> CollaboratorResult<HashMap<SearchEngine, bool>>;
}

/// Outcome sink that also answers historical DMCA success rates
#[async_trait]
pub trait OutcomeMetrics: Send + Sync {
    async fn record_outcome(&self, record: OutcomeRecord) -> CollaboratorResult<()>;

    /// `None` when the host has too little history to judge
    async fn dmca_success_rate(&self, host_provider_id: &str) -> CollaboratorResult<Option<f64>>;
}
