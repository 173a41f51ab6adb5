//! Shared helpers for integration tests.

#![allow(dead_code)]

use takedown_core::collaborators::{OutcomeMetrics, OutcomeRecord};
use takedown_core::models::{ProfileData, Strategy};
use takedown_core::orchestration::{InfringementRequest, TakedownService};
use takedown_core::test_utils::TestCollaborators;
use takedown_core::TakedownConfig;
use uuid::Uuid;

pub const HOST: &str = "cheap-hosting-ltd";

/// Defaults with verification off, so no background jobs outlive a test
pub fn quiet_config() -> TakedownConfig {
    let mut config = TakedownConfig::default();
    config.verification.enabled = false;
    config
}

pub fn service(fakes: &TestCollaborators) -> TakedownService {
    service_with(fakes, quiet_config())
}

pub fn service_with(fakes: &TestCollaborators, config: TakedownConfig) -> TakedownService {
    takedown_core::logging::init_structured_logging();
    TakedownService::in_memory(&config, fakes.collaborators()).expect("valid test config")
}

pub fn profile() -> ProfileData {
    ProfileData::new("creator-42", "Indie Film Co").with_email("legal@indiefilm.example")
}

pub fn request(url: &str) -> InfringementRequest {
    InfringementRequest::new(url, profile()).with_original_content_url("https://indiefilm.example/watch")
}

/// Seed the outcome log so `host` has the given DMCA success history
pub async fn seed_host_history(
    outcomes: &dyn OutcomeMetrics,
    host: &str,
    successes: usize,
    failures: usize,
) {
    for i in 0..successes + failures {
        outcomes
            .record_outcome(OutcomeRecord {
                workflow_id: Uuid::new_v4(),
                strategy: Strategy::DmcaOnly,
                host_provider_id: Some(host.to_string()),
                dmca_invoked: true,
                dmca_successful: i < successes,
                delisting_invoked: false,
                delisting_successful: false,
                overall_success: i < successes,
                processing_time_ms: 1_000,
                recorded_at: chrono::Utc::now(),
            })
            .await
            .expect("in-memory outcome log accepts records");
    }
}
