//! # System Constants
//!
//! Default values and lifecycle event names that define the operational
//! boundaries of the takedown orchestration core.

/// Lifecycle events emitted through structured logging
pub mod events {
    pub const WORKFLOW_CREATED: &str = "workflow.created";
    pub const WORKFLOW_STARTED: &str = "workflow.started";
    pub const WORKFLOW_FINALIZED: &str = "workflow.finalized";
    pub const WORKFLOW_FAILED: &str = "workflow.failed";
    pub const WORKFLOW_RETRY_REQUESTED: &str = "workflow.retry_requested";
    pub const STRATEGY_SELECTED: &str = "strategy.selected";
    pub const CHANNEL_COMPLETED: &str = "channel.completed";
    pub const CHANNEL_FAILED: &str = "channel.failed";
    pub const VERIFICATION_SCHEDULED: &str = "verification.scheduled";
    pub const VERIFICATION_COMPLETED: &str = "verification.completed";
}

/// Defaults consulted by strategy selection
pub mod strategy {
    /// DMCA success rate assumed for host providers without enough history
    pub const DEFAULT_DMCA_SUCCESS_RATE: f64 = 0.60;
    /// Delisting success rate assumed when the monitor has no data
    pub const DEFAULT_DELISTING_SUCCESS_RATE: f64 = 0.85;
    /// Both channels above this rate run in parallel
    pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.80;
    /// Look-back window for delisting performance metrics
    pub const DELISTING_METRICS_WINDOW_HOURS: u64 = 24 * 7;
}

/// Defaults for channel execution and verification
pub mod timing {
    pub const DMCA_TIMEOUT_SECONDS: u64 = 300;
    pub const DELISTING_TIMEOUT_SECONDS: u64 = 300;
    /// Budget for host lookup and rate reads before falling back to parallel
    pub const SELECTION_TIMEOUT_SECONDS: u64 = 30;
    /// Budget for each post-success verification check
    pub const VERIFICATION_CHECK_TIMEOUT_SECONDS: u64 = 60;
    /// Delay between a successful workflow and its outcome re-check
    pub const VERIFICATION_DELAY_SECONDS: u64 = 2 * 60 * 60;
}

/// Defaults for bounded in-memory stores
pub mod capacity {
    pub const OUTCOME_LOG_CAPACITY: usize = 10_000;
    pub const MIN_HOST_SAMPLES: usize = 3;
    pub const HISTORY_CAPACITY: usize = 50_000;
}

/// Metadata keys written onto workflows
pub mod metadata {
    pub const PROFILE: &str = "profile";
    pub const PRIORITY: &str = "priority";
    pub const ORIGINAL_CONTENT_URL: &str = "original_content_url";
    pub const HOST_PROVIDER: &str = "host_provider";
    pub const ERROR: &str = "error";
    pub const RETRY_OF: &str = "retry_of";
    pub const STRATEGY_SOURCE: &str = "strategy_source";
    pub const STRATEGY_ERROR: &str = "strategy_error";
    pub const VERIFICATION_WARNING: &str = "verification_warning";
    pub const SUMMARY: &str = "summary";
    pub const SEARCH_ENGINES: &str = "search_engines";
}

/// Collaborator names used in errors and log fields
pub mod services {
    pub const TAKEDOWN_PROCESSOR: &str = "takedown_processor";
    pub const DELISTING_MANAGER: &str = "delisting_manager";
    pub const DELISTING_MONITOR: &str = "delisting_monitor";
    pub const SEARCH_ENGINE_SERVICE: &str = "search_engine_delisting_service";
}
