//! # Orchestration Metrics
//!
//! OpenTelemetry metrics for takedown workflows:
//! - Workflow lifecycle counters (started, finished by status)
//! - Channel failure counters
//! - Workflow duration histogram
//!
//! ## Usage
//!
//! ```rust
//! use takedown_core::metrics::orchestration::*;
//! use opentelemetry::KeyValue;
//!
//! workflows_started_total().add(1, &[KeyValue::new("strategy", "parallel")]);
//! ```

use opentelemetry::metrics::{Counter, Histogram, Meter};
use std::sync::OnceLock;

/// Lazy-initialized meter for orchestration metrics
static ORCHESTRATION_METER: OnceLock<Meter> = OnceLock::new();

/// Get or initialize the orchestration meter
fn meter() -> &'static Meter {
    ORCHESTRATION_METER
        .get_or_init(|| opentelemetry::global::meter_provider().meter("takedown-orchestration"))
}

// Counters

/// Total number of workflows that began executing
///
/// Labels:
/// - strategy: Execution strategy
pub fn workflows_started_total() -> Counter<u64> {
    meter()
        .u64_counter("takedown.workflows.started.total")
        .with_description("Total number of takedown workflows started")
        .build()
}

/// Total number of workflows recorded after finishing
///
/// Labels:
/// - strategy: Execution strategy
/// - status: Final workflow status
pub fn workflows_completed_total() -> Counter<u64> {
    meter()
        .u64_counter("takedown.workflows.completed.total")
        .with_description("Total number of takedown workflows finished")
        .build()
}

/// Total number of channel sub-calls that ended unsuccessfully
///
/// Labels:
/// - channel: dmca or delisting
/// - reason: unavailable, rejected, timeout, invalid_response, panic, unsuccessful
pub fn channel_failures_total() -> Counter<u64> {
    meter()
        .u64_counter("takedown.channel.failures.total")
        .with_description("Total number of failed remediation channel calls")
        .build()
}

// Histograms

/// Workflow duration in milliseconds, from creation to finish
///
/// Labels:
/// - strategy: Execution strategy
pub fn workflow_duration() -> Histogram<f64> {
    meter()
        .f64_histogram("takedown.workflows.duration")
        .with_description("Takedown workflow duration in milliseconds")
        .with_unit("ms")
        .build()
}
