//! # Metrics Module
//!
//! Two concerns live here:
//! - `orchestration`: OpenTelemetry instruments for workflow outcomes. They
//!   use the global meter provider, so they are no-ops until the host
//!   process installs an exporter.
//! - `outcome_log`: in-memory outcome sink that feeds historical DMCA
//!   success rates back into strategy selection.

pub mod orchestration;
pub mod outcome_log;

pub use outcome_log::InMemoryOutcomeLog;
