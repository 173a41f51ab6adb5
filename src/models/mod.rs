//! # Domain Models
//!
//! Workflow records and the value types that flow through orchestration.

pub mod profile;
pub mod search_engine;
pub mod statistics;
pub mod strategy;
pub mod workflow;

// Re-export core models for easy access
pub use profile::ProfileData;
pub use search_engine::SearchEngine;
pub use statistics::{StatisticsReport, StatisticsWindow, StrategyStats};
pub use strategy::{Priority, Strategy};
pub use workflow::{
    DelistingResult, DmcaResult, EngineOutcome, EngineRequestStatus, Workflow,
};
