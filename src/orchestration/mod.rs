//! # Orchestration Engine
//!
//! Decision and execution layer for takedown workflows.
//!
//! ## Core Components
//!
//! - **HistoricalRateStore**: per-host DMCA and current delisting success rates
//! - **StrategySelector**: picks Parallel, Sequential, DelistingOnly or DmcaOnly
//! - **ChannelExecutor**: one remediation sub-call under a deadline, failures absorbed
//! - **ResultAggregator**: order-independent fold of both sub-results into a status
//! - **WorkflowOrchestrator**: state machine driver for a single workflow
//! - **VerificationScheduler**: delayed outcome re-checks as detached jobs
//! - **StatisticsEngine**: outcome recording and windowed success-rate reports
//! - **UrlLockRegistry**: single flight per URL
//! - **TakedownService**: public entry point and query surface
//!
//! ## Flow
//!
//! ```text
//! process_infringement
//!   -> StrategySelector (host lookup + HistoricalRateStore)
//!   -> WorkflowOrchestrator (ChannelExecutor x {DMCA, delisting})
//!   -> ResultAggregator
//!   -> finalize -> StatisticsEngine::record -> VerificationScheduler::schedule
//! ```

pub mod channel_executor;
pub mod rates;
pub mod result_aggregator;
pub mod statistics_engine;
pub mod strategy_selector;
pub mod takedown_service;
pub mod url_locks;
pub mod verification_scheduler;
pub mod workflow_orchestrator;

pub use channel_executor::{Channel, ChannelExecutor};
pub use rates::HistoricalRateStore;
pub use result_aggregator::ResultAggregator;
pub use statistics_engine::{compute_report, StatisticsEngine};
pub use strategy_selector::{DecisionSource, StrategyDecision, StrategySelector};
pub use takedown_service::{Collaborators, InfringementRequest, TakedownService};
pub use url_locks::{UrlGuard, UrlLockRegistry};
pub use verification_scheduler::{VerificationJob, VerificationReport, VerificationScheduler};
pub use workflow_orchestrator::WorkflowOrchestrator;
