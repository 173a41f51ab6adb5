#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Takedown Core
//!
//! Orchestration core for removing infringing content found on third-party
//! sites.
//!
//! ## Overview
//!
//! Each infringing URL is pursued through two independent, failure-prone
//! remediation channels: a DMCA notice to the hosting provider and delisting
//! requests to search engines. This crate decides how to combine the two,
//! runs them with per-channel failure isolation, aggregates their outcomes
//! into one workflow result, schedules delayed verification, and feeds
//! outcome statistics back into future strategy choices.
//!
//! The network-facing work (sending notices, filing delisting requests,
//! checking indexes) is done by collaborators behind the async traits in
//! [`collaborators`].
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Strategy selection, channel execution, verification and statistics
//! - [`state_machine`] - Forward-only workflow lifecycle
//! - [`models`] - Workflow records and value types
//! - [`collaborators`] - Seams to external remediation services
//! - [`repository`] - Workflow storage
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup and helpers
//! - [`metrics`] - OpenTelemetry instruments and the outcome log
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use takedown_core::config::ConfigManager;
//! use takedown_core::models::ProfileData;
//! use takedown_core::orchestration::{InfringementRequest, TakedownService};
//! use takedown_core::test_utils::TestCollaborators;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! takedown_core::logging::init_structured_logging();
//! let manager = ConfigManager::load()?;
//! let service = TakedownService::in_memory(manager.config(), TestCollaborators::new().collaborators())?;
//!
//! let workflow = service
//!     .process_infringement(InfringementRequest::new(
//!         "https://pirate.example/film",
//!         ProfileData::new("creator-1", "Creator One"),
//!     ))
//!     .await;
//! println!("{} -> {}", workflow.workflow_id, workflow.status);
//! # Ok(())
//! # }
//! ```

pub mod collaborators;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod orchestration;
pub mod repository;
pub mod state_machine;
pub mod test_utils;

pub use config::{ConfigManager, TakedownConfig};
pub use error::{
    CollaboratorError, CollaboratorResult, RepositoryError, TakedownError, TakedownResult,
};
pub use models::{
    Priority, ProfileData, SearchEngine, StatisticsReport, StatisticsWindow, Strategy, Workflow,
};
pub use orchestration::{Collaborators, InfringementRequest, TakedownService};
pub use state_machine::{WorkflowEvent, WorkflowStatus};
