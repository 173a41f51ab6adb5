//! Error types for the takedown orchestration core.
//!

use crate::config::ConfigurationError;
use crate::state_machine::StateMachineError;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TakedownError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("State transition error: {0}")]
    StateTransition(String),
    #[error("Workflow {0} not found")]
    WorkflowNotFound(Uuid),
    #[error("Workflow {workflow_id} cannot be retried: {reason}")]
    InvalidRetry { workflow_id: Uuid, reason: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ConfigurationError> for TakedownError {
    fn from(error: ConfigurationError) -> Self {
        TakedownError::Configuration(error.to_string())
    }
}

impl From<StateMachineError> for TakedownError {
    fn from(error: StateMachineError) -> Self {
        TakedownError::StateTransition(error.to_string())
    }
}

pub type TakedownResult<T> = std::result::Result<T, TakedownError>;

/// Failure reported by an external remediation collaborator.
///
/// Separates conditions worth retrying later (service down, timeout) from
/// terminal answers (the provider refused the request).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollaboratorError {
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: String, reason: String },
    #[error("{service} rejected the request: {reason}")]
    Rejected { service: String, reason: String },
    #[error("{service} timed out after {}s", after.as_secs())]
    Timeout { service: String, after: Duration },
    #[error("{service} returned an invalid response: {reason}")]
    InvalidResponse { service: String, reason: String },
}

impl CollaboratorError {
    pub fn unavailable(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn rejected(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(service: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            service: service.into(),
            after,
        }
    }

    /// Whether a later attempt against the same collaborator could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }

    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::Rejected { .. } => "rejected",
            Self::Timeout { .. } => "timeout",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }
}

pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// Errors from the workflow repository
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Workflow {0} is already finalized")]
    AlreadyFinalized(Uuid),
    #[error("Workflow {0} not found")]
    NotFound(Uuid),
    #[error("Workflow {0} is not active")]
    NotActive(Uuid),
}
