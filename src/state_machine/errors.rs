use thiserror::Error;

/// Error types for workflow state machine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from} on event {event}")]
    InvalidTransition { from: String, event: String },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
