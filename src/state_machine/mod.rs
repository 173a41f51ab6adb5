// State machine module for workflow orchestration
//
// Forward-only lifecycle for takedown workflows. Retries never rewind a
// workflow; they create a new one.

pub mod errors;
pub mod events;
pub mod states;
pub mod workflow_state_machine;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::WorkflowEvent;
pub use states::WorkflowStatus;
pub use workflow_state_machine::WorkflowStateMachine;
