use super::{
    errors::{StateMachineError, StateMachineResult},
    events::WorkflowEvent,
    states::WorkflowStatus,
};

/// Transition table for workflow lifecycles
pub struct WorkflowStateMachine;

impl WorkflowStateMachine {
    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        current_state: WorkflowStatus,
        event: &WorkflowEvent,
    ) -> StateMachineResult<WorkflowStatus> {
        let target = match (current_state, event) {
            (WorkflowStatus::Pending, WorkflowEvent::Start) => WorkflowStatus::InProgress,

            // Aggregated channel outcomes
            (WorkflowStatus::InProgress, WorkflowEvent::DmcaSucceeded) => {
                WorkflowStatus::DmcaSuccessful
            }
            (WorkflowStatus::InProgress, WorkflowEvent::DelistingSucceeded) => {
                WorkflowStatus::DelistingSuccessful
            }
            (WorkflowStatus::InProgress, WorkflowEvent::BothSucceeded) => {
                WorkflowStatus::BothSuccessful
            }

            // Execution can break before channels start
            (WorkflowStatus::Pending | WorkflowStatus::InProgress, WorkflowEvent::Fail(_)) => {
                WorkflowStatus::Failed
            }

            (
                WorkflowStatus::DmcaSuccessful
                | WorkflowStatus::DelistingSuccessful
                | WorkflowStatus::BothSuccessful,
                WorkflowEvent::Complete,
            ) => WorkflowStatus::Completed,

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: from_state.to_string(),
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }

    /// Check whether `event` may be applied in `current_state`
    pub fn can_transition(current_state: WorkflowStatus, event: &WorkflowEvent) -> bool {
        Self::determine_target_state(current_state, event).is_ok()
    }
}
