//! # Result Aggregator
//!
//! Folds the two channel sub-results into one workflow status. The fold is a
//! pure function of the two success flags, so the order in which concurrent
//! channels finish cannot change the outcome.

use crate::models::{DelistingResult, DmcaResult};
use crate::state_machine::{WorkflowEvent, WorkflowStatus};

pub struct ResultAggregator;

impl ResultAggregator {
    /// Truth table over channel success flags
    pub fn aggregate(dmca_successful: bool, delisting_successful: bool) -> (WorkflowStatus, bool) {
        let status = match (dmca_successful, delisting_successful) {
            (true, true) => WorkflowStatus::BothSuccessful,
            (true, false) => WorkflowStatus::DmcaSuccessful,
            (false, true) => WorkflowStatus::DelistingSuccessful,
            (false, false) => WorkflowStatus::Failed,
        };
        (status, status.is_success())
    }

    /// Human-readable summary, always DMCA first
    pub fn message(dmca: &DmcaResult, delisting: &DelistingResult) -> String {
        let dmca_part = if dmca.invoked {
            dmca.message.as_str()
        } else {
            "not invoked"
        };
        let delisting_part = if delisting.invoked {
            delisting.message.as_str()
        } else {
            "not invoked"
        };
        format!("DMCA: {dmca_part}; Delisting: {delisting_part}")
    }

    /// Event that moves an in-progress workflow to `status`
    pub fn event_for(status: WorkflowStatus, message: &str) -> Option<WorkflowEvent> {
        match status {
            WorkflowStatus::DmcaSuccessful => Some(WorkflowEvent::DmcaSucceeded),
            WorkflowStatus::DelistingSuccessful => Some(WorkflowEvent::DelistingSucceeded),
            WorkflowStatus::BothSuccessful => Some(WorkflowEvent::BothSucceeded),
            WorkflowStatus::Failed => Some(WorkflowEvent::fail_with_error(message)),
            WorkflowStatus::Pending | WorkflowStatus::InProgress | WorkflowStatus::Completed => None,
        }
    }
}
