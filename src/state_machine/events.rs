use serde::{Deserialize, Serialize};

/// Events that can trigger workflow state transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkflowEvent {
    /// Begin driving channels
    Start,
    DmcaSucceeded,
    DelistingSucceeded,
    BothSucceeded,
    /// No channel succeeded, or execution itself broke
    Fail(String),
    /// Post-success verification has run
    Complete,
}

impl WorkflowEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::DmcaSucceeded => "dmca_succeeded",
            Self::DelistingSucceeded => "delisting_succeeded",
            Self::BothSucceeded => "both_succeeded",
            Self::Fail(_) => "fail",
            Self::Complete => "complete",
        }
    }

    /// Extract error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    /// Create a failure event with the given error message
    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}
