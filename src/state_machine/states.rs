use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow lifecycle states
///
/// `Pending -> InProgress -> {DmcaSuccessful, DelistingSuccessful,
/// BothSuccessful, Failed}`; success states may advance to `Completed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Created, not yet executing
    #[default]
    Pending,
    /// Channels are being driven
    InProgress,
    DmcaSuccessful,
    DelistingSuccessful,
    BothSuccessful,
    /// No channel succeeded; terminal
    Failed,
    /// Success confirmed and post-success verification has run
    Completed,
}

impl WorkflowStatus {
    /// States for which `overall_success` holds
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::DmcaSuccessful | Self::DelistingSuccessful | Self::BothSuccessful | Self::Completed
        )
    }

    /// States produced by aggregating channel results
    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            Self::DmcaSuccessful | Self::DelistingSuccessful | Self::BothSuccessful | Self::Failed
        )
    }

    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Completed)
    }

    /// Check if this is an active state (channels are being driven)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::DmcaSuccessful => "dmca_successful",
            Self::DelistingSuccessful => "delisting_successful",
            Self::BothSuccessful => "both_successful",
            Self::Failed => "failed",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "dmca_successful" => Ok(Self::DmcaSuccessful),
            "delisting_successful" => Ok(Self::DelistingSuccessful),
            "both_successful" => Ok(Self::BothSuccessful),
            "failed" => Ok(Self::Failed),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid workflow status: {s}")),
        }
    }
}
