use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution plan for pursuing removal of one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// DMCA notice and delisting run concurrently
    Parallel,
    /// DMCA first; delisting as fallback, or as follow-up after a DMCA success
    Sequential,
    DelistingOnly,
    DmcaOnly,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Self::Parallel,
        Self::Sequential,
        Self::DelistingOnly,
        Self::DmcaOnly,
    ];

    pub fn uses_dmca(&self) -> bool {
        !matches!(self, Self::DelistingOnly)
    }

    pub fn uses_delisting(&self) -> bool {
        !matches!(self, Self::DmcaOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Sequential => "sequential",
            Self::DelistingOnly => "delisting_only",
            Self::DmcaOnly => "dmca_only",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parallel" => Ok(Self::Parallel),
            "sequential" => Ok(Self::Sequential),
            "delisting_only" => Ok(Self::DelistingOnly),
            "dmca_only" => Ok(Self::DmcaOnly),
            _ => Err(format!("Invalid strategy: {s}")),
        }
    }
}

/// Caller-assigned urgency, recorded on the workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}
