//! # Takedown Configuration System
//!
//! Layered configuration for the orchestration core. Every value has a
//! compiled-in default; files and environment variables override them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use takedown_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let timeout = manager.config().orchestration.dmca_timeout();
//! let delay = manager.config().verification.delay();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{capacity, strategy, timing};
use crate::models::SearchEngine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TakedownConfig {
    /// Channel execution settings
    pub orchestration: OrchestrationConfig,

    /// Strategy selection thresholds and fallback rates
    pub strategy: StrategyConfig,

    /// Post-success verification scheduling
    pub verification: VerificationConfig,

    /// Outcome log and statistics settings
    pub statistics: StatisticsConfig,

    /// Workflow storage bounds
    pub repository: RepositoryConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    pub dmca_timeout_seconds: u64,
    pub delisting_timeout_seconds: u64,
    /// Engines targeted when the caller does not name any
    pub default_search_engines: Vec<SearchEngine>,
    /// Serialize overlapping requests for the same URL
    pub serialize_same_url: bool,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            dmca_timeout_seconds: timing::DMCA_TIMEOUT_SECONDS,
            delisting_timeout_seconds: timing::DELISTING_TIMEOUT_SECONDS,
            default_search_engines: SearchEngine::defaults(),
            serialize_same_url: true,
        }
    }
}

impl OrchestrationConfig {
    pub fn dmca_timeout(&self) -> Duration {
        Duration::from_secs(self.dmca_timeout_seconds)
    }

    pub fn delisting_timeout(&self) -> Duration {
        Duration::from_secs(self.delisting_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub default_dmca_success_rate: f64,
    pub default_delisting_success_rate: f64,
    pub high_confidence_threshold: f64,
    pub delisting_metrics_window_hours: u64,
    /// Deciding takes at most this long; past it the decision falls back
    pub selection_timeout_seconds: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            default_dmca_success_rate: strategy::DEFAULT_DMCA_SUCCESS_RATE,
            default_delisting_success_rate: strategy::DEFAULT_DELISTING_SUCCESS_RATE,
            high_confidence_threshold: strategy::HIGH_CONFIDENCE_THRESHOLD,
            delisting_metrics_window_hours: strategy::DELISTING_METRICS_WINDOW_HOURS,
            selection_timeout_seconds: timing::SELECTION_TIMEOUT_SECONDS,
        }
    }
}

impl StrategyConfig {
    pub fn delisting_metrics_window(&self) -> Duration {
        Duration::from_secs(self.delisting_metrics_window_hours * 3600)
    }

    pub fn selection_timeout(&self) -> Duration {
        Duration::from_secs(self.selection_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub enabled: bool,
    pub delay_seconds: u64,
    pub check_timeout_seconds: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_seconds: timing::VERIFICATION_DELAY_SECONDS,
            check_timeout_seconds: timing::VERIFICATION_CHECK_TIMEOUT_SECONDS,
        }
    }
}

impl VerificationConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StatisticsConfig {
    pub outcome_log_capacity: usize,
    /// Host providers with fewer recorded outcomes fall back to the default rate
    pub min_host_samples: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            outcome_log_capacity: capacity::OUTCOME_LOG_CAPACITY,
            min_host_samples: capacity::MIN_HOST_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub history_capacity: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            history_capacity: capacity::HISTORY_CAPACITY,
        }
    }
}

impl TakedownConfig {
    /// Reject values that would make orchestration misbehave silently
    pub fn validate(&self) -> ConfigResult<()> {
        let rates = [
            (
                "strategy.default_dmca_success_rate",
                self.strategy.default_dmca_success_rate,
            ),
            (
                "strategy.default_delisting_success_rate",
                self.strategy.default_delisting_success_rate,
            ),
            (
                "strategy.high_confidence_threshold",
                self.strategy.high_confidence_threshold,
            ),
        ];
        for (field, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value,
                    "must be between 0.0 and 1.0",
                ));
            }
        }

        if self.orchestration.dmca_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "orchestration.dmca_timeout_seconds",
                0,
                "timeout must be positive",
            ));
        }
        if self.orchestration.delisting_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "orchestration.delisting_timeout_seconds",
                0,
                "timeout must be positive",
            ));
        }
        let budgets = [
            (
                "strategy.selection_timeout_seconds",
                self.strategy.selection_timeout_seconds,
            ),
            (
                "verification.check_timeout_seconds",
                self.verification.check_timeout_seconds,
            ),
        ];
        for (field, value) in budgets {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value,
                    "timeout must be positive",
                ));
            }
        }
        if self.orchestration.default_search_engines.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "orchestration.default_search_engines",
                "[]",
                "at least one search engine is required",
            ));
        }
        if self.statistics.outcome_log_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "statistics.outcome_log_capacity",
                0,
                "capacity must be positive",
            ));
        }
        if self.repository.history_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "repository.history_capacity",
                0,
                "capacity must be positive",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TakedownConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.verification.delay(), Duration::from_secs(7200));
        assert_eq!(config.orchestration.default_search_engines.len(), 3);
        assert!((config.strategy.high_confidence_threshold - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_out_of_range_rate() {
        let mut config = TakedownConfig::default();
        config.strategy.default_dmca_success_rate = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("strategy.default_dmca_success_rate"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout_and_empty_engines() {
        let mut config = TakedownConfig::default();
        config.orchestration.delisting_timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = TakedownConfig::default();
        config.orchestration.default_search_engines.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_lookup_budgets() {
        let mut config = TakedownConfig::default();
        config.strategy.selection_timeout_seconds = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("strategy.selection_timeout_seconds"));

        let mut config = TakedownConfig::default();
        config.verification.check_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }
}
