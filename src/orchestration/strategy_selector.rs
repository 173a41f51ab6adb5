//! # Strategy Selector
//!
//! Chooses how to pursue the two remediation channels for a URL.
//!
//! 1. No resolvable abuse contact: `DelistingOnly`, a notice has no recipient.
//! 2. Both channel rates above the high-confidence threshold: `Parallel`.
//! 3. DMCA historically more reliable than delisting: `Sequential`.
//! 4. Otherwise: `DelistingOnly`.
//!
//! Any collaborator failure while deciding, including a lookup that outlives
//! `selection_timeout_seconds`, falls back to `Parallel`.

use super::channel_executor::panic_message;
use super::rates::HistoricalRateStore;
use crate::collaborators::{HostProvider, TakedownProcessor};
use crate::config::StrategyConfig;
use crate::constants::events;
use crate::error::CollaboratorError;
use crate::models::{ProfileData, Strategy};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, warn};

/// Why a strategy was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Caller named the strategy
    Requested,
    /// Derived from contact availability and historical rates
    Selected,
    /// Selection failed; conservative default applied
    Fallback,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Selected => "selected",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyDecision {
    pub strategy: Strategy,
    pub source: DecisionSource,
    pub host_provider: Option<HostProvider>,
    pub dmca_success_rate: Option<f64>,
    pub delisting_success_rate: Option<f64>,
    /// Populated when `source` is `Fallback`
    pub error: Option<String>,
}

impl StrategyDecision {
    pub fn requested(strategy: Strategy) -> Self {
        Self {
            strategy,
            source: DecisionSource::Requested,
            host_provider: None,
            dmca_success_rate: None,
            delisting_success_rate: None,
            error: None,
        }
    }

    fn fallback(reason: String) -> Self {
        Self {
            strategy: Strategy::Parallel,
            source: DecisionSource::Fallback,
            host_provider: None,
            dmca_success_rate: None,
            delisting_success_rate: None,
            error: Some(reason),
        }
    }
}

#[derive(Clone)]
pub struct StrategySelector {
    takedown_processor: Arc<dyn TakedownProcessor>,
    rates: HistoricalRateStore,
    config: StrategyConfig,
}

impl StrategySelector {
    pub fn new(
        takedown_processor: Arc<dyn TakedownProcessor>,
        rates: HistoricalRateStore,
        config: StrategyConfig,
    ) -> Self {
        Self {
            takedown_processor,
            rates,
            config,
        }
    }

    pub async fn select(&self, url: &str, profile: &ProfileData) -> Strategy {
        self.decide(url, profile).await.strategy
    }

    /// Choose a strategy and report the inputs that led to it
    pub async fn decide(&self, url: &str, profile: &ProfileData) -> StrategyDecision {
        let budget = self.config.selection_timeout();
        let attempt = AssertUnwindSafe(self.try_decide(url)).catch_unwind();
        let decision = match tokio::time::timeout(budget, attempt).await {
            Err(_elapsed) => {
                let reason = format!("strategy selection timed out after {}s", budget.as_secs());
                warn!(url = %url, error = %reason, "Strategy selection failed, defaulting to parallel");
                StrategyDecision::fallback(reason)
            }
            Ok(Ok(Ok(decision))) => decision,
            Ok(Ok(Err(e))) => {
                warn!(
                    url = %url,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Strategy selection failed, defaulting to parallel"
                );
                StrategyDecision::fallback(e.to_string())
            }
            Ok(Err(panic)) => {
                let reason = format!("strategy selection panicked: {}", panic_message(panic.as_ref()));
                warn!(url = %url, error = %reason, "Strategy selection failed, defaulting to parallel");
                StrategyDecision::fallback(reason)
            }
        };

        info!(
            event = events::STRATEGY_SELECTED,
            url = %url,
            profile_id = %profile.profile_id,
            strategy = %decision.strategy,
            source = decision.source.as_str(),
            dmca_success_rate = ?decision.dmca_success_rate,
            delisting_success_rate = ?decision.delisting_success_rate,
            "Strategy selected"
        );

        decision
    }

    async fn try_decide(&self, url: &str) -> Result<StrategyDecision, CollaboratorError> {
        let host = self.takedown_processor.identify_host_provider(url).await?;

        if !host.has_contact() {
            return Ok(StrategyDecision {
                strategy: Strategy::DelistingOnly,
                source: DecisionSource::Selected,
                host_provider: Some(host),
                dmca_success_rate: None,
                delisting_success_rate: None,
                error: None,
            });
        }

        let dmca_rate = self
            .rates
            .dmca_success_rate(&host.host_provider_id)
            .await?
            .unwrap_or(self.config.default_dmca_success_rate);
        let delisting_rate = self
            .rates
            .delisting_success_rate()
            .await?
            .unwrap_or(self.config.default_delisting_success_rate);

        Ok(StrategyDecision {
            strategy: self.choose(dmca_rate, delisting_rate),
            source: DecisionSource::Selected,
            host_provider: Some(host),
            dmca_success_rate: Some(dmca_rate),
            delisting_success_rate: Some(delisting_rate),
            error: None,
        })
    }

    /// Rate comparison for a URL whose host has an abuse contact
    pub fn choose(&self, dmca_rate: f64, delisting_rate: f64) -> Strategy {
        let threshold = self.config.high_confidence_threshold;
        if dmca_rate > threshold && delisting_rate > threshold {
            Strategy::Parallel
        } else if dmca_rate > delisting_rate {
            Strategy::Sequential
        } else {
            Strategy::DelistingOnly
        }
    }
}
