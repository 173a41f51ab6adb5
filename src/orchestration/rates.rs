//! # Historical Rate Store
//!
//! Read-only view over past remediation outcomes: per-host DMCA success
//! rates from the outcome metrics sink and the current delisting success
//! rate from the delisting monitor.

use crate::collaborators::{DelistingMonitor, OutcomeMetrics};
use crate::error::CollaboratorResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

#[derive(Clone)]
pub struct HistoricalRateStore {
    outcome_metrics: Arc<dyn OutcomeMetrics>,
    delisting_monitor: Arc<dyn DelistingMonitor>,
    delisting_window: Duration,
}

impl HistoricalRateStore {
    pub fn new(
        outcome_metrics: Arc<dyn OutcomeMetrics>,
        delisting_monitor: Arc<dyn DelistingMonitor>,
        delisting_window: Duration,
    ) -> Self {
        Self {
            outcome_metrics,
            delisting_monitor,
            delisting_window,
        }
    }

    /// DMCA success rate for a host provider; `None` when history is too thin
    pub async fn dmca_success_rate(&self, host_provider_id: &str) -> CollaboratorResult<Option<f64>> {
        let rate = self
            .outcome_metrics
            .dmca_success_rate(host_provider_id)
            .await?
            .map(clamp_rate);
        trace!(host_provider_id = %host_provider_id, rate = ?rate, "DMCA success rate lookup");
        Ok(rate)
    }

    /// Delisting success rate over the configured window; `None` without data
    pub async fn delisting_success_rate(&self) -> CollaboratorResult<Option<f64>> {
        let metrics = self
            .delisting_monitor
            .get_performance_metrics(Some(self.delisting_window))
            .await?;
        trace!(rate = ?metrics.success_rate, "Delisting success rate lookup");
        Ok(metrics.success_rate.map(clamp_rate))
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        0.0
    } else {
        rate.clamp(0.0, 1.0)
    }
}
