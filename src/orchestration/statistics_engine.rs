//! # Statistics Engine
//!
//! Write side: records each finished workflow to the outcome metrics sink
//! (which feeds [`HistoricalRateStore`](super::rates::HistoricalRateStore))
//! and to OpenTelemetry instruments.
//!
//! Read side: success-rate reports over finalized workflows whose
//! `completed_at` falls inside a window.

use crate::collaborators::{OutcomeMetrics, OutcomeRecord};
use crate::error::TakedownResult;
use crate::metrics::orchestration::{workflow_duration, workflows_completed_total};
use crate::models::{StatisticsReport, StatisticsWindow, StrategyStats, Workflow};
use crate::repository::WorkflowRepository;
use chrono::Utc;
use opentelemetry::KeyValue;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct StatisticsEngine {
    repository: Arc<dyn WorkflowRepository>,
    outcome_metrics: Arc<dyn OutcomeMetrics>,
}

impl StatisticsEngine {
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        outcome_metrics: Arc<dyn OutcomeMetrics>,
    ) -> Self {
        Self {
            repository,
            outcome_metrics,
        }
    }

    /// Record a finished workflow; sink failures are logged, not returned
    pub async fn record(&self, workflow: &Workflow) {
        let record = outcome_record(workflow);
        let labels = [
            KeyValue::new("strategy", workflow.strategy.as_str()),
            KeyValue::new("status", workflow.status.as_str()),
        ];
        workflows_completed_total().add(1, &labels);
        workflow_duration().record(
            record.processing_time_ms as f64,
            &[KeyValue::new("strategy", workflow.strategy.as_str())],
        );

        if let Err(e) = self.outcome_metrics.record_outcome(record).await {
            warn!(
                workflow_id = %workflow.workflow_id,
                error = %e,
                "Failed to record workflow outcome"
            );
        }
    }

    pub async fn report(&self, window: StatisticsWindow) -> TakedownResult<StatisticsReport> {
        let workflows = self.repository.list_since(window.start).await?;
        let report = compute_report(window, &workflows);
        debug!(
            total = report.total,
            success_rate = report.success_rate,
            "Statistics report computed"
        );
        Ok(report)
    }
}

fn outcome_record(workflow: &Workflow) -> OutcomeRecord {
    OutcomeRecord {
        workflow_id: workflow.workflow_id,
        strategy: workflow.strategy,
        host_provider_id: workflow.dmca_result.host_provider_id.clone(),
        dmca_invoked: workflow.dmca_result.invoked,
        dmca_successful: workflow.dmca_result.successful,
        delisting_invoked: workflow.delisting_result.invoked,
        delisting_successful: workflow.delisting_result.successful,
        overall_success: workflow.overall_success,
        processing_time_ms: workflow
            .processing_time
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0),
        recorded_at: workflow.completed_at.unwrap_or_else(Utc::now),
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Build a report from finalized workflows; records outside `window` are skipped
pub fn compute_report(window: StatisticsWindow, workflows: &[Workflow]) -> StatisticsReport {
    let in_window: Vec<&Workflow> = workflows
        .iter()
        .filter(|w| w.completed_at.is_some_and(|at| window.contains(at)))
        .collect();

    if in_window.is_empty() {
        return StatisticsReport::empty(window);
    }

    let total = in_window.len();
    let successful = in_window.iter().filter(|w| w.overall_success).count();

    let dmca_attempts = in_window.iter().filter(|w| w.dmca_result.invoked).count();
    let dmca_successes = in_window
        .iter()
        .filter(|w| w.dmca_result.invoked && w.dmca_result.successful)
        .count();
    let delisting_attempts = in_window
        .iter()
        .filter(|w| w.delisting_result.invoked)
        .count();
    let delisting_successes = in_window
        .iter()
        .filter(|w| w.delisting_result.invoked && w.delisting_result.successful)
        .count();

    let total_seconds: f64 = in_window
        .iter()
        .map(|w| w.processing_time.map(|d| d.as_secs_f64()).unwrap_or(0.0))
        .sum();

    let mut by_strategy: HashMap<_, StrategyStats> = HashMap::new();
    for workflow in &in_window {
        let stats = by_strategy.entry(workflow.strategy).or_default();
        stats.count += 1;
        stats.successes += usize::from(workflow.overall_success);
    }
    for stats in by_strategy.values_mut() {
        stats.success_rate = ratio(stats.successes, stats.count);
    }

    StatisticsReport {
        window,
        total,
        successful,
        success_rate: ratio(successful, total),
        dmca_success_rate: ratio(dmca_successes, dmca_attempts),
        delisting_success_rate: ratio(delisting_successes, delisting_attempts),
        avg_processing_time_seconds: total_seconds / total as f64,
        by_strategy,
    }
}
