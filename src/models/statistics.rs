use crate::models::Strategy;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Half-open time range `[start, end)` over workflow completion times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StatisticsWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window ending now and reaching `span` into the past
    pub fn last(span: Duration) -> Self {
        let end = Utc::now();
        Self {
            start: end - span,
            // Include records stamped in the same instant as the query
            end: end + Duration::milliseconds(1),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub count: usize,
    pub successes: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub window: StatisticsWindow,
    pub total: usize,
    pub successful: usize,
    pub success_rate: f64,
    /// Share of workflows that sent a DMCA notice where the notice succeeded
    pub dmca_success_rate: f64,
    /// Share of workflows that requested delisting where delisting succeeded
    pub delisting_success_rate: f64,
    pub avg_processing_time_seconds: f64,
    pub by_strategy: HashMap<Strategy, StrategyStats>,
}

impl StatisticsReport {
    pub fn empty(window: StatisticsWindow) -> Self {
        Self {
            window,
            total: 0,
            successful: 0,
            success_rate: 0.0,
            dmca_success_rate: 0.0,
            delisting_success_rate: 0.0,
            avg_processing_time_seconds: 0.0,
            by_strategy: HashMap::new(),
        }
    }
}
