//! Bounded in-memory outcome sink.
//!
//! Keeps the most recent outcome records and derives per-host DMCA success
//! rates from them. Suitable for a single process; a shared metrics store
//! implements [`OutcomeMetrics`] the same way.

use crate::collaborators::{OutcomeMetrics, OutcomeRecord};
use crate::config::StatisticsConfig;
use crate::error::CollaboratorResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::VecDeque;
use tracing::trace;

#[derive(Debug)]
pub struct InMemoryOutcomeLog {
    records: RwLock<VecDeque<OutcomeRecord>>,
    capacity: usize,
    min_host_samples: usize,
}

impl InMemoryOutcomeLog {
    pub fn new(capacity: usize, min_host_samples: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            min_host_samples,
        }
    }

    pub fn from_config(config: &StatisticsConfig) -> Self {
        Self::new(config.outcome_log_capacity, config.min_host_samples)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshot of retained records, oldest first
    pub fn records(&self) -> Vec<OutcomeRecord> {
        self.records.read().iter().cloned().collect()
    }

    fn host_rate(&self, host_provider_id: &str) -> Option<f64> {
        let records = self.records.read();
        let (attempts, successes) = records
            .iter()
            .filter(|r| r.dmca_invoked && r.host_provider_id.as_deref() == Some(host_provider_id))
            .fold((0usize, 0usize), |(attempts, successes), r| {
                (attempts + 1, successes + usize::from(r.dmca_successful))
            });

        if attempts == 0 || attempts < self.min_host_samples {
            return None;
        }
        Some(successes as f64 / attempts as f64)
    }
}

#[async_trait]
impl OutcomeMetrics for InMemoryOutcomeLog {
    async fn record_outcome(&self, record: OutcomeRecord) -> CollaboratorResult<()> {
        let mut records = self.records.write();
        if records.len() == self.capacity {
            records.pop_front();
        }
        trace!(workflow_id = %record.workflow_id, retained = records.len() + 1, "Outcome recorded");
        records.push_back(record);
        Ok(())
    }

    async fn dmca_success_rate(&self, host_provider_id: &str) -> CollaboratorResult<Option<f64>> {
        Ok(self.host_rate(host_provider_id))
    }
}
