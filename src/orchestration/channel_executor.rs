//! # Channel Executor
//!
//! Runs one remediation channel sub-call. Every collaborator await is bounded
//! by the channel deadline, and every failure (error value, timeout, or panic
//! inside the collaborator future) becomes an unsuccessful sub-result. Nothing
//! raised here reaches the orchestrator.

use crate::collaborators::{DelistingManager, DelistingReason, TakedownProcessor};
use crate::constants::{events, services};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::logging::log_channel_operation;
use crate::metrics::orchestration::channel_failures_total;
use crate::models::{DelistingResult, DmcaResult, ProfileData, SearchEngine};
use futures::FutureExt;
use opentelemetry::KeyValue;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Remediation channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Dmca,
    Delisting,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dmca => "dmca",
            Self::Delisting => "delisting",
        }
    }

    fn service(&self) -> &'static str {
        match self {
            Self::Dmca => services::TAKEDOWN_PROCESSOR,
            Self::Delisting => services::DELISTING_MANAGER,
        }
    }
}

/// Why a guarded sub-call produced no value
#[derive(Debug, Clone, PartialEq)]
enum CallFailure {
    Collaborator(CollaboratorError),
    Panicked(String),
}

impl CallFailure {
    fn reason(&self) -> &'static str {
        match self {
            Self::Collaborator(e) => e.kind(),
            Self::Panicked(_) => "panic",
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Collaborator(e) => e.to_string(),
            Self::Panicked(msg) => format!("collaborator panicked: {msg}"),
        }
    }
}

#[derive(Clone)]
pub struct ChannelExecutor {
    takedown_processor: Arc<dyn TakedownProcessor>,
    delisting_manager: Arc<dyn DelistingManager>,
    dmca_timeout: Duration,
    delisting_timeout: Duration,
}

impl ChannelExecutor {
    pub fn new(
        takedown_processor: Arc<dyn TakedownProcessor>,
        delisting_manager: Arc<dyn DelistingManager>,
        dmca_timeout: Duration,
        delisting_timeout: Duration,
    ) -> Self {
        Self {
            takedown_processor,
            delisting_manager,
            dmca_timeout,
            delisting_timeout,
        }
    }

    /// Send a DMCA notice for `url`
    pub async fn run_dmca(
        &self,
        url: &str,
        profile: &ProfileData,
        original_content_url: Option<&str>,
    ) -> DmcaResult {
        let started = Instant::now();
        let deadline = started + self.dmca_timeout;
        let call = self
            .takedown_processor
            .submit_takedown(url, profile, original_content_url);

        let result = match guarded(Channel::Dmca, deadline, self.dmca_timeout, call).await {
            Ok(outcome) => {
                let successful = outcome.status.is_successful();
                let message = if successful {
                    format!("DMCA notice {}: {}", outcome.status.as_str(), outcome.message)
                } else {
                    format!(
                        "DMCA notice not successful ({}): {}",
                        outcome.status.as_str(),
                        outcome.message
                    )
                };
                if !successful {
                    record_failure(Channel::Dmca, "unsuccessful");
                }
                DmcaResult {
                    invoked: true,
                    successful,
                    message,
                    takedown_id: outcome.takedown_id,
                    host_provider_id: None,
                }
            }
            Err(failure) => DmcaResult {
                invoked: true,
                successful: false,
                message: format!("DMCA sub-call failed: {}", failure.describe()),
                takedown_id: None,
                host_provider_id: None,
            },
        };

        log_channel_operation(
            Channel::Dmca.as_str(),
            url,
            result.successful,
            started.elapsed(),
            &result.message,
        );
        result
    }

    /// File delisting requests for `url` and read back per-engine results
    pub async fn run_delisting(
        &self,
        url: &str,
        engines: &[SearchEngine],
        evidence_url: Option<&str>,
    ) -> DelistingResult {
        let started = Instant::now();
        let deadline = started + self.delisting_timeout;
        let mut result = DelistingResult {
            invoked: true,
            ..Default::default()
        };

        let submit = self.delisting_manager.submit_url_removal(
            url,
            engines,
            DelistingReason::CopyrightInfringement,
            evidence_url,
        );
        let request_id =
            match guarded(Channel::Delisting, deadline, self.delisting_timeout, submit).await {
                Ok(request_id) => request_id,
                Err(failure) => {
                    result.message = format!("Delisting submission failed: {}", failure.describe());
                    log_channel_operation(
                        Channel::Delisting.as_str(),
                        url,
                        false,
                        started.elapsed(),
                        &result.message,
                    );
                    return result;
                }
            };
        result.request_id = Some(request_id.clone());

        let status = self.delisting_manager.get_request_status(&request_id);
        match guarded(Channel::Delisting, deadline, self.delisting_timeout, status).await {
            Ok(status) => {
                result.per_engine_results = status.results;
                let accepted = result.successful_engines();
                result.successful = !accepted.is_empty();
                result.message = if result.successful {
                    let names: Vec<&str> = accepted.iter().map(SearchEngine::as_str).collect();
                    format!("Delisting accepted by {}", names.join(", "))
                } else {
                    record_failure(Channel::Delisting, "unsuccessful");
                    format!(
                        "Delisting not accepted by any of {} engine(s)",
                        result.per_engine_results.len()
                    )
                };
            }
            Err(failure) => {
                result.message = format!(
                    "Delisting request {request_id} status unavailable: {}",
                    failure.describe()
                );
            }
        }

        log_channel_operation(
            Channel::Delisting.as_str(),
            url,
            result.successful,
            started.elapsed(),
            &result.message,
        );
        result
    }
}

/// Await a collaborator future under a deadline, absorbing panics
async fn guarded<T, F>(
    channel: Channel,
    deadline: Instant,
    budget: Duration,
    call: F,
) -> Result<T, CallFailure>
where
    F: Future<Output = CollaboratorResult<T>>,
{
    let outcome = match tokio::time::timeout_at(deadline, AssertUnwindSafe(call).catch_unwind()).await
    {
        Err(_elapsed) => Err(CallFailure::Collaborator(CollaboratorError::timeout(
            channel.service(),
            budget,
        ))),
        Ok(Err(panic)) => Err(CallFailure::Panicked(panic_message(panic.as_ref()))),
        Ok(Ok(Err(e))) => Err(CallFailure::Collaborator(e)),
        Ok(Ok(Ok(value))) => Ok(value),
    };

    if let Err(failure) = &outcome {
        warn!(
            event = events::CHANNEL_FAILED,
            channel = channel.as_str(),
            reason = failure.reason(),
            error = %failure.describe(),
            "Channel sub-call failed"
        );
        record_failure(channel, failure.reason());
    }
    outcome
}

fn record_failure(channel: Channel, reason: &'static str) {
    channel_failures_total().add(
        1,
        &[
            KeyValue::new("channel", channel.as_str()),
            KeyValue::new("reason", reason),
        ],
    );
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::TakedownStatus;
    use crate::models::EngineRequestStatus;
    use crate::test_utils::{FakeDelistingManager, FakeTakedownProcessor};

    fn executor(
        processor: FakeTakedownProcessor,
        manager: FakeDelistingManager,
    ) -> (ChannelExecutor, Arc<FakeTakedownProcessor>, Arc<FakeDelistingManager>) {
        let processor = Arc::new(processor);
        let manager = Arc::new(manager);
        let executor = ChannelExecutor::new(
            processor.clone(),
            manager.clone(),
            Duration::from_secs(30),
            Duration::from_secs(30),
        );
        (executor, processor, manager)
    }

    fn profile() -> ProfileData {
        ProfileData::new("creator-1", "Creator One")
    }

    #[tokio::test]
    async fn test_dmca_sent_is_successful() {
        let (executor, processor, _) = executor(
            FakeTakedownProcessor::new().with_status(TakedownStatus::Sent),
            FakeDelistingManager::new(),
        );
        let result = executor
            .run_dmca("https://pirate.example/1", &profile(), Some("https://me.example/1"))
            .await;
        assert!(result.invoked);
        assert!(result.successful);
        assert!(result.takedown_id.is_some());
        assert_eq!(processor.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_dmca_rejection_is_unsuccessful() {
        let (executor, _, _) = executor(
            FakeTakedownProcessor::new().with_status(TakedownStatus::Rejected),
            FakeDelistingManager::new(),
        );
        let result = executor.run_dmca("https://pirate.example/1", &profile(), None).await;
        assert!(!result.successful);
        assert!(result.message.contains("rejected"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dmca_timeout_becomes_unsuccessful() {
        let (executor, _, _) = executor(
            FakeTakedownProcessor::new().with_delay(Duration::from_secs(3600)),
            FakeDelistingManager::new(),
        );
        let result = executor.run_dmca("https://pirate.example/1", &profile(), None).await;
        assert!(!result.successful);
        assert!(result.message.contains("timed out after 30s"), "{}", result.message);
    }

    #[tokio::test]
    async fn test_dmca_panic_becomes_unsuccessful() {
        let (executor, _, _) = executor(
            FakeTakedownProcessor::new().panicking(),
            FakeDelistingManager::new(),
        );
        let result = executor.run_dmca("https://pirate.example/1", &profile(), None).await;
        assert!(!result.successful);
        assert!(result.message.contains("panicked"));
    }

    #[tokio::test]
    async fn test_delisting_success_on_one_engine() {
        let (executor, _, manager) = executor(
            FakeTakedownProcessor::new(),
            FakeDelistingManager::new().succeeding_on(&[SearchEngine::Google]),
        );
        let result = executor
            .run_delisting("https://pirate.example/2", &SearchEngine::defaults(), None)
            .await;
        assert!(result.successful);
        assert!(result.request_id.is_some());
        assert_eq!(result.per_engine_results.len(), 3);
        assert_eq!(
            result.per_engine_results[&SearchEngine::Bing].status,
            EngineRequestStatus::Failed
        );
        assert_eq!(result.message, "Delisting accepted by google");
        assert_eq!(manager.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_delisting_submit_error_is_unsuccessful() {
        let (executor, _, manager) = executor(
            FakeTakedownProcessor::new(),
            FakeDelistingManager::new()
                .with_submit_error(CollaboratorError::unavailable("delisting_manager", "503")),
        );
        let result = executor
            .run_delisting("https://pirate.example/2", &SearchEngine::defaults(), None)
            .await;
        assert!(!result.successful);
        assert!(result.request_id.is_none());
        assert_eq!(manager.status_calls(), 0);
    }

    #[tokio::test]
    async fn test_delisting_status_error_keeps_request_id() {
        let (executor, _, _) = executor(
            FakeTakedownProcessor::new(),
            FakeDelistingManager::new()
                .succeeding_on(&[SearchEngine::Google])
                .with_status_error(CollaboratorError::unavailable("delisting_manager", "502")),
        );
        let result = executor
            .run_delisting("https://pirate.example/2", &SearchEngine::defaults(), None)
            .await;
        assert!(!result.successful);
        assert!(result.request_id.is_some());
        assert!(result.message.contains("status unavailable"));
    }
}
