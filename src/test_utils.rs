//! # Test Utilities
//!
//! Scripted in-memory collaborators for unit and integration tests. Each fake
//! counts its calls so tests can assert which channels were touched, and can
//! be told to fail, stall, or panic.

use crate::collaborators::{
    DelistingManager, DelistingMonitor, DelistingReason, DelistingRequestState,
    DelistingRequestStatus, HostProvider, OutcomeMetrics, OutcomeRecord, PerformanceMetrics,
    SearchEngineDelistingService, TakedownOutcome, TakedownProcessor, TakedownStatus,
};
use crate::constants::services;
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::metrics::InMemoryOutcomeLog;
use crate::models::{EngineOutcome, EngineRequestStatus, ProfileData, SearchEngine};
use crate::orchestration::Collaborators;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn stall(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Takedown processor with a scripted host lookup and notice outcome
#[derive(Debug)]
pub struct FakeTakedownProcessor {
    host: Mutex<CollaboratorResult<HostProvider>>,
    submit_status: Mutex<TakedownStatus>,
    submit_error: Mutex<Option<CollaboratorError>>,
    check: Mutex<CollaboratorResult<TakedownStatus>>,
    delay: Duration,
    panic_on_submit: bool,
    panic_on_lookup: bool,
    hang_on_lookup: bool,
    hang_on_check: bool,
    identify_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    check_calls: AtomicUsize,
}

impl Default for FakeTakedownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTakedownProcessor {
    /// Host with an abuse contact; notices are sent
    pub fn new() -> Self {
        Self {
            host: Mutex::new(Ok(HostProvider {
                host_provider_id: "cheap-hosting-ltd".to_string(),
                abuse_email: Some("abuse@cheap-hosting.example".to_string()),
            })),
            submit_status: Mutex::new(TakedownStatus::Sent),
            submit_error: Mutex::new(None),
            check: Mutex::new(Ok(TakedownStatus::Sent)),
            delay: Duration::ZERO,
            panic_on_submit: false,
            panic_on_lookup: false,
            hang_on_lookup: false,
            hang_on_check: false,
            identify_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            check_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_host(self, host_provider_id: &str, abuse_email: Option<&str>) -> Self {
        *self.host.lock() = Ok(HostProvider {
            host_provider_id: host_provider_id.to_string(),
            abuse_email: abuse_email.map(str::to_string),
        });
        self
    }

    pub fn without_contact(self) -> Self {
        if let Ok(host) = self.host.lock().as_mut() {
            host.abuse_email = None;
        }
        self
    }

    pub fn with_host_error(self, error: CollaboratorError) -> Self {
        *self.host.lock() = Err(error);
        self
    }

    pub fn with_status(self, status: TakedownStatus) -> Self {
        self.set_status(status);
        self
    }

    /// Change the notice outcome on a shared instance
    pub fn set_status(&self, status: TakedownStatus) {
        *self.submit_status.lock() = status;
    }

    pub fn with_submit_error(self, error: CollaboratorError) -> Self {
        *self.submit_error.lock() = Some(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_submit = true;
        self
    }

    pub fn panicking_on_lookup(mut self) -> Self {
        self.panic_on_lookup = true;
        self
    }

    /// Host lookup never answers
    pub fn hanging_on_lookup(mut self) -> Self {
        self.hang_on_lookup = true;
        self
    }

    /// Status checks never answer
    pub fn hanging_on_check(mut self) -> Self {
        self.hang_on_check = true;
        self
    }

    pub fn with_check_status(self, status: TakedownStatus) -> Self {
        *self.check.lock() = Ok(status);
        self
    }

    pub fn with_check_error(self, error: CollaboratorError) -> Self {
        *self.check.lock() = Err(error);
        self
    }

    pub fn identify_calls(&self) -> usize {
        self.identify_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TakedownProcessor for FakeTakedownProcessor {
    async fn identify_host_provider(&self, _url: &str) -> CollaboratorResult<HostProvider> {
        self.identify_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_lookup {
            panic!("host lookup exploded");
        }
        if self.hang_on_lookup {
            std::future::pending::<()>().await;
        }
        self.host.lock().clone()
    }

    async fn submit_takedown(
        &self,
        _url: &str,
        _profile: &ProfileData,
        _original_content_url: Option<&str>,
    ) -> CollaboratorResult<TakedownOutcome> {
        let call = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        stall(self.delay).await;
        if self.panic_on_submit {
            panic!("takedown processor exploded");
        }
        if let Some(error) = self.submit_error.lock().clone() {
            return Err(error);
        }
        let status = *self.submit_status.lock();
        Ok(TakedownOutcome {
            takedown_id: Some(format!("td-{call}")),
            status,
            message: format!("notice {}", status.as_str()),
        })
    }

    async fn check_status(&self, _takedown_id: &str) -> CollaboratorResult<TakedownStatus> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_check {
            std::future::pending::<()>().await;
        }
        self.check.lock().clone()
    }
}

/// Delisting manager that accepts requests on a fixed set of engines
#[derive(Debug, Default)]
pub struct FakeDelistingManager {
    succeeding: Vec<SearchEngine>,
    submit_error: Option<CollaboratorError>,
    status_error: Option<CollaboratorError>,
    delay: Duration,
    requests: Mutex<HashMap<String, Vec<SearchEngine>>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl FakeDelistingManager {
    /// Every engine reports `Failed`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeeding_on(mut self, engines: &[SearchEngine]) -> Self {
        self.succeeding = engines.to_vec();
        self
    }

    pub fn with_submit_error(mut self, error: CollaboratorError) -> Self {
        self.submit_error = Some(error);
        self
    }

    pub fn with_status_error(mut self, error: CollaboratorError) -> Self {
        self.status_error = Some(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Engines named in each submitted request, in submission order
    pub fn requested_engines(&self) -> Vec<Vec<SearchEngine>> {
        let requests = self.requests.lock();
        let mut ids: Vec<&String> = requests.keys().collect();
        ids.sort_by_key(|id| {
            id.trim_start_matches("req-")
                .parse::<usize>()
                .unwrap_or(usize::MAX)
        });
        ids.into_iter().map(|id| requests[id].clone()).collect()
    }
}

#[async_trait]
impl DelistingManager for FakeDelistingManager {
    async fn submit_url_removal(
        &self,
        _url: &str,
        engines: &[SearchEngine],
        _reason: DelistingReason,
        _evidence_url: Option<&str>,
    ) -> CollaboratorResult<String> {
        let call = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        stall(self.delay).await;
        if let Some(error) = &self.submit_error {
            return Err(error.clone());
        }
        let request_id = format!("req-{call}");
        self.requests
            .lock()
            .insert(request_id.clone(), engines.to_vec());
        Ok(request_id)
    }

    async fn get_request_status(
        &self,
        request_id: &str,
    ) -> CollaboratorResult<DelistingRequestStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.status_error {
            return Err(error.clone());
        }
        let engines = self.requests.lock().get(request_id).cloned().ok_or_else(|| {
            CollaboratorError::InvalidResponse {
                service: services::DELISTING_MANAGER.to_string(),
                reason: format!("unknown request {request_id}"),
            }
        })?;

        let results: HashMap<SearchEngine, EngineOutcome> = engines
            .iter()
            .map(|engine| {
                let status = if self.succeeding.contains(engine) {
                    EngineRequestStatus::Submitted
                } else {
                    EngineRequestStatus::Failed
                };
                (*engine, EngineOutcome::new(status))
            })
            .collect();
        let accepted = results.values().filter(|o| o.is_successful()).count();
        let status = match accepted {
            0 => DelistingRequestState::Failed,
            n if n == results.len() => DelistingRequestState::Completed,
            _ => DelistingRequestState::PartiallyCompleted,
        };
        Ok(DelistingRequestStatus { status, results })
    }
}

/// Delisting monitor reporting a fixed rate, or unavailable
#[derive(Debug)]
pub struct FakeDelistingMonitor {
    metrics: CollaboratorResult<PerformanceMetrics>,
}

impl FakeDelistingMonitor {
    pub fn with_rate(success_rate: Option<f64>) -> Self {
        Self {
            metrics: Ok(PerformanceMetrics {
                success_rate,
                avg_processing_time_seconds: 0.0,
            }),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            metrics: Err(CollaboratorError::unavailable(
                services::DELISTING_MONITOR,
                "metrics backend offline",
            )),
        }
    }
}

#[async_trait]
impl DelistingMonitor for FakeDelistingMonitor {
    async fn get_performance_metrics(
        &self,
        _window: Option<Duration>,
    ) -> CollaboratorResult<PerformanceMetrics> {
        self.metrics.clone()
    }
}

/// Index checker; reports nothing indexed unless told otherwise
#[derive(Debug, Default)]
pub struct FakeSearchEngineService {
    indexed: HashMap<SearchEngine, bool>,
    error: Option<CollaboratorError>,
    hang: bool,
    panic: bool,
    verify_calls: AtomicUsize,
}

impl FakeSearchEngineService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default engines are checked; the given ones are still indexed
    pub fn indexed_on(mut self, engines: &[SearchEngine]) -> Self {
        self.indexed = SearchEngine::defaults()
            .into_iter()
            .chain(engines.iter().copied())
            .map(|engine| (engine, engines.contains(&engine)))
            .collect();
        self
    }

    pub fn with_error(mut self, error: CollaboratorError) -> Self {
        self.error = Some(error);
        self
    }

    /// Index checks never answer
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchEngineDelistingService for FakeSearchEngineService {
    async fn verify_url_removal(&self, _url: &str) -> CollaboratorResult<HashMap<SearchEngine, bool>> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic {
            panic!("index checker exploded");
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(self.indexed.clone()),
        }
    }
}

/// Outcome sink that ignores writes and answers one fixed host rate
#[derive(Debug)]
pub struct StaticOutcomeMetrics {
    rate: Option<f64>,
    recorded: AtomicUsize,
}

impl StaticOutcomeMetrics {
    pub fn with_rate(rate: Option<f64>) -> Self {
        Self {
            rate,
            recorded: AtomicUsize::new(0),
        }
    }

    pub fn recorded(&self) -> usize {
        self.recorded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutcomeMetrics for StaticOutcomeMetrics {
    async fn record_outcome(&self, _record: OutcomeRecord) -> CollaboratorResult<()> {
        self.recorded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn dmca_success_rate(&self, _host_provider_id: &str) -> CollaboratorResult<Option<f64>> {
        Ok(self.rate)
    }
}

/// Bundle of fakes that keeps typed handles for assertions
#[derive(Debug, Clone)]
pub struct TestCollaborators {
    pub processor: Arc<FakeTakedownProcessor>,
    pub delisting_manager: Arc<FakeDelistingManager>,
    pub monitor: Arc<FakeDelistingMonitor>,
    pub search_service: Arc<FakeSearchEngineService>,
    pub outcome_log: Arc<InMemoryOutcomeLog>,
}

impl Default for TestCollaborators {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCollaborators {
    pub fn new() -> Self {
        Self {
            processor: Arc::new(FakeTakedownProcessor::new()),
            delisting_manager: Arc::new(FakeDelistingManager::new()),
            monitor: Arc::new(FakeDelistingMonitor::with_rate(None)),
            search_service: Arc::new(FakeSearchEngineService::new()),
            outcome_log: Arc::new(InMemoryOutcomeLog::new(1_000, 1)),
        }
    }

    pub fn with_processor(mut self, processor: FakeTakedownProcessor) -> Self {
        self.processor = Arc::new(processor);
        self
    }

    pub fn with_delisting_manager(mut self, manager: FakeDelistingManager) -> Self {
        self.delisting_manager = Arc::new(manager);
        self
    }

    pub fn with_monitor(mut self, monitor: FakeDelistingMonitor) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn with_search_service(mut self, search_service: FakeSearchEngineService) -> Self {
        self.search_service = Arc::new(search_service);
        self
    }

    pub fn with_outcome_log(mut self, outcome_log: InMemoryOutcomeLog) -> Self {
        self.outcome_log = Arc::new(outcome_log);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            takedown_processor: self.processor.clone(),
            delisting_manager: self.delisting_manager.clone(),
            delisting_monitor: self.monitor.clone(),
            search_service: self.search_service.clone(),
            outcome_metrics: self.outcome_log.clone(),
        }
    }
}
