//! Behavioral guarantees of the orchestration core: channel isolation,
//! ordering, immutability after finalize, retries, single flight and
//! verification.

mod common;

use common::{quiet_config, request, service, service_with};
use std::time::Duration;
use takedown_core::collaborators::TakedownStatus;
use takedown_core::constants::metadata;
use takedown_core::models::{SearchEngine, StatisticsWindow, Strategy};
use takedown_core::test_utils::{
    FakeDelistingManager, FakeSearchEngineService, FakeTakedownProcessor, TestCollaborators,
};
use takedown_core::{TakedownError, WorkflowStatus};
use tokio::time::Instant;

async fn parallel_status(dmca_delay: Duration, delisting_delay: Duration) -> WorkflowStatus {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().with_delay(dmca_delay))
        .with_delisting_manager(
            FakeDelistingManager::new()
                .succeeding_on(&[SearchEngine::Yandex])
                .with_delay(delisting_delay),
        );
    service(&fakes)
        .process_infringement(
            request("https://mirror.example/ep1").with_strategy(Strategy::Parallel),
        )
        .await
        .status
}

#[tokio::test(start_paused = true)]
async fn parallel_outcome_is_independent_of_completion_order() {
    let dmca_first = parallel_status(Duration::from_secs(1), Duration::from_secs(20)).await;
    let delisting_first = parallel_status(Duration::from_secs(20), Duration::from_secs(1)).await;
    let simultaneous = parallel_status(Duration::ZERO, Duration::ZERO).await;

    assert_eq!(dmca_first, WorkflowStatus::BothSuccessful);
    assert_eq!(dmca_first, delisting_first);
    assert_eq!(dmca_first, simultaneous);
}

#[tokio::test(start_paused = true)]
async fn parallel_channels_run_concurrently() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().with_delay(Duration::from_secs(10)))
        .with_delisting_manager(FakeDelistingManager::new().with_delay(Duration::from_secs(10)));
    let service = service(&fakes);

    let started = Instant::now();
    service
        .process_infringement(
            request("https://mirror.example/ep2").with_strategy(Strategy::Parallel),
        )
        .await;
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[tokio::test]
async fn sequential_follow_up_failure_keeps_dmca_status() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().with_status(TakedownStatus::Acknowledged))
        .with_delisting_manager(FakeDelistingManager::new());
    let service = service(&fakes);

    let workflow = service
        .process_infringement(
            request("https://mirror.example/ep3").with_strategy(Strategy::Sequential),
        )
        .await;

    assert_eq!(fakes.delisting_manager.submit_calls(), 1);
    assert!(workflow.delisting_result.invoked);
    assert!(!workflow.delisting_result.successful);
    assert_eq!(workflow.status, WorkflowStatus::DmcaSuccessful);
    assert!(workflow.overall_success);
}

#[tokio::test]
async fn single_channel_strategies_never_touch_the_other_channel() {
    let fakes = TestCollaborators::new()
        .with_delisting_manager(FakeDelistingManager::new().succeeding_on(&[SearchEngine::Bing]));
    let service = service(&fakes);

    service
        .process_infringement(
            request("https://mirror.example/ep4").with_strategy(Strategy::DelistingOnly),
        )
        .await;
    assert_eq!(fakes.processor.submit_calls(), 0);
    assert_eq!(fakes.processor.identify_calls(), 0);

    service
        .process_infringement(
            request("https://mirror.example/ep5").with_strategy(Strategy::DmcaOnly),
        )
        .await;
    assert_eq!(fakes.delisting_manager.submit_calls(), 1);
    assert_eq!(fakes.delisting_manager.status_calls(), 1);
}

#[tokio::test]
async fn blank_abuse_email_selects_delisting_only() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().with_host("offshore-host", Some("  ")));
    let service = service(&fakes);

    let workflow = service
        .process_infringement(request("https://mirror.example/ep6"))
        .await;
    assert_eq!(workflow.strategy, Strategy::DelistingOnly);
    assert_eq!(workflow.metadata_str(metadata::HOST_PROVIDER), Some("offshore-host"));
}

#[tokio::test]
async fn empty_statistics_window_is_zeroed() {
    let service = service(&TestCollaborators::new());
    let report = service
        .get_workflow_statistics(StatisticsWindow::last(chrono::Duration::days(7)))
        .await
        .unwrap();
    assert_eq!(report.total, 0);
    assert_eq!(report.success_rate, 0.0);
    assert_eq!(report.avg_processing_time_seconds, 0.0);
}

#[tokio::test]
async fn finalized_snapshots_are_stable() {
    let fakes = TestCollaborators::new()
        .with_delisting_manager(FakeDelistingManager::new().succeeding_on(&[SearchEngine::Google]));
    let service = service(&fakes);

    let workflow = service
        .process_infringement(request("https://mirror.example/ep7"))
        .await;
    let first = service.get_workflow_status(workflow.workflow_id).await.unwrap();
    let second = service.get_workflow_status(workflow.workflow_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, workflow);
    assert!(first.completed_at.is_some());
    assert!(first.processing_time.is_some());
}

#[tokio::test]
async fn overall_success_matches_status_for_every_strategy() {
    for strategy in Strategy::ALL {
        for dmca in [TakedownStatus::Sent, TakedownStatus::Failed] {
            for engines in [vec![], vec![SearchEngine::Google]] {
                let fakes = TestCollaborators::new()
                    .with_processor(FakeTakedownProcessor::new().with_status(dmca))
                    .with_delisting_manager(FakeDelistingManager::new().succeeding_on(&engines));
                let workflow = service(&fakes)
                    .process_infringement(request("https://mirror.example/ep8").with_strategy(strategy))
                    .await;
                assert_eq!(
                    workflow.overall_success,
                    workflow.status.is_success(),
                    "{strategy} / {dmca:?} / {engines:?}"
                );
            }
        }
    }
}

#[tokio::test]
async fn collaborator_panic_becomes_failed_workflow() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().panicking());
    let service = service(&fakes);

    let workflow = service
        .process_infringement(
            request("https://mirror.example/ep9").with_strategy(Strategy::DmcaOnly),
        )
        .await;

    assert_eq!(workflow.status, WorkflowStatus::Failed);
    assert!(!workflow.overall_success);
    assert!(workflow
        .metadata_str(metadata::ERROR)
        .is_some_and(|error| error.contains("panicked")));
    assert!(service
        .get_workflow_status(workflow.workflow_id)
        .await
        .unwrap()
        .is_finished());
}

#[tokio::test]
async fn host_lookup_panic_falls_back_to_parallel() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().panicking_on_lookup())
        .with_delisting_manager(FakeDelistingManager::new().succeeding_on(&[SearchEngine::Google]));
    let service = service(&fakes);

    let workflow = service
        .process_infringement(request("https://mirror.example/ep10"))
        .await;
    assert_eq!(workflow.strategy, Strategy::Parallel);
    assert_eq!(workflow.metadata_str(metadata::STRATEGY_SOURCE), Some("fallback"));
    assert_eq!(workflow.status, WorkflowStatus::BothSuccessful);
}

#[tokio::test]
async fn retry_creates_new_workflow_and_leaves_original() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().with_status(TakedownStatus::Rejected));
    let service = service(&fakes);

    let failed = service
        .process_infringement(
            request("https://mirror.example/ep11").with_strategy(Strategy::DmcaOnly),
        )
        .await;
    assert_eq!(failed.status, WorkflowStatus::Failed);

    let retried = service.retry_workflow(failed.workflow_id).await.unwrap();
    assert_ne!(retried.workflow_id, failed.workflow_id);
    assert_eq!(retried.url, failed.url);
    assert_eq!(
        retried.metadata_str(metadata::RETRY_OF),
        Some(failed.workflow_id.to_string().as_str())
    );
    assert_eq!(
        service.get_workflow_status(failed.workflow_id).await.unwrap(),
        failed
    );
}

#[tokio::test]
async fn retry_of_unknown_workflow_is_not_found() {
    let service = service(&TestCollaborators::new());
    let id = uuid::Uuid::new_v4();
    assert_eq!(
        service.retry_workflow(id).await.unwrap_err(),
        TakedownError::WorkflowNotFound(id)
    );
}

#[tokio::test(start_paused = true)]
async fn overlapping_requests_for_one_url_are_serialized() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().with_delay(Duration::from_secs(10)));
    let service = service(&fakes);
    let url_request = || request("https://mirror.example/ep12").with_strategy(Strategy::DmcaOnly);

    let started = Instant::now();
    let (a, b) = tokio::join!(
        service.process_infringement(url_request()),
        service.process_infringement(url_request()),
    );

    assert!(started.elapsed() >= Duration::from_secs(20));
    assert_ne!(a.workflow_id, b.workflow_id);
    assert!(a.overall_success && b.overall_success);
}

#[tokio::test(start_paused = true)]
async fn different_urls_proceed_concurrently() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().with_delay(Duration::from_secs(10)));
    let service = service(&fakes);

    let started = Instant::now();
    tokio::join!(
        service.process_infringement(
            request("https://mirror.example/ep13").with_strategy(Strategy::DmcaOnly)
        ),
        service.process_infringement(
            request("https://mirror.example/ep14").with_strategy(Strategy::DmcaOnly)
        ),
    );
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn in_flight_workflows_are_listed_as_active() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().with_delay(Duration::from_secs(60)));
    let service = service(&fakes);

    let running = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .process_infringement(
                    request("https://mirror.example/ep15").with_strategy(Strategy::DmcaOnly),
                )
                .await
        })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    let active = service.list_active_workflows().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].url, "https://mirror.example/ep15");

    let finished = running.await.unwrap();
    assert_eq!(finished.workflow_id, active[0].workflow_id);
    assert!(service.list_active_workflows().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn verification_completes_successful_workflow_later() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().with_check_status(TakedownStatus::ContentRemoved))
        .with_search_service(FakeSearchEngineService::new().indexed_on(&[SearchEngine::Bing]));
    let mut config = quiet_config();
    config.verification.enabled = true;
    config.verification.delay_seconds = 600;
    let service = service_with(&fakes, config);

    let workflow = service
        .process_infringement(
            request("https://mirror.example/ep16").with_strategy(Strategy::DmcaOnly),
        )
        .await;
    assert_eq!(workflow.status, WorkflowStatus::DmcaSuccessful);
    assert_eq!(service.verification().pending_jobs().len(), 1);

    tokio::time::sleep(Duration::from_secs(601)).await;

    let verified = service.get_workflow_status(workflow.workflow_id).await.unwrap();
    assert_eq!(verified.status, WorkflowStatus::Completed);
    assert!(verified.overall_success);
    assert!(!verified.url_accessible);
    assert_eq!(verified.search_engine_indexed.get(&SearchEngine::Bing), Some(&true));
    assert_eq!(
        verified.metadata_str(metadata::VERIFICATION_WARNING),
        Some("still indexed by bing")
    );
    assert!(service.verification().pending_jobs().is_empty());
}

#[tokio::test]
async fn failed_workflows_are_not_verified() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().with_status(TakedownStatus::Failed));
    let mut config = quiet_config();
    config.verification.enabled = true;
    let service = service_with(&fakes, config);

    service
        .process_infringement(
            request("https://mirror.example/ep17").with_strategy(Strategy::DmcaOnly),
        )
        .await;
    assert!(service.verification().pending_jobs().is_empty());
    service.shutdown();
}

#[tokio::test(start_paused = true)]
async fn stalled_host_lookup_falls_back_and_frees_the_url() {
    let fakes = TestCollaborators::new()
        .with_processor(FakeTakedownProcessor::new().hanging_on_lookup())
        .with_delisting_manager(FakeDelistingManager::new().succeeding_on(&[SearchEngine::Google]));
    let service = service(&fakes);

    for _ in 0..2 {
        let workflow = tokio::time::timeout(
            Duration::from_secs(24 * 3600),
            service.process_infringement(request("https://mirror.example/ep18")),
        )
        .await
        .expect("remediation proceeds past a stalled lookup");

        assert_eq!(workflow.strategy, Strategy::Parallel);
        assert_eq!(workflow.metadata_str(metadata::STRATEGY_SOURCE), Some("fallback"));
        assert!(workflow
            .metadata_str(metadata::STRATEGY_ERROR)
            .is_some_and(|error| error.contains("timed out")));
        assert_eq!(workflow.status, WorkflowStatus::BothSuccessful);
    }
    assert_eq!(fakes.processor.identify_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn stalled_index_check_does_not_pin_verification() {
    let fakes = TestCollaborators::new()
        .with_search_service(FakeSearchEngineService::new().hanging());
    let mut config = quiet_config();
    config.verification.enabled = true;
    config.verification.delay_seconds = 600;
    let service = service_with(&fakes, config);

    let workflow = service
        .process_infringement(
            request("https://mirror.example/ep19").with_strategy(Strategy::DmcaOnly),
        )
        .await;
    assert_eq!(workflow.status, WorkflowStatus::DmcaSuccessful);

    tokio::time::sleep(Duration::from_secs(30 * 24 * 3600)).await;

    assert!(service.verification().pending_jobs().is_empty());
    let verified = service.get_workflow_status(workflow.workflow_id).await.unwrap();
    assert_eq!(verified.status, WorkflowStatus::Completed);
    assert_eq!(
        verified.metadata_str(metadata::VERIFICATION_WARNING),
        Some("content still accessible")
    );
}
