use std::sync::Arc;
use std::time::Duration;

use tether::config::{CoordinatorSettings, WorkerSettings};
use tether::runtime::prelude::{
    CancellationToken,
    Coordinator,
    Event,
    Outbound,
    RunReport,
    StatusPolicy,
    TetherError,
    WorkerConfig,
    WorkerOutcome,
};

use crate::fixtures::outbound::{ScriptedOutbound, Step};
use crate::helpers::events::{event_names, EventCollector};

fn scripted(outbound: &Arc<ScriptedOutbound>) -> Arc<dyn Outbound> {
    outbound.clone()
}

fn published_total(report: &RunReport) -> usize {
    report.exits.iter().map(|exit| exit.published as usize).sum()
}

async fn run_bounded(coordinator: Coordinator) -> RunReport {
    tokio::time::timeout(Duration::from_secs(5), coordinator.run())
        .await
        .expect("run should finish")
}

#[tokio::test]
async fn first_failure_becomes_the_reported_cause() {
    let outbound = Arc::new(
        ScriptedOutbound::new()
            .script("a", vec![Step::Fail("boom")])
            .script("b", vec![Step::Status(200)]),
    );
    let collector = EventCollector::new();
    let coordinator = Coordinator::new(scripted(&outbound), collector.sink())
        .with_worker(WorkerConfig::new("a", "a"))
        .with_worker(WorkerConfig::new("b", "b").with_interval(Duration::from_millis(10)));

    let report = run_bounded(coordinator).await;

    let cause = report.cause.clone().expect("cause recorded");
    assert_eq!(cause, TetherError::transport("a", "boom"));
    assert!(cause.to_string().contains("boom"));

    let a = report.exit("a").expect("worker a exit");
    assert_eq!(a.iterations, 1);
    assert_eq!(a.published, 0);
    assert_eq!(a.outcome, WorkerOutcome::Failed(cause.clone()));

    let b = report.exit("b").expect("worker b exit");
    assert_eq!(b.outcome, WorkerOutcome::Cancelled);
    assert_eq!(published_total(&report), report.received.len());
    assert_eq!(outbound.calls("b"), b.iterations);

    let expected = Some(cause.to_string());
    assert_eq!(
        collector.count_where(|event| matches!(event, Event::CollectorCancelled { .. })),
        1
    );
    assert_eq!(
        collector.count_where(|event| matches!(event, Event::RunFinished { .. })),
        1
    );
    let events = collector.events();
    assert!(events
        .iter()
        .any(|event| *event == Event::CollectorCancelled { cause: expected.clone() }));
    assert_eq!(events.last(), Some(&Event::RunFinished { cause: expected }));
}

#[tokio::test]
async fn fatal_status_cancels_with_application_cause() {
    let outbound = Arc::new(
        ScriptedOutbound::new()
            .script("status", vec![Step::Status(200), Step::Status(200), Step::Status(500)])
            .script("delay", vec![Step::Hang]),
    );
    let collector = EventCollector::new();
    let coordinator = Coordinator::new(scripted(&outbound), collector.sink())
        .with_worker(WorkerConfig::new("status", "status"))
        .with_worker(
            WorkerConfig::new("delay", "delay").with_fatal_statuses(StatusPolicy::never()),
        );

    let report = run_bounded(coordinator).await;

    assert_eq!(
        report.cause,
        Some(TetherError::Application {
            origin: "status".to_string(),
            status: 500,
        })
    );
    let status = report.exit("status").expect("status exit");
    assert_eq!(status.iterations, 3);
    assert_eq!(status.published, 2);
    assert_eq!(report.received.len(), 2);
    assert_eq!(published_total(&report), report.received.len());
    assert!(report
        .received
        .iter()
        .all(|payload| payload == "success from status"));

    let delay = report.exit("delay").expect("delay exit");
    assert_eq!(delay.outcome, WorkerOutcome::Cancelled);
    assert!(delay.iterations <= 1);
    assert_eq!(delay.published, 0);
}

#[tokio::test]
async fn always_failing_workers_cancel_within_one_iteration() {
    let outbound = Arc::new(
        ScriptedOutbound::new()
            .script("a", vec![Step::Fail("refused")])
            .script("b", vec![Step::Fail("reset")]),
    );
    let coordinator = Coordinator::new(scripted(&outbound), EventCollector::new().sink())
        .with_worker(WorkerConfig::new("a", "a"))
        .with_worker(WorkerConfig::new("b", "b"));

    let report = run_bounded(coordinator).await;

    assert!(report.received.is_empty());
    let cause = report.cause.expect("cause");
    assert!(
        cause == TetherError::transport("a", "refused")
            || cause == TetherError::transport("b", "reset")
    );
    for exit in &report.exits {
        assert!(exit.iterations <= 1);
    }
    let failed = report
        .exits
        .iter()
        .filter(|exit| matches!(exit.outcome, WorkerOutcome::Failed(_)))
        .count();
    assert_eq!(failed, 1);
}

#[tokio::test]
async fn pre_cancelled_token_runs_nothing() {
    let token = CancellationToken::new();
    token.cancel_with_reason("shutdown before start");
    let outbound = Arc::new(ScriptedOutbound::new());
    let coordinator = Coordinator::new(scripted(&outbound), EventCollector::new().sink())
        .with_worker(WorkerConfig::new("a", "a"))
        .with_worker(WorkerConfig::new("b", "b"))
        .with_token(token);

    let report = run_bounded(coordinator).await;

    assert!(report.received.is_empty());
    assert_eq!(report.cause, Some(TetherError::cancelled("shutdown before start")));
    assert_eq!(outbound.calls("a"), 0);
    assert_eq!(outbound.calls("b"), 0);
}

#[tokio::test]
async fn outer_cancellation_stops_healthy_workers() {
    let outbound = Arc::new(
        ScriptedOutbound::new()
            .script("a", vec![Step::Delayed(Duration::from_millis(2))])
            .script("b", vec![Step::Delayed(Duration::from_millis(3))]),
    );
    let collector = EventCollector::new();
    let coordinator = Coordinator::new(scripted(&outbound), collector.sink())
        .with_worker(WorkerConfig::new("a", "a"))
        .with_worker(WorkerConfig::new("b", "b"));
    let token = coordinator.token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel_with_reason("outer deadline");
    });
    let report = run_bounded(coordinator).await;

    assert_eq!(report.cause, Some(TetherError::cancelled("outer deadline")));
    assert!(!report.received.is_empty());
    assert_eq!(published_total(&report), report.received.len());
    assert!(report
        .exits
        .iter()
        .all(|exit| exit.outcome == WorkerOutcome::Cancelled));

    let names = event_names(&collector.events());
    let cancelled_at = names
        .iter()
        .position(|name| *name == "collector_cancelled")
        .expect("collector cancelled");
    assert!(names[cancelled_at..]
        .iter()
        .all(|name| *name != "result_received"));
    assert_eq!(names.last(), Some(&"run_finished"));
}

#[tokio::test]
async fn echoed_header_reaches_the_collector() {
    let outbound = Arc::new(ScriptedOutbound::new().script(
        "delay",
        vec![
            Step::StatusWithHeader(200, "Date", "Wed, 03 Jan 2024 10:00:00 GMT"),
            Step::Status(500),
        ],
    ));
    let coordinator = Coordinator::new(scripted(&outbound), EventCollector::new().sink())
        .with_worker(
            WorkerConfig::new("delay", "delay")
                .with_echo_header("date")
                .with_interval(Duration::from_millis(100)),
        );

    let report = run_bounded(coordinator).await;

    assert_eq!(
        report.received,
        vec!["success from delay: Wed, 03 Jan 2024 10:00:00 GMT".to_string()]
    );
    assert_eq!(
        report.cause,
        Some(TetherError::Application {
            origin: "delay".to_string(),
            status: 500,
        })
    );
}

#[test]
fn settings_without_workers_are_rejected() {
    let settings = CoordinatorSettings {
        request_timeout_ms: 1_000,
        workers: Vec::new(),
    };
    let outbound: Arc<dyn Outbound> = Arc::new(ScriptedOutbound::new());
    let err = Coordinator::from_settings(&settings, outbound, EventCollector::new().sink())
        .err()
        .expect("empty worker list rejected");
    assert!(matches!(err, TetherError::Config { .. }));
}

#[tokio::test]
async fn settings_build_the_configured_workers() {
    let settings = CoordinatorSettings {
        request_timeout_ms: 1_000,
        workers: vec![WorkerSettings {
            name: "status".to_string(),
            target: "status".to_string(),
            interval_ms: 0,
            fatal_statuses: vec![503],
            echo_header: None,
        }],
    };
    let outbound = Arc::new(
        ScriptedOutbound::new().script("status", vec![Step::Status(500), Step::Status(503)]),
    );
    let coordinator = Coordinator::from_settings(
        &settings,
        outbound.clone() as Arc<dyn Outbound>,
        EventCollector::new().sink(),
    )
    .expect("coordinator");

    let report = run_bounded(coordinator).await;

    assert_eq!(
        report.cause,
        Some(TetherError::Application {
            origin: "status".to_string(),
            status: 503,
        })
    );
    assert_eq!(outbound.calls("status"), 2);
}
