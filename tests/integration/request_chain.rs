use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;

use tether::runtime::prelude::HttpOutbound;
use tether::server::chain::{first_service, second_service, RemoteProcessor};
use tether::server::tracker::{GuidPropagator, GUID_HEADER};

use crate::fixtures::servers::{body_text, get, get_with_header, send, spawn_router, CaptureLogger};

fn first(remote: String, logger: &CaptureLogger) -> Router {
    let processor = RemoteProcessor::new(
        Arc::new(GuidPropagator),
        Arc::new(logger.clone()),
        Arc::new(HttpOutbound::new(Duration::from_secs(2)).expect("client")),
        remote,
    );
    first_service(Arc::new(processor))
}

async fn spawn_second(logger: &CaptureLogger) -> String {
    let addr = spawn_router(second_service(Arc::new(logger.clone()))).await;
    format!("http://{addr}")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn caller_guid_travels_to_the_second_service() {
    let first_log = CaptureLogger::default();
    let second_log = CaptureLogger::default();
    let remote = spawn_second(&second_log).await;

    let response = send(
        first(remote, &first_log),
        get_with_header("/first?data=hello", GUID_HEADER, "guid-123"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "second received hello");
    assert_eq!(
        first_log.lines(),
        vec![(Some("guid-123".to_string()), "starting Process with hello".to_string())]
    );
    assert_eq!(
        second_log.lines(),
        vec![(Some("guid-123".to_string()), "second received hello".to_string())]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn generated_guid_is_shared_by_both_services() {
    let first_log = CaptureLogger::default();
    let second_log = CaptureLogger::default();
    let remote = spawn_second(&second_log).await;

    let response = send(first(remote, &first_log), get("/first?data=a%20b")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "second received a b");

    let (first_guid, _) = first_log.lines().remove(0);
    let (second_guid, _) = second_log.lines().remove(0);
    let guid = first_guid.expect("first service assigned a guid");
    assert!(uuid::Uuid::parse_str(&guid).is_ok());
    assert_eq!(second_guid.as_deref(), Some(guid.as_str()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_remote_is_a_server_error() {
    let first_log = CaptureLogger::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let remote = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let response = send(
        first(remote, &first_log),
        get_with_header("/first?data=hello", GUID_HEADER, "guid-9"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("/second"));
    let lines = first_log.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1].0.as_deref(), Some("guid-9"));
    assert!(lines[1].1.starts_with("error calling remote service: "));
}
